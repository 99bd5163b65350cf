use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::choice::Choice;
use crate::core::parser::{self, ParseError};

/// Gameplay action that triggers a storyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    #[serde(rename = "nourrir")]
    Feed,
    #[serde(rename = "abreuver")]
    Hydrate,
    #[serde(rename = "aventure")]
    Adventure,
    #[serde(rename = "amour")]
    Affection,
}

impl ActionType {
    pub const ALL: [ActionType; 4] = [
        ActionType::Feed,
        ActionType::Hydrate,
        ActionType::Adventure,
        ActionType::Affection,
    ];

    /// The literal used for `action_type` in storyline files.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Feed => "nourrir",
            Self::Hydrate => "abreuver",
            Self::Adventure => "aventure",
            Self::Affection => "amour",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.wire_name() == name)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Swipe direction on the choice card. Left selects choice 0, right choice 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Swipe {
    Left,
    Right,
}

impl Swipe {
    pub fn index(&self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

impl fmt::Display for Swipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// One narrative beat: a prompt and the choices offered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryStep {
    #[serde(alias = "description")]
    pub prompt: String,
    pub choices: Vec<Choice>,
}

impl StoryStep {
    pub fn choice(&self, swipe: Swipe) -> Option<&Choice> {
        self.choices.get(swipe.index())
    }
}

/// A complete branching narrative tied to one gameplay action.
///
/// Values only exist in validated form: they come out of
/// [`parser::StorylineParser::parse`] or [`Storyline::new`], and expose
/// read-only accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Storyline {
    id: Uuid,
    title: String,
    action_type: ActionType,
    steps: Vec<StoryStep>,
}

impl Storyline {
    /// Build a storyline in-process, running the same checks as the parser.
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        action_type: ActionType,
        steps: Vec<StoryStep>,
    ) -> Result<Self, ParseError> {
        let title = title.into();
        parser::validate_content(&title, &steps)?;
        Ok(Self::assemble(id, title, action_type, steps))
    }

    /// Caller guarantees the content has been validated.
    pub(crate) fn assemble(
        id: Uuid,
        title: String,
        action_type: ActionType,
        steps: Vec<StoryStep>,
    ) -> Self {
        Self {
            id,
            title,
            action_type,
            steps,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn steps(&self) -> &[StoryStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&StoryStep> {
        self.steps.get(index)
    }
}
