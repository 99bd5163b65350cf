/// Storyline validation: decodes raw bytes and enforces the content invariants.
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::schema::choice::Gauge;
use crate::schema::storyline::{ActionType, StoryStep, Storyline};

/// Where in a document a field was found missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldContext {
    Storyline,
    Step(usize),
    Choice { step: usize, choice: usize },
}

impl fmt::Display for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storyline => f.write_str("storyline"),
            Self::Step(step) => write!(f, "step[{}]", step),
            Self::Choice { step, choice } => write!(f, "step[{}].choice[{}]", step, choice),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid storyline document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
    #[error("missing or empty field `{field}` at {context}")]
    MissingField {
        field: &'static str,
        context: FieldContext,
    },
    #[error("invalid value {value:?} for `{field}`")]
    InvalidValue { field: &'static str, value: String },
    #[error("storyline has no steps")]
    EmptySteps,
    #[error("step[{0}] has no choices")]
    EmptyChoices(usize),
    #[error("`{field}.{gauge}` is {value} at step[{step}].choice[{choice}], expected -10..=10")]
    OutOfRange {
        field: &'static str,
        step: usize,
        choice: usize,
        gauge: Gauge,
        value: i64,
    },
}

// The wire shape keeps `action_type` as free text so that an unknown action
// is reported as an invalid value rather than an undecodable document.
#[derive(Debug, Deserialize)]
struct RawStoryline {
    id: Uuid,
    title: String,
    action_type: String,
    steps: Vec<StoryStep>,
}

/// Converts raw bytes into a validated [`Storyline`].
///
/// Validation is all-or-nothing and stops at the first violation. The parser
/// holds no state besides its logging preference, so one value can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorylineParser {
    log_payloads: bool,
}

impl StorylineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the raw payload as a `trace` event before decoding.
    pub fn log_payloads(mut self, enabled: bool) -> Self {
        self.log_payloads = enabled;
        self
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Storyline, ParseError> {
        if self.log_payloads {
            tracing::trace!(payload = %String::from_utf8_lossy(bytes), "decoding storyline");
        }

        let result = serde_json::from_slice::<RawStoryline>(bytes)
            .map_err(ParseError::from)
            .and_then(validate);

        match &result {
            Ok(storyline) => tracing::debug!(
                id = %storyline.id(),
                title = storyline.title(),
                steps = storyline.steps().len(),
                "storyline validated"
            ),
            Err(e) => tracing::debug!(error = %e, "storyline rejected"),
        }
        result
    }
}

/// Parse with the default parser.
pub fn parse_storyline(bytes: &[u8]) -> Result<Storyline, ParseError> {
    StorylineParser::default().parse(bytes)
}

fn validate(raw: RawStoryline) -> Result<Storyline, ParseError> {
    check_title(&raw.title)?;
    let action_type =
        ActionType::from_wire_name(&raw.action_type).ok_or_else(|| ParseError::InvalidValue {
            field: "actionType",
            value: raw.action_type.clone(),
        })?;
    check_steps(&raw.steps)?;
    Ok(Storyline::assemble(raw.id, raw.title, action_type, raw.steps))
}

/// Title and step checks shared with [`Storyline::new`].
pub(crate) fn validate_content(title: &str, steps: &[StoryStep]) -> Result<(), ParseError> {
    check_title(title)?;
    check_steps(steps)
}

fn check_title(title: &str) -> Result<(), ParseError> {
    if title.is_empty() {
        return Err(ParseError::MissingField {
            field: "title",
            context: FieldContext::Storyline,
        });
    }
    Ok(())
}

fn check_steps(steps: &[StoryStep]) -> Result<(), ParseError> {
    if steps.is_empty() {
        return Err(ParseError::EmptySteps);
    }

    for (step_index, step) in steps.iter().enumerate() {
        if step.prompt.is_empty() {
            return Err(ParseError::MissingField {
                field: "prompt",
                context: FieldContext::Step(step_index),
            });
        }
        if step.choices.is_empty() {
            return Err(ParseError::EmptyChoices(step_index));
        }

        for (choice_index, choice) in step.choices.iter().enumerate() {
            let context = FieldContext::Choice {
                step: step_index,
                choice: choice_index,
            };
            if choice.text.is_empty() {
                return Err(ParseError::MissingField {
                    field: "text",
                    context,
                });
            }
            if choice.consequence.is_empty() {
                return Err(ParseError::MissingField {
                    field: "consequence",
                    context,
                });
            }
            if let Some((gauge, value)) = choice.gauge_impact.first_out_of_range() {
                return Err(ParseError::OutOfRange {
                    field: "gaugeImpact",
                    step: step_index,
                    choice: choice_index,
                    gauge,
                    value,
                });
            }
        }
    }
    Ok(())
}
