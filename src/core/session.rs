/// Playthrough of a single storyline, one swipe at a time.
use thiserror::Error;

use crate::schema::character::CharacterState;
use crate::schema::choice::Choice;
use crate::schema::storyline::{StoryStep, Storyline, Swipe};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("storyline session already finished")]
    Finished,
    #[error("step[{step}] has no {swipe} choice")]
    NoSuchChoice { step: usize, swipe: Swipe },
}

/// Cursor over a storyline's steps.
///
/// A session ends after the last step, when a choice sends the character
/// home, or when the character dies.
#[derive(Debug, Clone)]
pub struct StorylineSession<'a> {
    storyline: &'a Storyline,
    step: usize,
    finished: bool,
}

impl<'a> StorylineSession<'a> {
    pub fn new(storyline: &'a Storyline) -> Self {
        Self {
            storyline,
            step: 0,
            finished: false,
        }
    }

    pub fn storyline(&self) -> &'a Storyline {
        self.storyline
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    /// `None` once the session has finished.
    pub fn current_step(&self) -> Option<&'a StoryStep> {
        if self.finished {
            return None;
        }
        self.storyline.step(self.step)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Select the choice for `swipe` on the current step and apply it.
    pub fn choose(
        &mut self,
        swipe: Swipe,
        character: &mut CharacterState,
    ) -> Result<&'a Choice, SessionError> {
        let step = self.current_step().ok_or(SessionError::Finished)?;
        let choice = step.choice(swipe).ok_or(SessionError::NoSuchChoice {
            step: self.step,
            swipe,
        })?;

        character.apply_choice(choice);
        tracing::debug!(
            step = self.step,
            choice = %swipe,
            outcome = choice.outcome.label(),
            "choice applied"
        );

        self.step += 1;
        self.finished = self.step >= self.storyline.steps().len()
            || choice.outcome.is_terminal()
            || !character.is_alive;
        Ok(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_storyline;
    use crate::schema::character::CharacterType;
    use crate::schema::choice::Outcome;

    const STORYLINE: &str = r#"{
        "id": "0b7f4a52-6c1e-4f0e-9d3a-5e8b2c1d4f60",
        "title": "Le Verger",
        "action_type": "nourrir",
        "steps": [
            {
                "prompt": "Des pommes pendent aux branches.",
                "choices": [
                    {"text": "Grimper", "consequence": "Une branche craque.",
                     "gaugeImpact": {"faim": 4, "soif": -1, "mental": -2}, "outcome": "nextStep"},
                    {"text": "Secouer l'arbre", "consequence": "Une pomme tombe.",
                     "gaugeImpact": {"faim": 2, "soif": 0, "mental": 1}, "outcome": "nextStep",
                     "gainTrait": "malin"}
                ]
            },
            {
                "prompt": "Un frelon approche.",
                "choices": [
                    {"text": "Fuir", "consequence": "Tibouchi rentre en courant.",
                     "gaugeImpact": {"faim": 0, "soif": -3, "mental": -1}, "outcome": "returnHome"},
                    {"text": "L'ignorer", "consequence": "Le frelon pique.",
                     "gaugeImpact": {"faim": 0, "soif": 0, "mental": -10},
                     "outcome": {"die": {"reason": "piqûre"}}}
                ]
            },
            {
                "prompt": "Le panier est plein.",
                "choices": [
                    {"text": "Rentrer", "consequence": "Quel festin !",
                     "gaugeImpact": {"faim": 10, "soif": 0, "mental": 5}, "outcome": "survive"}
                ]
            }
        ]
    }"#;

    #[test]
    fn walks_steps_and_applies_choices() {
        let storyline = parse_storyline(STORYLINE.as_bytes()).unwrap();
        let mut character = CharacterState::new(CharacterType::Tibouchi);
        character.gauges.faim = 50;
        let mut session = StorylineSession::new(&storyline);

        assert_eq!(session.current_step().unwrap().prompt, "Des pommes pendent aux branches.");
        let choice = session.choose(Swipe::Right, &mut character).unwrap();
        assert_eq!(choice.text, "Secouer l'arbre");
        assert_eq!(character.gauges.faim, 52);
        assert!(character.has_trait("malin"));
        assert_eq!(session.step_index(), 1);
        assert!(!session.is_finished());
    }

    #[test]
    fn return_home_ends_session() {
        let storyline = parse_storyline(STORYLINE.as_bytes()).unwrap();
        let mut character = CharacterState::new(CharacterType::Tibizou);
        let mut session = StorylineSession::new(&storyline);

        session.choose(Swipe::Left, &mut character).unwrap();
        let choice = session.choose(Swipe::Left, &mut character).unwrap();
        assert_eq!(choice.outcome, Outcome::ReturnHome);
        assert!(session.is_finished());
        assert!(session.current_step().is_none());
        assert_eq!(
            session.choose(Swipe::Left, &mut character),
            Err(SessionError::Finished)
        );
        assert!(character.is_alive);
    }

    #[test]
    fn death_ends_session() {
        let storyline = parse_storyline(STORYLINE.as_bytes()).unwrap();
        let mut character = CharacterState::new(CharacterType::Ptibou);
        let mut session = StorylineSession::new(&storyline);

        session.choose(Swipe::Left, &mut character).unwrap();
        session.choose(Swipe::Right, &mut character).unwrap();
        assert!(!character.is_alive);
        assert!(session.is_finished());
    }

    #[test]
    fn missing_choice_does_not_advance() {
        let storyline = parse_storyline(STORYLINE.as_bytes()).unwrap();
        let mut character = CharacterState::new(CharacterType::Tibouchi);

        // Both choices of step 1 end the session, so jump to the last step.
        let mut last = StorylineSession::new(&storyline);
        last.step = 2;
        assert_eq!(
            last.choose(Swipe::Right, &mut character),
            Err(SessionError::NoSuchChoice {
                step: 2,
                swipe: Swipe::Right
            })
        );
        assert_eq!(last.step_index(), 2);

        let choice = last.choose(Swipe::Left, &mut character).unwrap();
        assert_eq!(choice.outcome, Outcome::Survive);
        assert!(last.is_finished());
    }
}
