/// Storyline generation through an external text source, with retries.
use async_trait::async_trait;
use thiserror::Error;

use crate::core::extract::coerce_generated;
use crate::core::parser::{ParseError, StorylineParser};
use crate::schema::storyline::{ActionType, Storyline};

pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Produces free text from a prompt, typically a language-model API.
///
/// The text is untrusted; it is coerced and validated before use.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, SourceError>;
}

#[async_trait]
impl<'a, T: ContentSource + ?Sized> ContentSource for &'a T {
    async fn generate(&self, prompt: &str) -> Result<String, SourceError> {
        (**self).generate(prompt).await
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("content source failed: {0}")]
    Source(SourceError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("expected a `{expected}` storyline, got `{found}`")]
    WrongAction {
        expected: ActionType,
        found: ActionType,
    },
    #[error("generation failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<GenerateError>,
    },
}

/// Prompt asking for one storyline for `action`.
pub fn storyline_prompt(action: ActionType) -> String {
    format!(
        r#"Tu es un créateur d'histoires pour le jeu Tibouchi. Tu dois créer une storyline interactive qui suit le format JSON suivant :

{{
    "id": "uuid-généré",
    "title": "Titre de l'histoire",
    "action_type": "type d'action (nourrir, abreuver, aventure, amour)",
    "steps": [
        {{
            "prompt": "Description de la situation",
            "choices": [
                {{
                    "text": "Option 1",
                    "consequence": "Conséquence de l'option 1",
                    "gaugeImpact": {{ "faim": 0, "soif": 0, "mental": 0 }},
                    "outcome": "survive",
                    "gainTrait": null,
                    "requiredItem": null
                }}
            ]
        }}
    ]
}}

Règles importantes :
1. Les valeurs de gaugeImpact doivent être entre -10 et 10
2. Chaque étape doit avoir au moins 2 choix
3. outcome vaut "survive", "die", "returnHome" ou "nextStep"
4. Les conséquences doivent être cohérentes avec les choix
5. L'histoire doit être adaptée au type d'action demandé
6. Utilise "action_type" et non "actionType"
7. Réponds UNIQUEMENT avec le JSON, sans balises markdown ni commentaires

Génère une storyline pour l'action suivante : {action}"#
    )
}

/// Prompt for a retry, carrying the previous rejection back to the source.
pub fn feedback_prompt(base: &str, error: &GenerateError) -> String {
    format!(
        "{base}\n\nErreur précédente : {error}\n\n\
         IMPORTANT :\n\
         - Réponds UNIQUEMENT avec le JSON de la storyline\n\
         - Assure-toi que le JSON est valide et suit exactement le format demandé\n\
         - Corrige l'erreur mentionnée ci-dessus"
    )
}

/// Asks a [`ContentSource`] for storylines until one validates.
pub struct StorylineGenerator<S> {
    source: S,
    parser: StorylineParser,
    max_attempts: u32,
}

impl<S: ContentSource> StorylineGenerator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            parser: StorylineParser::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// At least one attempt is always made.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_parser(mut self, parser: StorylineParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Generate a validated storyline for `action`.
    ///
    /// Every failed attempt is fed back into the next prompt. After
    /// `max_attempts` failures the last error is returned inside
    /// [`GenerateError::Exhausted`].
    pub async fn generate(&self, action: ActionType) -> Result<Storyline, GenerateError> {
        let base = storyline_prompt(action);
        let mut prompt = base.clone();
        let mut attempt = 1;

        loop {
            tracing::info!(attempt, max_attempts = self.max_attempts, %action, "requesting storyline");
            match self.attempt(&prompt, action).await {
                Ok(storyline) => {
                    tracing::info!(
                        attempt,
                        id = %storyline.id(),
                        title = storyline.title(),
                        "storyline generated"
                    );
                    return Ok(storyline);
                }
                Err(err) if attempt >= self.max_attempts => {
                    tracing::warn!(attempt, error = %err, "storyline generation exhausted");
                    return Err(GenerateError::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "generated storyline rejected, retrying");
                    prompt = feedback_prompt(&base, &err);
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, prompt: &str, action: ActionType) -> Result<Storyline, GenerateError> {
        let text = self
            .source
            .generate(prompt)
            .await
            .map_err(GenerateError::Source)?;
        let storyline = self.parser.parse(&coerce_generated(&text))?;
        if storyline.action_type() != action {
            return Err(GenerateError::WrongAction {
                expected: action,
                found: storyline.action_type(),
            });
        }
        Ok(storyline)
    }
}
