/// The storyline pipeline: parser, bundle, storage and generation wired together.
///
/// Callers build one [`StorylinePipeline`] and pass it around; nothing here is
/// process-wide.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::catalog::Catalog;
use crate::core::extract::coerce_generated;
use crate::core::generator::{
    ContentSource, GenerateError, StorylineGenerator, DEFAULT_MAX_ATTEMPTS,
};
use crate::core::parser::{ParseError, StorylineParser};
use crate::core::repository::{RepositoryError, StorylineRepository};
use crate::schema::storyline::{ActionType, Storyline};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("generation error: {0}")]
    Generate(#[from] GenerateError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("no storage directory configured")]
    NoStorage,
}

/// Settings read from a RON file. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Read-only directory of shipped storylines.
    pub bundle_dir: Option<PathBuf>,
    /// Directory where validated generated storylines are written.
    pub storage_dir: Option<PathBuf>,
    pub max_attempts: u32,
    pub log_payloads: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bundle_dir: None,
            storage_dir: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            log_payloads: false,
        }
    }
}

impl PipelineConfig {
    pub fn load_from_ron(path: &Path) -> Result<PipelineConfig, PipelineError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse_ron(&contents)?)
    }

    pub fn parse_ron(input: &str) -> Result<PipelineConfig, ron::error::SpannedError> {
        ron::from_str(input)
    }
}

pub struct StorylinePipeline {
    parser: StorylineParser,
    bundle: Option<StorylineRepository>,
    storage: Option<StorylineRepository>,
    max_attempts: u32,
}

/// Builder for constructing a `StorylinePipeline`.
pub struct StorylinePipelineBuilder {
    config_file: Option<PathBuf>,
    bundle_dir: Option<PathBuf>,
    storage_dir: Option<PathBuf>,
    max_attempts: Option<u32>,
    log_payloads: Option<bool>,
}

impl StorylinePipeline {
    pub fn builder() -> StorylinePipelineBuilder {
        StorylinePipelineBuilder {
            config_file: None,
            bundle_dir: None,
            storage_dir: None,
            max_attempts: None,
            log_payloads: None,
        }
    }

    pub fn parser(&self) -> StorylineParser {
        self.parser
    }

    pub fn bundle(&self) -> Option<&StorylineRepository> {
        self.bundle.as_ref()
    }

    pub fn storage(&self) -> Option<&StorylineRepository> {
        self.storage.as_ref()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Storyline, ParseError> {
        self.parser.parse(bytes)
    }

    /// Everything playable: shipped storylines first, then saved ones.
    /// A saved storyline reusing a shipped id is dropped.
    pub fn catalog(&self) -> Catalog {
        let shipped = self.bundle.iter().flat_map(|repo| repo.list_available());
        let saved = self.storage.iter().flat_map(|repo| repo.list_available());
        let catalog = Catalog::from_storylines(shipped.chain(saved));
        tracing::info!(storylines = catalog.len(), "catalog loaded");
        catalog
    }

    /// Validate generated text and persist it to storage.
    pub fn import_generated(&self, text: &str) -> Result<(Storyline, PathBuf), PipelineError> {
        let storage = self.storage.as_ref().ok_or(PipelineError::NoStorage)?;
        let storyline = self.parser.parse(&coerce_generated(text))?;
        let path = storage.save(&storyline)?;
        Ok((storyline, path))
    }

    /// Generate a storyline for `action` from `source` and persist it.
    pub async fn generate_and_save<S: ContentSource>(
        &self,
        source: S,
        action: ActionType,
    ) -> Result<(Storyline, PathBuf), PipelineError> {
        let storage = self.storage.as_ref().ok_or(PipelineError::NoStorage)?;
        let generator = StorylineGenerator::new(source)
            .with_parser(self.parser)
            .max_attempts(self.max_attempts);
        let storyline = generator.generate(action).await?;
        let path = storage.save(&storyline)?;
        Ok((storyline, path))
    }
}

impl StorylinePipelineBuilder {
    /// Read defaults from a RON file; explicit builder values win.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn bundle_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.bundle_dir = Some(path.into());
        self
    }

    pub fn storage_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(path.into());
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn log_payloads(mut self, enabled: bool) -> Self {
        self.log_payloads = Some(enabled);
        self
    }

    pub fn build(self) -> Result<StorylinePipeline, PipelineError> {
        let config = match &self.config_file {
            Some(path) => PipelineConfig::load_from_ron(path)?,
            None => PipelineConfig::default(),
        };

        let parser = StorylineParser::new()
            .log_payloads(self.log_payloads.unwrap_or(config.log_payloads));
        let repository = |dir: PathBuf| StorylineRepository::new(dir).with_parser(parser);

        Ok(StorylinePipeline {
            parser,
            bundle: self.bundle_dir.or(config.bundle_dir).map(repository),
            storage: self.storage_dir.or(config.storage_dir).map(repository),
            max_attempts: self.max_attempts.unwrap_or(config.max_attempts).max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = PipelineConfig::parse_ron("()").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.max_attempts, 2);
        assert!(!config.log_payloads);
    }

    #[test]
    fn config_from_ron() {
        let config = PipelineConfig::parse_ron(
            r#"(
                bundle_dir: Some("content/storylines"),
                storage_dir: Some("saved"),
                max_attempts: 4,
                log_payloads: true,
            )"#,
        )
        .unwrap();
        assert_eq!(config.bundle_dir, Some(PathBuf::from("content/storylines")));
        assert_eq!(config.storage_dir, Some(PathBuf::from("saved")));
        assert_eq!(config.max_attempts, 4);
        assert!(config.log_payloads);
    }

    #[test]
    fn builder_defaults() {
        let pipeline = StorylinePipeline::builder().build().unwrap();
        assert!(pipeline.bundle().is_none());
        assert!(pipeline.storage().is_none());
        assert_eq!(pipeline.max_attempts(), 2);
        assert!(pipeline.catalog().is_empty());
    }

    #[test]
    fn builder_values() {
        let pipeline = StorylinePipeline::builder()
            .bundle_dir("bundle")
            .storage_dir("saved")
            .max_attempts(0)
            .build()
            .unwrap();
        assert_eq!(pipeline.bundle().unwrap().root(), Path::new("bundle"));
        assert_eq!(pipeline.storage().unwrap().root(), Path::new("saved"));
        assert_eq!(pipeline.max_attempts(), 1);
    }

    #[test]
    fn import_requires_storage() {
        let pipeline = StorylinePipeline::builder().build().unwrap();
        assert!(matches!(
            pipeline.import_generated("{}"),
            Err(PipelineError::NoStorage)
        ));
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let result = StorylinePipeline::builder()
            .config_file("does/not/exist.ron")
            .build();
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }
}
