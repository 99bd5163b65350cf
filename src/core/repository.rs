/// Storyline repository: loading from a content directory and atomic saves.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::core::parser::{ParseError, StorylineParser};
use crate::schema::storyline::Storyline;

/// Extension of storyline files, without the dot.
pub const STORYLINE_EXTENSION: &str = "json";

const SLUG_SEPARATOR: char = '-';
const FALLBACK_SLUG: &str = "storyline";
/// Longest slug in bytes; the id that follows already makes names unique.
pub const MAX_SLUG_LEN: usize = 100;
#[cfg(unix)]
const STORYLINE_FILE_MODE: u32 = 0o644;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid storyline name: {0:?}")]
    InvalidName(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Derive a filesystem-safe slug from a title.
///
/// Lower-cases, turns whitespace and every non-alphanumeric character into
/// `-`, collapses runs of `-` and trims them from both ends. Titles with no
/// alphanumeric character at all map to `"storyline"`. The result is cut to
/// [`MAX_SLUG_LEN`] bytes on a char boundary.
pub fn slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with(SLUG_SEPARATOR) {
            slug.push(SLUG_SEPARATOR);
        }
    }

    let mut trimmed = slug.trim_matches(SLUG_SEPARATOR);
    if trimmed.len() > MAX_SLUG_LEN {
        let mut end = MAX_SLUG_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        trimmed = trimmed[..end].trim_end_matches(SLUG_SEPARATOR);
    }
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name a storyline is saved under: `{slug}-{id}.json`.
pub fn storyline_filename(storyline: &Storyline) -> String {
    format!(
        "{}-{}.{}",
        slug(storyline.title()),
        storyline.id(),
        STORYLINE_EXTENSION
    )
}

/// Storylines stored as individual JSON files in one directory.
///
/// The repository owns the on-disk representation. Reads never fail as a
/// whole because of a single bad file; writes replace the target atomically.
#[derive(Debug, Clone)]
pub struct StorylineRepository {
    root: PathBuf,
    parser: StorylineParser,
}

impl StorylineRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            parser: StorylineParser::default(),
        }
    }

    pub fn with_parser(mut self, parser: StorylineParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse every `.json` file in the root directory.
    ///
    /// Files that cannot be read or do not validate are logged and skipped.
    /// A missing root yields an empty list. The order follows directory
    /// enumeration and is not stable.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub fn list_available(&self) -> Vec<Storyline> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read storyline directory");
                return Vec::new();
            }
        };

        let mut storylines = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot read directory entry");
                    continue;
                }
            };
            if !is_storyline_file(&path) {
                continue;
            }
            match self.load_path(&path) {
                Ok(storyline) => storylines.push(storyline),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping storyline file")
                }
            }
        }

        tracing::debug!(count = storylines.len(), "storylines loaded");
        storylines
    }

    /// Load one storyline by file name, with or without the `.json` suffix.
    pub fn load_one(&self, name: &str) -> Result<Storyline, RepositoryError> {
        if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name == ".." {
            return Err(RepositoryError::InvalidName(name.to_string()));
        }

        let suffix = format!(".{}", STORYLINE_EXTENSION);
        let file_name = if name.ends_with(&suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        };
        self.load_path(&self.root.join(file_name))
    }

    /// Write a storyline as pretty-printed JSON under its canonical file name
    /// and return the path written.
    ///
    /// The document goes to a temporary file in the same directory which is
    /// then renamed over the target, so readers see either the previous file
    /// or the complete new one. Two saves of the same id race; the last
    /// rename wins.
    #[tracing::instrument(skip(self, storyline), fields(id = %storyline.id()))]
    pub fn save(&self, storyline: &Storyline) -> Result<PathBuf, RepositoryError> {
        let mut document = serde_json::to_vec_pretty(storyline)?;
        document.push(b'\n');

        let path = self.root.join(storyline_filename(storyline));
        write_atomically(&self.root, &path, &document)?;

        tracing::info!(path = %path.display(), title = storyline.title(), "storyline saved");
        Ok(path)
    }

    fn load_path(&self, path: &Path) -> Result<Storyline, RepositoryError> {
        let bytes = fs::read(path).map_err(io_error(path))?;
        Ok(self.parser.parse(&bytes)?)
    }
}

fn is_storyline_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(STORYLINE_EXTENSION) && path.is_file()
}

fn write_atomically(dir: &Path, path: &Path, contents: &[u8]) -> Result<(), RepositoryError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(io_error(dir))?;
    temp.write_all(contents).map_err(io_error(temp.path()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Temp files start owner-only; saved storylines read like any other file.
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(STORYLINE_FILE_MODE))
            .map_err(io_error(temp.path()))?;
    }
    temp.as_file().sync_all().map_err(io_error(temp.path()))?;
    temp.persist(path).map_err(|e| RepositoryError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

fn io_error(path: &Path) -> impl Fn(io::Error) -> RepositoryError + '_ {
    move |source| RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    }
}
