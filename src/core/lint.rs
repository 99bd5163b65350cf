/// Content checks over a directory of storyline files.
use rustc_hash::FxHashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::core::parser::StorylineParser;
use crate::core::repository::{storyline_filename, STORYLINE_EXTENSION};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    /// Number of `.json` files examined.
    pub checked: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Lint every `.json` file in `dir`, in file name order.
///
/// Errors: files that fail validation, ids used by more than one file.
/// Warnings: steps offering fewer than two choices, file names that differ
/// from the name the repository would save the storyline under.
pub fn lint_directory(dir: &Path) -> io::Result<LintReport> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|s| s.to_str()) == Some(STORYLINE_EXTENSION)
        })
        .collect();
    paths.sort();

    let parser = StorylineParser::new();
    let mut report = LintReport::default();
    let mut seen: FxHashMap<Uuid, String> = FxHashMap::default();

    for path in &paths {
        report.checked += 1;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                report.errors.push(format!("{}: {}", file_name, e));
                continue;
            }
        };
        let storyline = match parser.parse(&bytes) {
            Ok(storyline) => storyline,
            Err(e) => {
                report.errors.push(format!("{}: {}", file_name, e));
                continue;
            }
        };

        if let Some(first) = seen.get(&storyline.id()) {
            report.errors.push(format!(
                "{}: id {} already used by {}",
                file_name,
                storyline.id(),
                first
            ));
        } else {
            seen.insert(storyline.id(), file_name.clone());
        }

        for (i, step) in storyline.steps().iter().enumerate() {
            if step.choices.len() < 2 {
                report.warnings.push(format!(
                    "{}: step[{}] offers {} choice(s), the watch expects two",
                    file_name,
                    i,
                    step.choices.len()
                ));
            }
        }

        let expected = storyline_filename(&storyline);
        if file_name != expected {
            report
                .warnings
                .push(format!("{}: canonical file name is {}", file_name, expected));
        }
    }

    tracing::debug!(
        checked = report.checked,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "lint finished"
    );
    Ok(report)
}
