//! JSON validation for `almanac validate`.
//!
//! Parses every `*.json` file under one month folder and reports each result.
//! Failures are collected, not fatal: the whole tree is always checked.

use crate::month::{MonthError, MonthToken};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error(transparent)]
    Month(#[from] MonthError),
    #[error("folder not found: {0}")]
    MissingFolder(PathBuf),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Outcome for one file. `error` is `None` when it parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    /// Relative to the month folder.
    pub path: String,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ValidationReport {
    pub month: MonthToken,
    pub files: Vec<FileResult>,
}

impl ValidationReport {
    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn valid(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_none()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
        self.files.iter().filter(|f| f.error.is_some())
    }

    pub fn is_ok(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Validate `<root>/<media_dir>/<month>/`. `month` is the raw CLI argument.
pub fn validate_month(
    root: &Path,
    media_dir: &str,
    month: &str,
) -> Result<ValidationReport, ValidateError> {
    let month: MonthToken = month.parse()?;
    let base = root.join(media_dir).join(month.to_string());
    if !base.is_dir() {
        return Err(ValidateError::MissingFolder(base));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&base).sort_by_file_name() {
        let entry = entry?;
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if !entry.file_type().is_file() || !is_json {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(&base)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let error = check_file(entry.path()).err();
        match &error {
            Some(e) => log::debug!("{rel}: {e}"),
            None => log::debug!("{rel}: ok"),
        }
        files.push(FileResult { path: rel, error });
    }

    Ok(ValidationReport { month, files })
}

fn check_file(path: &Path) -> Result<(), String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str::<serde_json::Value>(&text)
        .map(|_| ())
        .map_err(|e| e.to_string())
}
