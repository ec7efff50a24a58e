//! Month discovery and per-month manifests.
//!
//! A month exists when `<media_dir>/<MM.YYYY>/sections.json` exists. Discovery
//! probes a trailing window ending at "today" and returns the hits most recent
//! first. The manifest lists the month's sections; its order is the order the
//! archive groups them in, and `row` drives the live layout.
//!
//! Failures here are soft: a broken manifest or links file is logged and
//! treated as empty so one bad month never takes the site down.

use crate::month::{self, MonthToken};
use crate::source::{self, ContentSource, SourceError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

pub const MANIFEST_FILENAME: &str = "sections.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// How the live view lays a section out.
///
/// Unknown values fall back to [`Layout::Column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Column,
    Row,
    Dropdown,
    Dynamic,
}

impl From<String> for Layout {
    fn from(value: String) -> Self {
        match value.as_str() {
            "row" => Layout::Row,
            "dropdown" => Layout::Dropdown,
            "dynamic" => Layout::Dynamic,
            "column" => Layout::Column,
            other => {
                log::debug!("unknown layout '{other}', using column");
                Layout::Column
            }
        }
    }
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Column => "column",
            Layout::Row => "row",
            Layout::Dropdown => "dropdown",
            Layout::Dynamic => "dynamic",
        }
    }
}

fn default_row() -> u32 {
    1
}

/// `row` as a number or a numeric string; anything else is row 1.
fn lenient_row<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let row = match &value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(row.unwrap_or_else(|| {
        log::debug!("unusable row {value}, using 1");
        default_row()
    }))
}

/// One entry of `sections.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_row", deserialize_with = "lenient_row")]
    pub row: u32,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub description: String,
}

impl SectionDescriptor {
    /// Folder name relative to the month folder; falls back to the id.
    pub fn folder_name(&self) -> &str {
        if self.folder.is_empty() {
            &self.id
        } else {
            &self.folder
        }
    }

    /// Title for headings; falls back to the id.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    sections: Vec<serde_json::Value>,
}

/// Source path of a month folder.
pub fn month_path(media_dir: &str, month: MonthToken) -> String {
    source::join(media_dir, &month.to_string())
}

/// Source path of a month's manifest.
pub fn manifest_path(media_dir: &str, month: MonthToken) -> String {
    source::join(&month_path(media_dir, month), MANIFEST_FILENAME)
}

/// Source path of a section folder.
pub fn section_path(media_dir: &str, month: MonthToken, section: &SectionDescriptor) -> String {
    source::join(&month_path(media_dir, month), section.folder_name())
}

/// Months within the trailing window that have a manifest, most recent first.
pub fn discover_months<S: ContentSource + ?Sized>(
    source: &S,
    media_dir: &str,
    today: MonthToken,
    window: u32,
) -> Vec<MonthToken> {
    let candidates = today.trailing_window(window);
    let mut found: Vec<MonthToken> = candidates
        .par_iter()
        .copied()
        .filter(|m| source.exists(&manifest_path(media_dir, *m)))
        .collect();
    month::sort_descending(&mut found);
    log::info!(
        "discovered {} month(s) in {} candidates under {media_dir}",
        found.len(),
        window
    );
    found
}

/// Parse manifest JSON.
///
/// Only a file that is not a manifest at all is an error. A descriptor that
/// does not deserialize is dropped on its own; duplicate ids keep the first.
pub fn parse_manifest(path: &str, text: &str) -> Result<Vec<SectionDescriptor>, ManifestError> {
    let file: ManifestFile = serde_json::from_str(text).map_err(|source| ManifestError::Json {
        path: path.to_string(),
        source,
    })?;
    let mut seen = HashSet::new();
    let sections = file
        .sections
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| match SectionDescriptor::deserialize(raw) {
            Ok(section) => Some(section),
            Err(e) => {
                log::warn!("{path}: section {} skipped: {e}", i + 1);
                None
            }
        })
        .filter(|s| {
            let fresh = seen.insert(s.id.clone());
            if !fresh {
                log::warn!("{path}: duplicate section id '{}' dropped", s.id);
            }
            fresh
        })
        .collect();
    Ok(sections)
}

pub fn try_load_manifest<S: ContentSource + ?Sized>(
    source: &S,
    media_dir: &str,
    month: MonthToken,
) -> Result<Vec<SectionDescriptor>, ManifestError> {
    let path = manifest_path(media_dir, month);
    let text = source.fetch_text(&path)?;
    parse_manifest(&path, &text)
}

/// Load a month's sections. Failures are logged and yield no sections.
pub fn load_manifest<S: ContentSource + ?Sized>(
    source: &S,
    media_dir: &str,
    month: MonthToken,
) -> Vec<SectionDescriptor> {
    match try_load_manifest(source, media_dir, month) {
        Ok(sections) => sections,
        Err(e) => {
            log::warn!("error loading sections for {month}: {e}");
            Vec::new()
        }
    }
}

/// Call-to-action link targets keyed by name.
pub type LinksMap = BTreeMap<String, String>;

/// Load the links file. Non-string values are ignored; failures yield an
/// empty map.
pub fn load_links<S: ContentSource + ?Sized>(source: &S, path: &str) -> LinksMap {
    let parsed = source
        .fetch_text(path)
        .map_err(|e| e.to_string())
        .and_then(|text| {
            serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&text)
                .map_err(|e| e.to_string())
        });
    match parsed {
        Ok(map) => map
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|url| (k, url.to_string())))
            .collect(),
        Err(e) => {
            log::warn!("error loading links from {path}: {e}");
            LinksMap::new()
        }
    }
}
