//! Section content loading.
//!
//! Turns a section descriptor plus its folder into a parsed payload and the
//! media found next to it. Most sections are a single JSON file; two are
//! collections of sub-folders:
//!
//! - **projects**: `project-1` .. `project-20`, each with a `text.json`.
//!   Loading stops at the first project whose payload is missing or broken.
//! - **featured**: the sub-folders listed in `featured-items.json`
//!   (`{"folders": [...]}` or `{"items": [...]}`). Without a usable list the
//!   loader probes a fixed set of common names and numbered folders and keeps
//!   every one that resolves. There is no early stop here, unlike projects.
//!
//! Absence is quiet (`debug`). A payload that fails to parse is reported at
//! `warn` and the section is treated as empty; siblings keep loading.

use crate::manifest::{self, Layout, SectionDescriptor};
use crate::month::MonthToken;
use crate::probe::{self, MediaBundle, SectionKind};
use crate::source::{self, ContentSource};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Highest `project-N` folder probed.
pub const MAX_PROJECTS: usize = 20;
/// Highest N probed for numbered featured folders.
pub const MAX_FEATURED_NUMBERED: usize = 20;
pub const FEATURED_MANIFEST: &str = "featured-items.json";
/// Payload filename inside project and featured sub-folders.
pub const ITEM_PAYLOAD: &str = "text.json";

const FEATURED_COMMON_NAMES: [&str; 9] = [
    "launch",
    "announcement",
    "event",
    "special",
    "news",
    "update",
    "feature",
    "story",
    "spotlight",
];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One project or featured item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubItem {
    /// Folder name (`project-3`, `launch`).
    pub name: String,
    /// Source path of the folder.
    pub path: String,
    pub data: Value,
    pub media: MediaBundle,
}

/// Loaded content of one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionContent {
    Single { data: Value, media: MediaBundle },
    Projects { projects: Vec<SubItem> },
    Featured { items: Vec<SubItem> },
}

impl SectionContent {
    /// Every image referenced by this content, as source paths.
    pub fn image_paths(&self, folder: &str) -> Vec<String> {
        match self {
            SectionContent::Single { media, .. } => media
                .images
                .iter()
                .map(|name| source::join(folder, name))
                .collect(),
            SectionContent::Projects { projects: items } | SectionContent::Featured { items } => {
                items
                    .iter()
                    .flat_map(|item| {
                        item.media
                            .images
                            .iter()
                            .map(move |name| source::join(&item.path, name))
                    })
                    .collect()
            }
        }
    }
}

/// How a section's folder is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    Projects,
    Featured,
    Single(SectionKind),
}

impl LoadStrategy {
    /// Known ids decide first; unknown ids follow their layout.
    pub fn for_section(section: &SectionDescriptor) -> Self {
        match (SectionKind::from_id(&section.id), section.layout) {
            (SectionKind::Projects, _) => LoadStrategy::Projects,
            (SectionKind::Featured, _) => LoadStrategy::Featured,
            (SectionKind::Other, Layout::Dropdown) => LoadStrategy::Projects,
            (SectionKind::Other, Layout::Dynamic) => LoadStrategy::Featured,
            (kind, _) => LoadStrategy::Single(kind),
        }
    }
}

/// Load a section, distinguishing "nothing there" from "broken payload".
pub fn try_load_section_content<S: ContentSource + ?Sized>(
    source: &S,
    section: &SectionDescriptor,
    folder: &str,
) -> Result<Option<SectionContent>, LoadError> {
    match LoadStrategy::for_section(section) {
        LoadStrategy::Projects => {
            let projects = load_projects(source, folder);
            Ok((!projects.is_empty()).then_some(SectionContent::Projects { projects }))
        }
        LoadStrategy::Featured => {
            let items = load_featured(source, folder);
            Ok((!items.is_empty()).then_some(SectionContent::Featured { items }))
        }
        LoadStrategy::Single(kind) => load_single(source, folder, kind),
    }
}

/// Load a section, logging and discarding malformed payloads.
pub fn load_section_content<S: ContentSource + ?Sized>(
    source: &S,
    section: &SectionDescriptor,
    folder: &str,
) -> Option<SectionContent> {
    match try_load_section_content(source, section, folder) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("section '{}': {e}", section.id);
            None
        }
    }
}

fn load_single<S: ContentSource + ?Sized>(
    source: &S,
    folder: &str,
    kind: SectionKind,
) -> Result<Option<SectionContent>, LoadError> {
    let media = probe::detect_media(source, folder, kind);
    let Some(json) = media.primary_json() else {
        log::debug!("{folder}: no payload found");
        return Ok(None);
    };
    let path = source::join(folder, json);
    let Some(data) = fetch_json(source, &path)? else {
        return Ok(None);
    };
    Ok(Some(SectionContent::Single { data, media }))
}

/// Fetch and parse a JSON file. A failed fetch is `Ok(None)`.
fn fetch_json<S: ContentSource + ?Sized>(
    source: &S,
    path: &str,
) -> Result<Option<Value>, LoadError> {
    let bytes = match source.fetch(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("{path}: {e}");
            return Ok(None);
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| LoadError::Json {
            path: path.to_string(),
            source,
        })
}

/// Load one sub-folder's `text.json` and probe its media.
///
/// Missing payloads are `Ok(None)`; broken ones are errors.
fn load_item<S: ContentSource + ?Sized>(
    source: &S,
    folder: &str,
    name: &str,
    kind: SectionKind,
) -> Result<Option<SubItem>, LoadError> {
    let path = source::join(folder, name);
    let Some(data) = fetch_json(source, &source::join(&path, ITEM_PAYLOAD))? else {
        return Ok(None);
    };
    let media = probe::detect_media(source, &path, kind);
    Ok(Some(SubItem {
        name: name.to_string(),
        path,
        data,
        media,
    }))
}

/// Load `project-1..=20`, stopping at the first missing or broken one.
pub fn load_projects<S: ContentSource + ?Sized>(source: &S, folder: &str) -> Vec<SubItem> {
    let mut projects = Vec::new();
    for i in 1..=MAX_PROJECTS {
        match load_item(source, folder, &format!("project-{i}"), SectionKind::Projects) {
            Ok(Some(project)) => projects.push(project),
            Ok(None) => break,
            Err(e) => {
                log::warn!("{e}");
                break;
            }
        }
    }
    log::debug!("{folder}: {} project(s)", projects.len());
    projects
}

#[derive(Debug, Deserialize)]
struct FeaturedManifest {
    folders: Option<Vec<String>>,
    items: Option<Vec<String>>,
}

/// Folder names from `featured-items.json`, if it exists and parses.
fn featured_manifest<S: ContentSource + ?Sized>(source: &S, folder: &str) -> Option<Vec<String>> {
    let path = source::join(folder, FEATURED_MANIFEST);
    let bytes = match source.fetch(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("{path}: {e}");
            return None;
        }
    };
    match serde_json::from_slice::<FeaturedManifest>(&bytes) {
        Ok(manifest) => Some(manifest.folders.or(manifest.items).unwrap_or_default()),
        Err(e) => {
            log::warn!("malformed {path}, probing common folder names: {e}");
            None
        }
    }
}

/// Fallback names for featured items, in probe order.
///
/// The common names come first, then `featured-N`, `item-N` and `N`
/// interleaved for each N.
pub fn featured_candidates() -> Vec<String> {
    let mut names: Vec<String> = FEATURED_COMMON_NAMES.iter().map(|s| s.to_string()).collect();
    for i in 1..=MAX_FEATURED_NUMBERED {
        names.push(format!("featured-{i}"));
        names.push(format!("item-{i}"));
        names.push(i.to_string());
    }
    names
}

/// Load featured items from the manifest list, or by probing fallback names.
pub fn load_featured<S: ContentSource + ?Sized>(source: &S, folder: &str) -> Vec<SubItem> {
    let names = featured_manifest(source, folder).unwrap_or_else(featured_candidates);
    // Indexed parallel collect keeps name order
    let items: Vec<SubItem> = names
        .par_iter()
        .filter_map(
            |name| match load_item(source, folder, name, SectionKind::Featured) {
                Ok(item) => item,
                Err(e) => {
                    log::warn!("could not load featured item '{name}': {e}");
                    None
                }
            },
        )
        .collect();
    log::debug!("{folder}: {} featured item(s)", items.len());
    items
}

// ============================================================================
// Month loading
// ============================================================================

/// Result of loading one section of one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SectionState {
    Loaded { content: SectionContent },
    /// No payload was found. The live view still shows a generic card.
    Absent,
    /// The payload failed to parse. Excluded from both views.
    Malformed,
}

/// One cache row: a section of a month with whatever was loaded for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentEntry {
    pub month: MonthToken,
    pub section: SectionDescriptor,
    /// Source path of the section folder.
    pub path: String,
    pub state: SectionState,
}

impl ContentEntry {
    pub fn content(&self) -> Option<&SectionContent> {
        match &self.state {
            SectionState::Loaded { content } => Some(content),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.state == SectionState::Absent
    }
}

/// Load every section of a month in manifest order.
pub fn load_month<S: ContentSource + ?Sized>(
    source: &S,
    media_dir: &str,
    month: MonthToken,
    sections: &[SectionDescriptor],
) -> Vec<ContentEntry> {
    sections
        .iter()
        .map(|section| {
            let path = manifest::section_path(media_dir, month, section);
            let state = match try_load_section_content(source, section, &path) {
                Ok(Some(content)) => SectionState::Loaded { content },
                Ok(None) => SectionState::Absent,
                Err(e) => {
                    log::warn!("{month} section '{}': {e}", section.id);
                    SectionState::Malformed
                }
            };
            ContentEntry {
                month,
                section: section.clone(),
                path,
                state,
            }
        })
        .collect()
}
