//! Media probing.
//!
//! Section folders carry no index of their own, so the files in them are
//! discovered by trying a fixed list of candidate names per section kind.
//! Every candidate costs one existence probe; hits keep candidate order, which
//! makes "first JSON wins" and "first image is the primary image" stable.
//!
//! ## Expected files
//!
//! | Kind                 | JSON                   | Images                                 | PDFs          |
//! |----------------------|------------------------|----------------------------------------|---------------|
//! | `champion`           | `champion.json`        | `champion.png`                         |               |
//! | `editor`             | `editor.json`          | `editor.png`                           |               |
//! | `matcha-zone`        | `text.json`            | `picture.png`                          | `project.pdf` |
//! | `knowledge-bites`    | `knowledge-bites.json` |                                        |               |
//! | `spread-kindness`    | `spread-kindness.json` |                                        |               |
//! | `master-speaks`      | `text.json`            | `master.png`                           |               |
//! | `changing-timezones` | `text.json`            | `master-{1,2}-{then,now}.png`          |               |
//! | `projects`           | `text.json`            | `picture.png`                          | `project.pdf` |
//! | `featured`           | `text.json`            | `picture.png`                          | `project.pdf` |
//! | `certifications`     | `text.json`            | `picture.png`                          |               |
//! | anything else        | `text.json`, `content.json`, `data.json` | `picture.png`, `image.png` | `project.pdf`, `document.pdf` |

use crate::source::{self, ContentSource};
use rayon::prelude::*;
use serde::Serialize;

/// Closed set of section ids with dedicated handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Champion,
    Editor,
    MatchaZone,
    KnowledgeBites,
    SpreadKindness,
    MasterSpeaks,
    ChangingTimezones,
    Projects,
    Featured,
    Certifications,
    /// Any other id. Probed with the generic candidate lists.
    Other,
}

impl SectionKind {
    pub fn from_id(id: &str) -> Self {
        match id {
            "champion" => Self::Champion,
            "editor" => Self::Editor,
            "matcha-zone" => Self::MatchaZone,
            "knowledge-bites" => Self::KnowledgeBites,
            "spread-kindness" => Self::SpreadKindness,
            "master-speaks" => Self::MasterSpeaks,
            "changing-timezones" => Self::ChangingTimezones,
            "projects" => Self::Projects,
            "featured" => Self::Featured,
            "certifications" => Self::Certifications,
            _ => Self::Other,
        }
    }

    pub fn expected_files(self) -> ExpectedFiles {
        match self {
            Self::Champion => ExpectedFiles::new(&["champion.json"], &["champion.png"], &[]),
            Self::Editor => ExpectedFiles::new(&["editor.json"], &["editor.png"], &[]),
            Self::MatchaZone => {
                ExpectedFiles::new(&["text.json"], &["picture.png"], &["project.pdf"])
            }
            Self::KnowledgeBites => ExpectedFiles::new(&["knowledge-bites.json"], &[], &[]),
            Self::SpreadKindness => ExpectedFiles::new(&["spread-kindness.json"], &[], &[]),
            Self::MasterSpeaks => ExpectedFiles::new(&["text.json"], &["master.png"], &[]),
            Self::ChangingTimezones => ExpectedFiles::new(
                &["text.json"],
                &[
                    "master-1-then.png",
                    "master-1-now.png",
                    "master-2-then.png",
                    "master-2-now.png",
                ],
                &[],
            ),
            Self::Projects | Self::Featured => {
                ExpectedFiles::new(&["text.json"], &["picture.png"], &["project.pdf"])
            }
            Self::Certifications => ExpectedFiles::new(&["text.json"], &["picture.png"], &[]),
            Self::Other => ExpectedFiles::GENERIC,
        }
    }
}

/// Candidate filenames for one section kind, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedFiles {
    pub json: &'static [&'static str],
    pub images: &'static [&'static str],
    pub pdfs: &'static [&'static str],
}

impl ExpectedFiles {
    /// Fallback for ids without a table entry.
    pub const GENERIC: ExpectedFiles = ExpectedFiles {
        json: &["text.json", "content.json", "data.json"],
        images: &["picture.png", "image.png"],
        pdfs: &["project.pdf", "document.pdf"],
    };

    const fn new(
        json: &'static [&'static str],
        images: &'static [&'static str],
        pdfs: &'static [&'static str],
    ) -> Self {
        Self { json, images, pdfs }
    }
}

/// Files found in one folder. Each list keeps candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaBundle {
    pub json: Vec<String>,
    pub images: Vec<String>,
    pub pdfs: Vec<String>,
}

impl MediaBundle {
    pub fn primary_json(&self) -> Option<&str> {
        self.json.first().map(String::as_str)
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn primary_pdf(&self) -> Option<&str> {
        self.pdfs.first().map(String::as_str)
    }

    pub fn has_image(&self, name: &str) -> bool {
        self.images.iter().any(|i| i == name)
    }

    pub fn is_empty(&self) -> bool {
        self.json.is_empty() && self.images.is_empty() && self.pdfs.is_empty()
    }
}

/// Probe `candidates` under `folder`, keeping only the ones that exist.
///
/// Probes run on the rayon pool; `collect` on an indexed parallel iterator
/// preserves input order.
pub fn probe_candidates<S: ContentSource + ?Sized>(
    source: &S,
    folder: &str,
    candidates: &[&str],
) -> Vec<String> {
    candidates
        .par_iter()
        .filter(|name| source.exists(&source::join(folder, name)))
        .map(|name| name.to_string())
        .collect()
}

/// Determine which expected files of `kind` are present in `folder`.
pub fn detect_media<S: ContentSource + ?Sized>(
    source: &S,
    folder: &str,
    kind: SectionKind,
) -> MediaBundle {
    let expected = kind.expected_files();
    let bundle = MediaBundle {
        json: probe_candidates(source, folder, expected.json),
        images: probe_candidates(source, folder, expected.images),
        pdfs: probe_candidates(source, folder, expected.pdfs),
    };
    log::debug!(
        "{folder}: {} json, {} images, {} pdfs",
        bundle.json.len(),
        bundle.images.len(),
        bundle.pdfs.len()
    );
    bundle
}
