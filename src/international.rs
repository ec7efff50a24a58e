//! International items.
//!
//! Undated content kept beside the month folders, under
//! `<media_dir>/<international_dir>/`. Each item is a sub-folder with a
//! `text.json` (`title`, `description`), an optional cover image and any
//! number of downloadable resources.
//!
//! The item list comes from `international-items.json` (`{"folders": [...]}`).
//! Without that file only the `project` folder is tried. A list file that
//! exists but does not parse is an error: the page shows an error panel
//! rather than silently guessing.
//!
//! ## Probed files
//!
//! | What      | Names                                          | Extensions                   |
//! |-----------|------------------------------------------------|------------------------------|
//! | Image     | `picture`, `image`, `cover`, `thumbnail`       | png, jpg, jpeg, gif, webp    |
//! | Resources | `project`, `document`, `presentation`, folder  | pdf, docx, pptx, xlsx        |
//!
//! The first image hit wins. Every resource hit is kept, extension first, then
//! name.

use crate::loader::ITEM_PAYLOAD;
use crate::probe;
use crate::source::{self, ContentSource};
use crate::text;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const INTERNATIONAL_MANIFEST: &str = "international-items.json";

/// Folders tried when there is no list file.
pub const DEFAULT_FOLDERS: [&str; 1] = ["project"];

const IMAGE_NAMES: [&str; 4] = ["picture", "image", "cover", "thumbnail"];
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];
const RESOURCE_NAMES: [&str; 3] = ["project", "document", "presentation"];

#[derive(Error, Debug)]
pub enum InternationalError {
    #[error("malformed {path}: {source}")]
    Manifest {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Downloadable file types, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Pdf,
        ResourceKind::Docx,
        ResourceKind::Pptx,
        ResourceKind::Xlsx,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ResourceKind::Pdf => "pdf",
            ResourceKind::Docx => "docx",
            ResourceKind::Pptx => "pptx",
            ResourceKind::Xlsx => "xlsx",
        }
    }

    /// Icon path relative to the assets directory.
    pub fn icon(self) -> &'static str {
        match self {
            ResourceKind::Pdf => "icons/file-pdf.svg",
            ResourceKind::Docx => "icons/file-doc.svg",
            ResourceKind::Pptx => "icons/file-ppt.svg",
            ResourceKind::Xlsx => "icons/file-excel.svg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// File name (`document.pdf`).
    pub name: String,
    /// Source path.
    pub path: String,
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InternationalItem {
    pub folder: String,
    /// Source path of the item folder.
    pub path: String,
    pub title: String,
    pub description: String,
    /// Source path of the cover image, if any.
    pub image: Option<String>,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct FolderList {
    #[serde(default)]
    folders: Vec<String>,
}

/// Source path of the international folder.
pub fn international_path(media_dir: &str, dir: &str) -> String {
    source::join(media_dir, dir)
}

/// Folder names to load: the list file if present, else the default folders
/// that have a payload.
pub fn discover_folders<S: ContentSource + ?Sized>(
    source: &S,
    base: &str,
) -> Result<Vec<String>, InternationalError> {
    let path = source::join(base, INTERNATIONAL_MANIFEST);
    match source.fetch(&path) {
        Ok(bytes) => {
            let list: FolderList =
                serde_json::from_slice(&bytes).map_err(|source| InternationalError::Manifest {
                    path: path.clone(),
                    source,
                })?;
            return Ok(list.folders);
        }
        Err(e) => log::debug!("{path}: {e}, trying default folders"),
    }
    Ok(DEFAULT_FOLDERS
        .iter()
        .filter(|folder| source.exists(&source::join(&source::join(base, folder), ITEM_PAYLOAD)))
        .map(|folder| folder.to_string())
        .collect())
}

/// `picture.png`, `picture.jpg`, ... `thumbnail.webp`.
pub fn image_candidates() -> Vec<String> {
    IMAGE_NAMES
        .iter()
        .flat_map(|name| IMAGE_EXTENSIONS.iter().map(move |ext| format!("{name}.{ext}")))
        .collect()
}

/// Resource candidates for `folder_name`, extension-major. A folder named
/// like one of the fixed names is not probed twice.
pub fn resource_candidates(folder_name: &str) -> Vec<(String, ResourceKind)> {
    let mut names: Vec<&str> = RESOURCE_NAMES.to_vec();
    if !names.contains(&folder_name) {
        names.push(folder_name);
    }
    ResourceKind::ALL
        .iter()
        .flat_map(|&kind| {
            names
                .iter()
                .map(move |name| (format!("{name}.{}", kind.extension()), kind))
        })
        .collect()
}

/// First image candidate present in `folder`.
pub fn find_image<S: ContentSource + ?Sized>(source: &S, folder: &str) -> Option<String> {
    let candidates = image_candidates();
    let names: Vec<&str> = candidates.iter().map(String::as_str).collect();
    probe::probe_candidates(source, folder, &names)
        .into_iter()
        .next()
        .map(|name| source::join(folder, &name))
}

/// Every resource candidate present in `folder`.
pub fn find_resources<S: ContentSource + ?Sized>(
    source: &S,
    folder: &str,
    folder_name: &str,
) -> Vec<Resource> {
    resource_candidates(folder_name)
        .par_iter()
        .filter_map(|(name, kind)| {
            let path = source::join(folder, name);
            source.exists(&path).then(|| Resource {
                name: name.clone(),
                path,
                kind: *kind,
            })
        })
        .collect()
}

/// Load one item. Missing or broken payloads skip the item.
fn load_item<S: ContentSource + ?Sized>(
    source: &S,
    base: &str,
    folder: &str,
) -> Option<InternationalItem> {
    let path = source::join(base, folder);
    let payload = source::join(&path, ITEM_PAYLOAD);
    let bytes = match source.fetch(&payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("{payload}: {e}");
            return None;
        }
    };
    let data: Value = match serde_json::from_slice(&bytes) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("malformed JSON in {payload}, skipping: {e}");
            return None;
        }
    };
    Some(InternationalItem {
        folder: folder.to_string(),
        title: text::first_non_empty(&[&text::field(&data, "title"), folder]),
        description: text::field(&data, "description"),
        image: find_image(source, &path),
        resources: find_resources(source, &path, folder),
        path,
    })
}

/// Load every international item, in list order.
pub fn try_load_international<S: ContentSource + ?Sized>(
    source: &S,
    media_dir: &str,
    dir: &str,
) -> Result<Vec<InternationalItem>, InternationalError> {
    let base = international_path(media_dir, dir);
    let folders = discover_folders(source, &base)?;
    let items: Vec<InternationalItem> = folders
        .par_iter()
        .filter_map(|folder| load_item(source, &base, folder))
        .collect();
    log::info!("{base}: {} international item(s)", items.len());
    Ok(items)
}
