//! Month scaffolding for `almanac setup-month`.
//!
//! Creates `<media>/<MM.YYYY>/` with a default `sections.json`, one folder per
//! standard section and a README in each folder. Anything that already exists
//! is left alone, so running it twice changes nothing.

use crate::manifest::{Layout, MANIFEST_FILENAME, SectionDescriptor};
use crate::month::MonthToken;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// `(id, title, row, theme, layout, folder, description)`
const DEFAULT_SECTIONS: [(&str, &str, u32, &str, Layout, &str, &str); 9] = [
    ("champion", "Champion's Word", 1, "legendary", Layout::Column, "champion", "Words of wisdom from our National Champion"),
    ("editor", "Editor's Word", 1, "important", Layout::Column, "editor", "Insights from the Coffee & Craft Leader"),
    ("matcha-zone", "Matcha Zone", 2, "caring", Layout::Column, "matcha-zone", "Dive into the world of matcha"),
    ("knowledge-bites", "Knowledge Bites", 3, "astral", Layout::Column, "knowledge bites", "Quick coffee facts to expand your knowledge"),
    ("spread-kindness", "Spread Kindness", 4, "love", Layout::Column, "spread-kindness", "Heartwarming stories from our community"),
    ("master-speaks", "Master Speaks", 5, "hard", Layout::Row, "master-speaks", "Coffee Masters share their journey"),
    ("changing-timezones", "Changing Timezones", 6, "event", Layout::Row, "changing-timezones", "Coffee Masters through time"),
    ("projects", "Projects", 7, "action", Layout::Dropdown, "projects", "Explore our ongoing coffee projects"),
    ("featured", "Featured", 8, "news", Layout::Dynamic, "featured", "Latest highlights and announcements"),
];

pub fn default_sections() -> Vec<SectionDescriptor> {
    DEFAULT_SECTIONS
        .iter()
        .map(|&(id, title, row, theme, layout, folder, description)| SectionDescriptor {
            id: id.to_string(),
            title: title.to_string(),
            row,
            theme: theme.to_string(),
            layout,
            folder: folder.to_string(),
            description: description.to_string(),
        })
        .collect()
}

/// What `setup_month` created. Paths are relative to the month folder.
#[derive(Debug)]
pub struct ScaffoldReport {
    pub month: MonthToken,
    pub month_dir: PathBuf,
    pub month_dir_existed: bool,
    pub manifest_written: bool,
    pub created: Vec<String>,
}

fn readme(folder: &str) -> String {
    format!(
        "# {folder}\n\n\
         Add your content here:\n\
         - Required: JSON file with content data\n\
         - Optional: Images (.png, .jpg)\n\
         - Optional: PDFs for documents\n"
    )
}

/// Scaffold `month` under `<root>/<media_dir>/`.
pub fn setup_month(
    root: &Path,
    media_dir: &str,
    month: MonthToken,
) -> Result<ScaffoldReport, ScaffoldError> {
    let month_dir = root.join(media_dir).join(month.to_string());
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ScaffoldError::Io { path, source }
    };

    let month_dir_existed = month_dir.is_dir();
    fs::create_dir_all(&month_dir).map_err(io_err(&month_dir))?;

    let sections = default_sections();
    let manifest_path = month_dir.join(MANIFEST_FILENAME);
    let manifest_written = !manifest_path.exists();
    if manifest_written {
        let json = serde_json::to_string_pretty(&serde_json::json!({ "sections": sections }))?;
        fs::write(&manifest_path, json).map_err(io_err(&manifest_path))?;
    } else {
        log::info!("keeping existing {}", manifest_path.display());
    }

    let mut created = Vec::new();
    for section in &sections {
        let folder = section.folder_name();
        let dir = month_dir.join(folder);
        if !dir.is_dir() {
            fs::create_dir_all(&dir).map_err(io_err(&dir))?;
            created.push(format!("{folder}/"));
        }
        let readme_path = dir.join("README.md");
        if !readme_path.exists() {
            fs::write(&readme_path, readme(folder)).map_err(io_err(&readme_path))?;
            created.push(format!("{folder}/README.md"));
        }
    }

    Ok(ScaffoldReport {
        month,
        month_dir,
        month_dir_existed,
        manifest_written,
        created,
    })
}
