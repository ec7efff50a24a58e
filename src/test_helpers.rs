//! Shared test utilities for the almanac test suite.
//!
//! Provides an in-memory [`ContentSource`], fixture builders for a small
//! two-month site, and lookup helpers that panic with a useful message.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let source = sample_site();
//! let months = discover_months(&source, "media", month("04.2025"), 24);
//! assert_eq!(months.len(), 2);
//!
//! let tmp = setup_site(&source);
//! let dir = DirSource::new(tmp.path());
//! ```

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use crate::loader::ContentEntry;
use crate::manifest::{Layout, SectionDescriptor};
use crate::month::MonthToken;
use crate::source::{ContentSource, SourceError};

// =========================================================================
// In-memory source
// =========================================================================

/// A content source backed by a map of path → bytes.
///
/// Records every `fetch` so tests can assert what was (not) read.
#[derive(Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
    fetched: Mutex<Vec<String>>,
    public_base: Option<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.files.insert(path.to_string(), contents.as_ref().to_vec());
        self
    }

    /// Make `public_url` return `<base>/<path>`, like a remote source.
    pub fn with_public_base(mut self, base: &str) -> Self {
        self.public_base = Some(base.trim_end_matches('/').to_string());
        self
    }

    pub fn was_fetched(&self, path: &str) -> bool {
        self.fetched.lock().unwrap().iter().any(|p| p == path)
    }

    pub fn files(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.files.iter()
    }
}

impl ContentSource for MemorySource {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        self.fetched.lock().unwrap().push(path.to_string());
        self.files.get(path).cloned().ok_or_else(|| SourceError::Status {
            url: path.to_string(),
            status: 404,
        })
    }

    fn public_url(&self, path: &str) -> Option<String> {
        self.public_base
            .as_ref()
            .map(|base| format!("{base}/{}", path.trim_start_matches('/')))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// =========================================================================
// Fixture builders
// =========================================================================

pub fn month(s: &str) -> MonthToken {
    s.parse()
        .unwrap_or_else(|e| panic!("bad month fixture '{s}': {e}"))
}

/// A descriptor whose title, folder and theme derive from the id.
pub fn descriptor(id: &str, layout: Layout) -> SectionDescriptor {
    SectionDescriptor {
        id: id.to_string(),
        title: format!("Title {id}"),
        row: 1,
        theme: "brown".to_string(),
        layout,
        folder: id.to_string(),
        description: format!("About {id}"),
    }
}

/// A tiny PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::new(width, height);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

const MARCH_SECTIONS: &str = r#"{"sections":[
  {"id":"champion","title":"Coffee Champion","row":1,"theme":"brown","layout":"column","folder":"champion","description":"This month's champion"},
  {"id":"editor","title":"From the Editor","row":1,"theme":"cream","layout":"column","folder":"editor","description":"A note"},
  {"id":"changing-timezones","title":"Changing Timezones","row":2,"theme":"green","layout":"row","folder":"changing-timezones","description":"Then and now"},
  {"id":"projects","title":"Projects","row":3,"theme":"blue","layout":"dropdown","folder":"projects","description":"What we built"},
  {"id":"featured","title":"Featured","row":4,"theme":"gold","layout":"dynamic","folder":"featured","description":"Highlights"},
  {"id":"knowledge-bites","title":"Knowledge Bites","row":2,"theme":"cream","layout":"column","folder":"knowledge bites","description":"Quick facts"},
  {"id":"recipes","title":"Recipes","row":5,"theme":"brown","layout":"column","folder":"recipes","description":"Coming soon"}
]}"#;

const JANUARY_SECTIONS: &str = r#"{"sections":[
  {"id":"editor","title":"From the Editor","row":1,"theme":"cream","layout":"column","folder":"editor","description":"A note"},
  {"id":"spread-kindness","title":"Spread Kindness","row":1,"theme":"pink","layout":"column","folder":"spread-kindness","description":"Kind acts"}
]}"#;

const SAMPLE_REGISTRY: &str = r#"{"districts":[
  {"id":"north","name":"North","code":"N1","stores":[
    {"id":"harbor","name":"Harbor","code":"S-001","address":"1 Quay St",
     "storeLeader":{"name":"Ada Stone","role":"Store Leader","isCertified":true,
                    "employmentDate":"2019-04-01","certificationDate":"2021-06-15","certificationExpiry":"2025-06-15"},
     "masters":[
       {"name":"Ben Cole","role":"Coffee Master","isCertified":true,"certificationDate":"2023-02-01"},
       {"name":"Cy <Dee>","isCertified":false}
     ]},
    {"id":"mill","name":"Mill Road","code":"S-002","address":"",
     "storeLeader":{"name":"Dan Moss","isCertified":false}}
  ]},
  {"id":"south","name":"South","code":"S1","stores":[
    {"id":"pier","name":"Pier","storeLeader":{"name":"Eva Lind","isCertified":true}}
  ]}
]}"#;

/// Two districts, three stores, five people of whom three are certified.
pub fn sample_registry_json() -> &'static str {
    SAMPLE_REGISTRY
}

/// A two-month site: `03.2025` with a spread of section kinds and `01.2025`
/// with two plain sections, plus one international item and the masters
/// registry.
pub fn sample_site() -> MemorySource {
    let png = png_bytes(8, 6);
    MemorySource::new()
        .with("assets/links.json", r#"{"champion-instagram":"https://instagram.com/champ"}"#)
        .with("media/03.2025/sections.json", MARCH_SECTIONS)
        .with(
            "media/03.2025/champion/champion.json",
            r#"{"title":"Champion of the Month","name":"Ana Ruiz","message":"Coffee is love.\n\nServe it warm."}"#,
        )
        .with("media/03.2025/champion/champion.png", &png)
        .with("media/03.2025/editor/editor.json", "{not json")
        .with(
            "media/03.2025/changing-timezones/text.json",
            r#"{"master-1":"Ben","master-1-then":"2016","master-1-then-desc":"Barista","master-1-now-desc":"Trainer"}"#,
        )
        .with("media/03.2025/changing-timezones/master-1-then.png", &png)
        .with(
            "media/03.2025/projects/project-1/text.json",
            r#"{"title":"Cold Brew Lab","description":"Slow and steady."}"#,
        )
        .with("media/03.2025/projects/project-1/project.pdf", "%PDF-1.4")
        .with(
            "media/03.2025/projects/project-2/text.json",
            r#"{"title":"Bean Map","description":"Where beans come from."}"#,
        )
        .with(
            "media/03.2025/featured/launch/text.json",
            r#"{"title":"New Menu","description":"Now live."}"#,
        )
        .with("media/03.2025/featured/launch/picture.png", &png)
        .with(
            "media/03.2025/knowledge bites/knowledge-bites.json",
            r#"{"title":"Did you know?","bites":["Arabica <3","Robusta"]}"#,
        )
        .with("media/01.2025/sections.json", JANUARY_SECTIONS)
        .with(
            "media/01.2025/editor/editor.json",
            r#"{"name":"Eve","message":"Happy new year"}"#,
        )
        .with(
            "media/01.2025/spread-kindness/spread-kindness.json",
            r#"{"title":"Kindness","content":"Hold the door."}"#,
        )
        .with("media/international/international-items.json", r#"{"folders":["expo"]}"#)
        .with(
            "media/international/expo/text.json",
            r#"{"title":"World Expo","description":"Our booth abroad."}"#,
        )
        .with("media/international/expo/cover.png", &png)
        .with("media/international/expo/expo.pdf", "%PDF-1.4")
        .with("assets/centralisator.json", SAMPLE_REGISTRY)
}

/// Write every file of `source` under a fresh temp directory.
pub fn setup_site(source: &MemorySource) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_site(source, tmp.path());
    tmp
}

pub fn write_site(source: &MemorySource, root: &Path) {
    for (path, bytes) in source.files() {
        let dest = root.join(path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&dest, bytes).unwrap();
    }
}

// =========================================================================
// Cache lookups (panic with a clear message on miss)
// =========================================================================

/// Find the entry for a section in a month. Panics if not found.
pub fn find_entry<'a>(entries: &'a [ContentEntry], month: &str, id: &str) -> &'a ContentEntry {
    entries
        .iter()
        .find(|e| e.month.to_string() == month && e.section.id == id)
        .unwrap_or_else(|| {
            let keys: Vec<String> = entries
                .iter()
                .map(|e| format!("{}/{}", e.month, e.section.id))
                .collect();
            panic!("entry '{month}/{id}' not found. Available: {keys:?}")
        })
}

/// Count non-overlapping occurrences of `needle` in `haystack`.
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
