//! Static site generation.
//!
//! Drives the whole pipeline: discover months, load every section into the
//! content cache, load the international items and the masters registry,
//! measure referenced images, then render every view through its controller.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                 # Live view, most recent month
//! ├── 03.2025/index.html         # Live view per month
//! ├── archive/
//! │   ├── index.html             # All months, all sections
//! │   ├── all/champion.html      # One page per filter combination
//! │   └── 03.2025/all.html
//! ├── international/index.html   # Undated international items
//! ├── masters/
//! │   ├── index.html             # Registry statistics, first store
//! │   └── north/harbor.html      # One page per district and store
//! ├── media/03.2025/champion/    # Copied media (local sources only)
//! │   └── champion.png
//! └── assets/
//! ```
//!
//! ## CSS and JavaScript
//!
//! Embedded at compile time and inlined into every page:
//! - `static/style.css`: card themes and layout
//! - `static/site.js`: lazy image loading and selector navigation, configured
//!   from `[lazy]` through `data-*` attributes on `<body>`
//!
//! ## Images
//!
//! Every image a card references is fetched and decoded once through a
//! [`VisibilityLoader`], the same scheduler the browser script mirrors. Decoded
//! sizes become placeholder dimensions; failures are reported as broken images
//! and still render as lazy placeholders.

use crate::config::{ConfigError, LazyConfig, SiteConfig};
use crate::controller::{
    ArchiveController, ContentCache, FileSink, InternationalController, LiveController,
    MastersController, SinkError,
};
use crate::international::{self, InternationalItem};
use crate::lazy::{LoadPolicy, LoadState, Quality, VisibilityLoader};
use crate::loader::SectionState;
use crate::manifest::{self, LinksMap};
use crate::masters;
use crate::month::MonthToken;
use crate::render::{self, ImageIndex, ImageInfo, MediaRoot};
use crate::source::{ContentSource, SourceError};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

const CSS: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/site.js");
const GENERATOR: &str = concat!("almanac ", env!("ALMANAC_VERSION"));

/// Site-wide inputs shared by every page.
pub struct Chrome<'a> {
    pub title: &'a str,
    pub links: &'a LinksMap,
    pub images: &'a ImageIndex,
    pub media_root: &'a MediaRoot,
    pub lazy: &'a LazyConfig,
}

/// What a build found and wrote.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub months: Vec<MonthToken>,
    pub loaded: usize,
    pub absent: usize,
    pub malformed: usize,
    pub images_checked: usize,
    pub broken_images: Vec<String>,
    /// International items loaded, `None` when the item list was malformed.
    pub international: Option<usize>,
    /// Stores in the masters registry, `None` when it could not be loaded.
    pub masters_stores: Option<usize>,
    pub pages: usize,
    pub media_files: usize,
}

/// Discover months and fill the content cache.
pub fn load_site<S: ContentSource + ?Sized>(
    source: &S,
    config: &SiteConfig,
    today: MonthToken,
) -> ContentCache {
    let months = manifest::discover_months(
        source,
        &config.media_dir,
        today,
        config.discovery.window_months,
    );
    if months.is_empty() {
        log::error!(
            "no months with a {} found under {} in {}",
            manifest::MANIFEST_FILENAME,
            config.media_dir,
            source.describe()
        );
    }
    ContentCache::load(source, &config.media_dir, &months)
}

pub fn generate<S: ContentSource + ?Sized>(
    source: &S,
    config: &SiteConfig,
    today: MonthToken,
    output_dir: &Path,
) -> Result<BuildReport, GenerateError> {
    let links = manifest::load_links(source, &config.links_file);
    let cache = load_site(source, config, today);

    let mut report = BuildReport {
        months: cache.months.clone(),
        ..BuildReport::default()
    };
    for entry in &cache.entries {
        match entry.state {
            SectionState::Loaded { .. } => report.loaded += 1,
            SectionState::Absent => report.absent += 1,
            SectionState::Malformed => report.malformed += 1,
        }
    }

    let international =
        international::try_load_international(source, &config.media_dir, &config.international_dir);
    match &international {
        Ok(items) => report.international = Some(items.len()),
        Err(e) => log::error!("{e}"),
    }
    let registry = match masters::load_registry(source, &config.masters_file) {
        Ok(registry) => Some(registry),
        Err(e) => {
            log::warn!("masters registry unavailable: {e}");
            None
        }
    };
    report.masters_stores = registry
        .as_ref()
        .map(|r| r.districts.iter().map(|d| d.stores.len()).sum());

    let images = if config.lazy.verify_images {
        let items = international.as_deref().unwrap_or_default();
        let scan = measure_images(source, &site_images(&cache, items), &config.lazy);
        report.images_checked = scan.checked;
        report.broken_images = scan.broken;
        scan.index
    } else {
        ImageIndex::new()
    };

    fs::create_dir_all(output_dir)?;

    let media_root = match source.public_url("") {
        Some(base) => MediaRoot::Remote(base),
        None => MediaRoot::Relative,
    };
    if let Some(root) = source.local_root() {
        for dir in [&config.media_dir, &config.assets_dir] {
            report.media_files += copy_dir_recursive(&root.join(dir), &output_dir.join(dir))?;
        }
    }

    let chrome = Chrome {
        title: &config.title,
        links: &links,
        images: &images,
        media_root: &media_root,
        lazy: &config.lazy,
    };
    let mut sink = FileSink::new(output_dir);
    LiveController::new(&cache, &chrome, &mut sink).render_all()?;
    ArchiveController::new(&cache, &chrome, &mut sink).render_all()?;
    InternationalController::new(&international, &config.assets_dir, &chrome, &mut sink).render()?;
    MastersController::new(registry.as_ref(), &chrome, &mut sink).render_all()?;
    report.pages = sink.written();

    log::info!("site generated at {}", output_dir.display());
    Ok(report)
}

// ============================================================================
// Image pass
// ============================================================================

pub struct ImageScan {
    pub index: ImageIndex,
    pub checked: usize,
    /// Source paths that could not be fetched or decoded, sorted.
    pub broken: Vec<String>,
}

/// Every image a page references, deduplicated in first-seen order: month
/// sections first, then international covers.
pub fn site_images(cache: &ContentCache, international: &[InternationalItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    cache
        .entries
        .iter()
        .flat_map(render::referenced_images)
        .chain(international.iter().filter_map(|item| item.image.clone()))
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Fetch and decode every image in `paths`.
///
/// The page is treated as scrolled past in one go: everything becomes visible
/// at once and drains in batches once the debounce settles.
pub fn measure_images<S: ContentSource + ?Sized>(
    source: &S,
    paths: &[String],
    lazy: &LazyConfig,
) -> ImageScan {
    let mut loader: VisibilityLoader<String, ImageInfo> =
        VisibilityLoader::new(LoadPolicy::from(lazy));
    for path in paths {
        loader.observe(path.clone(), false);
    }

    let mut decode = |path: &String, _quality: Quality| image_size(source, path);
    loader.scrolled(Duration::ZERO);
    for path in paths {
        loader.visible(path, Duration::ZERO, &mut decode);
    }
    let finished = loader.run_until_idle(Duration::ZERO, &mut decode);
    log::debug!(
        "image pass: {} image(s), simulated {}ms",
        paths.len(),
        finished.as_millis()
    );

    let index: ImageIndex = paths
        .iter()
        .filter_map(|p| loader.value(p).map(|info| (p.clone(), *info)))
        .collect();
    let mut broken: Vec<String> = loader
        .keys_in(LoadState::Error)
        .into_iter()
        .cloned()
        .collect();
    broken.sort();
    for path in &broken {
        log::warn!("broken image: {path}");
    }

    ImageScan {
        index,
        checked: paths.len(),
        broken,
    }
}

fn image_size<S: ContentSource + ?Sized>(source: &S, path: &str) -> Result<ImageInfo, GenerateError> {
    let bytes = source.fetch(path)?;
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(ImageInfo { width, height })
}

// ============================================================================
// Files
// ============================================================================

/// Copy a media tree, skipping JSON payloads and READMEs. Returns the number
/// of files copied. A missing source directory copies nothing.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    if !src.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let dst_path = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dst_path)?;
            continue;
        }
        let skip = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == "json" || ext == "md");
        if !skip {
            fs::copy(entry.path(), &dst_path)?;
            copied += 1;
        }
    }
    Ok(copied)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(
    title: &str,
    lazy: &LazyConfig,
    body_class: Option<&str>,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="generator" content=(GENERATOR);
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body class=[body_class]
                data-root-margin=(lazy.root_margin)
                data-threshold=(lazy.threshold)
                data-scroll-debounce=(lazy.scroll_debounce_ms)
                data-batch-size=(lazy.batch_size)
                data-stagger=(lazy.stagger_ms)
                data-batch-interval=(lazy.batch_interval_ms)
                data-progressive=(lazy.progressive)
                data-low-quality-delay=(lazy.low_quality_delay_ms)
                data-high-quality-delay=(lazy.high_quality_delay_ms) {
                (content)
                script { (PreEscaped(JS)) }
            }
        }
    }
}

/// Renders the site header with links to every top-level page
fn site_header(chrome: &Chrome, prefix: &str) -> Markup {
    html! {
        header.site-header {
            a.site-title href={ (prefix) "index.html" } { (chrome.title) }
            nav.site-nav {
                a href={ (prefix) "index.html" } { "Current Edition" }
                a href={ (prefix) "archive/index.html" } { "Archive" }
                a href={ (prefix) "international/index.html" } { "International" }
                a href={ (prefix) "masters/index.html" } { "Masters" }
            }
        }
    }
}

/// A complete page: document, header and main content.
pub fn page(chrome: &Chrome, title: &str, prefix: &str, body_class: &str, content: Markup) -> Markup {
    base_document(
        title,
        chrome.lazy,
        Some(body_class),
        html! {
            (site_header(chrome, prefix))
            main.content {
                (content)
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DirSource;
    use crate::test_helpers::{count, month, sample_site, setup_site, MemorySource};

    fn html_contains_body_class(html: &str, class: &str) -> bool {
        html.contains(&format!(r#"<body class="{class}""#))
    }

    fn build(source: &dyn ContentSource) -> (tempfile::TempDir, BuildReport) {
        let out = tempfile::TempDir::new().unwrap();
        let report = generate(source, &SiteConfig::default(), month("04.2025"), out.path()).unwrap();
        (out, report)
    }

    fn read(dir: &Path, rel: &str) -> String {
        fs::read_to_string(dir.join(rel)).unwrap_or_else(|e| panic!("{rel}: {e}"))
    }

    // =========================================================================
    // Document structure
    // =========================================================================

    #[test]
    fn base_document_includes_doctype() {
        let doc = base_document("Test", &LazyConfig::default(), None, html! { p { "test" } })
            .into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains(r#"name="generator""#));
    }

    #[test]
    fn base_document_applies_body_class() {
        let doc = base_document("Test", &LazyConfig::default(), Some("archive-page"), html! {})
            .into_string();
        assert!(html_contains_body_class(&doc, "archive-page"));
    }

    #[test]
    fn base_document_carries_lazy_settings() {
        let lazy = LazyConfig {
            batch_size: 5,
            root_margin: "200px".into(),
            ..LazyConfig::default()
        };
        let doc = base_document("Test", &lazy, None, html! {}).into_string();
        assert!(doc.contains(r#"data-batch-size="5""#));
        assert!(doc.contains(r#"data-root-margin="200px""#));
        assert!(doc.contains(r#"data-scroll-debounce="150""#));
    }

    // =========================================================================
    // Image pass
    // =========================================================================

    #[test]
    fn measure_images_records_sizes_and_broken() {
        let source = sample_site();
        let cache = ContentCache::load(&source, "media", &[month("03.2025")]);
        let scan = measure_images(&source, &site_images(&cache, &[]), &LazyConfig::default());

        let champion = &scan.index["media/03.2025/champion/champion.png"];
        assert_eq!((champion.width, champion.height), (8, 6));
        // Timeline now-image is referenced but never shipped
        assert_eq!(
            scan.broken,
            vec!["media/03.2025/changing-timezones/master-1-now.png"]
        );
        assert_eq!(scan.checked, scan.index.len() + 1);
    }

    #[test]
    fn site_images_include_international_covers_once() {
        let source = sample_site();
        let cache = ContentCache::load(&source, "media", &[month("03.2025")]);
        let items = international::try_load_international(&source, "media", "international").unwrap();
        let mut doubled = items.clone();
        doubled.extend(items);
        let paths = site_images(&cache, &doubled);
        assert_eq!(count(&paths.join(" "), "media/international/expo/cover.png"), 1);
        assert_eq!(paths.last().map(String::as_str), Some("media/international/expo/cover.png"));

        let scan = measure_images(&source, &paths, &LazyConfig::default());
        let cover = &scan.index["media/international/expo/cover.png"];
        assert_eq!((cover.width, cover.height), (8, 6));
    }

    #[test]
    fn undecodable_image_is_broken() {
        let source = MemorySource::new()
            .with("media/02.2025/sections.json", r#"{"sections":[{"id":"champion","title":"C"}]}"#)
            .with("media/02.2025/champion/champion.json", r#"{"name":"X"}"#)
            .with("media/02.2025/champion/champion.png", "not a png");
        let cache = ContentCache::load(&source, "media", &[month("02.2025")]);
        let scan = measure_images(&source, &site_images(&cache, &[]), &LazyConfig::default());
        assert!(scan.index.is_empty());
        assert_eq!(scan.broken.len(), 1);
    }

    // =========================================================================
    // Full builds
    // =========================================================================

    #[test]
    fn build_local_site() {
        let tmp = setup_site(&sample_site());
        let source = DirSource::new(tmp.path());
        let (out, report) = build(&source);

        assert_eq!(report.months, vec![month("03.2025"), month("01.2025")]);
        assert_eq!(report.malformed, 1);
        assert_eq!(report.absent, 1);
        assert_eq!(report.broken_images.len(), 1);
        // 2 month pages + index, 3 x 8 archive pages + archive index,
        // international, masters index + 2 districts + 3 stores
        assert_eq!(report.pages, 3 + 25 + 1 + 6);
        assert_eq!(report.international, Some(1));
        assert_eq!(report.masters_stores, Some(3));

        let index = read(out.path(), "index.html");
        assert!(index.contains("Champion of the Month"));
        assert!(index.contains(r#"data-src="media/03.2025/champion/champion.png""#));
        assert!(index.contains("0 0 8 6"));
        assert!(index.contains("https://instagram.com/champ"));

        let month_page = read(out.path(), "03.2025/index.html");
        assert!(month_page.contains(r#"data-src="../media/03.2025/champion/champion.png""#));

        let archive = read(out.path(), "archive/03.2025/champion.html");
        assert_eq!(count(&archive, "archive-section--champion"), 1);
        assert!(archive.contains(r#"data-src="../../media/03.2025/champion/champion.png""#));

        let international = read(out.path(), "international/index.html");
        assert!(international.contains("World Expo"));
        assert!(international.contains(r#"href="../index.html""#));
        assert!(read(out.path(), "masters/north/harbor.html").contains("Ada Stone"));
        assert!(index.contains(r#"href="masters/index.html""#));
    }

    #[test]
    fn build_copies_media_but_not_payloads() {
        let tmp = setup_site(&sample_site());
        let (out, report) = build(&DirSource::new(tmp.path()));
        assert!(out.path().join("media/03.2025/champion/champion.png").is_file());
        assert!(out.path().join("media/03.2025/projects/project-1/project.pdf").is_file());
        assert!(out.path().join("media/03.2025/knowledge bites").is_dir());
        assert!(!out.path().join("media/03.2025/champion/champion.json").exists());
        assert!(!out.path().join("assets/links.json").exists());
        assert!(!out.path().join("assets/centralisator.json").exists());
        assert!(out.path().join("media/international/expo/expo.pdf").is_file());
        // 4 month files + international cover and pdf
        assert_eq!(report.media_files, 6);
    }

    #[test]
    fn build_remote_site_links_media_absolutely() {
        let source = sample_site().with_public_base("https://cdn.example.com/site/");
        let (out, report) = build(&source);
        assert_eq!(report.media_files, 0);
        let index = read(out.path(), "index.html");
        assert!(index.contains(
            r#"data-src="https://cdn.example.com/site/media/03.2025/champion/champion.png""#
        ));
        assert!(!out.path().join("media").exists());
    }

    #[test]
    fn build_without_months_still_writes_error_pages() {
        let (out, report) = build(&MemorySource::new());
        assert!(report.months.is_empty());
        assert!(read(out.path(), "index.html").contains("Error Loading Content"));
        assert!(read(out.path(), "archive/index.html").contains("Error Loading Archive"));
        assert!(read(out.path(), "international/index.html")
            .contains("No international content available at this time."));
        assert!(read(out.path(), "masters/index.html").contains("Error Loading Data"));
        assert_eq!(report.international, Some(0));
        assert_eq!(report.masters_stores, None);
    }

    #[test]
    fn verify_images_off_skips_image_pass() {
        let out = tempfile::TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.lazy.verify_images = false;
        let source = sample_site();
        let report = generate(&source, &config, month("04.2025"), out.path()).unwrap();
        assert_eq!(report.images_checked, 0);
        assert!(!source.was_fetched("media/03.2025/champion/champion.png"));
        // Default placeholder size when nothing was measured
        assert!(read(out.path(), "index.html").contains("0 0 400 300"));
    }
}
