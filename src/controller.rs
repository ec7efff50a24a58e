//! Month and filter controllers.
//!
//! The content cache is filled once per build: every discovered month, every
//! section, loaded in manifest order. Controllers then render pages from it
//! into a [`PageSink`]:
//!
//! - [`ArchiveController`] filters by month and section. Every filter change
//!   re-renders the archive page wholesale.
//! - [`LiveController`] renders one month's sections grouped into rows.
//! - [`InternationalController`] renders the undated international items.
//! - [`MastersController`] renders the coffee-master registry, one page per
//!   district and store.
//!
//! ## Page paths
//!
//! ```text
//! index.html                       # live view of the most recent month
//! 03.2025/index.html               # live view of one month
//! archive/index.html               # archive, all months, all sections
//! archive/<month|all>/<id|all>.html
//! international/index.html
//! masters/index.html
//! masters/<district>/index.html
//! masters/<district>/<store>.html
//! ```

use crate::generate::{self, Chrome};
use crate::international::{InternationalError, InternationalItem};
use crate::loader::{self, ContentEntry};
use crate::manifest::{self, SectionDescriptor};
use crate::masters::{self, District, Registry, Statistics, Store};
use crate::month::MonthToken;
use crate::render::{self, RenderContext, View};
use crate::source::ContentSource;
use maud::{Markup, html};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ALL: &str = "all";

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for rendered pages, keyed by site-relative path.
pub trait PageSink {
    fn write_page(&mut self, path: &str, html: &str) -> Result<(), SinkError>;
}

/// Writes pages under an output directory.
pub struct FileSink {
    root: PathBuf,
    written: usize,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl PageSink for FileSink {
    fn write_page(&mut self, path: &str, html: &str) -> Result<(), SinkError> {
        let dest = self.root.join(path);
        let io_err = |source| SinkError::Io {
            path: path.to_string(),
            source,
        };
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&dest, html).map_err(io_err)?;
        self.written += 1;
        log::debug!("wrote {path}");
        Ok(())
    }
}

/// Keeps pages in memory. Later writes to the same path replace earlier ones.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub pages: BTreeMap<String, String>,
}

impl PageSink for MemorySink {
    fn write_page(&mut self, path: &str, html: &str) -> Result<(), SinkError> {
        self.pages.insert(path.to_string(), html.to_string());
        Ok(())
    }
}

// ============================================================================
// Content cache
// ============================================================================

/// Every loaded section of every discovered month.
#[derive(Debug, Default)]
pub struct ContentCache {
    /// Most recent first.
    pub months: Vec<MonthToken>,
    pub manifests: BTreeMap<MonthToken, Vec<SectionDescriptor>>,
    /// Month order, then manifest order.
    pub entries: Vec<ContentEntry>,
}

impl ContentCache {
    /// Load manifests and sections for `months` (already sorted descending).
    pub fn load<S: ContentSource + ?Sized>(
        source: &S,
        media_dir: &str,
        months: &[MonthToken],
    ) -> Self {
        let mut cache = ContentCache {
            months: months.to_vec(),
            ..ContentCache::default()
        };
        for &month in months {
            let sections = manifest::load_manifest(source, media_dir, month);
            log::info!("{month}: {} section(s)", sections.len());
            cache
                .entries
                .extend(loader::load_month(source, media_dir, month, &sections));
            cache.manifests.insert(month, sections);
        }
        cache
    }

    pub fn latest(&self) -> Option<MonthToken> {
        self.months.first().copied()
    }

    pub fn month_entries(&self, month: MonthToken) -> impl Iterator<Item = &ContentEntry> {
        self.entries.iter().filter(move |e| e.month == month)
    }

    /// Section filter options: unique ids of the most recent month's manifest.
    pub fn section_options(&self) -> Vec<(String, String)> {
        let Some(sections) = self.latest().and_then(|m| self.manifests.get(&m)) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        sections
            .iter()
            .filter(|s| seen.insert(s.id.as_str()))
            .map(|s| (s.id.clone(), s.display_title().to_string()))
            .collect()
    }

    /// Archive rows matching `filter`, grouped by section id in order of first
    /// appearance.
    pub fn filter_archive(&self, filter: &ArchiveFilter) -> Vec<&ContentEntry> {
        let matching: Vec<&ContentEntry> = self
            .entries
            .iter()
            .filter(|e| e.content().is_some())
            .filter(|e| filter.month.is_none_or(|m| e.month == m))
            .filter(|e| filter.section.as_ref().is_none_or(|s| &e.section.id == s))
            .collect();

        let mut order: Vec<&str> = Vec::new();
        let mut groups: BTreeMap<&str, Vec<&ContentEntry>> = BTreeMap::new();
        for entry in matching {
            let id = entry.section.id.as_str();
            if !groups.contains_key(id) {
                order.push(id);
            }
            groups.entry(id).or_default().push(entry);
        }
        order
            .into_iter()
            .flat_map(|id| groups.remove(id).unwrap_or_default())
            .collect()
    }
}

// ============================================================================
// Archive
// ============================================================================

/// Current archive filter. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveFilter {
    pub month: Option<MonthToken>,
    pub section: Option<String>,
}

impl ArchiveFilter {
    /// Page path for this filter combination.
    pub fn page_path(&self) -> String {
        archive_path(self.month, self.section.as_deref())
    }
}

pub fn archive_path(month: Option<MonthToken>, section: Option<&str>) -> String {
    let month = month.map(|m| m.to_string()).unwrap_or_else(|| ALL.to_string());
    format!("archive/{month}/{}.html", section.unwrap_or(ALL))
}

pub fn live_path(month: MonthToken) -> String {
    format!("{month}/index.html")
}

/// Relative path from `page` back to the site root.
pub fn root_prefix(page: &str) -> String {
    "../".repeat(page.matches('/').count())
}

pub struct ArchiveController<'a, K: PageSink> {
    cache: &'a ContentCache,
    chrome: &'a Chrome<'a>,
    sink: &'a mut K,
    filter: ArchiveFilter,
}

impl<'a, K: PageSink> ArchiveController<'a, K> {
    pub fn new(cache: &'a ContentCache, chrome: &'a Chrome<'a>, sink: &'a mut K) -> Self {
        Self {
            cache,
            chrome,
            sink,
            filter: ArchiveFilter::default(),
        }
    }

    pub fn filter(&self) -> &ArchiveFilter {
        &self.filter
    }

    /// Change the month filter and re-render.
    pub fn set_month(&mut self, month: Option<MonthToken>) -> Result<String, SinkError> {
        self.filter.month = month;
        self.render()
    }

    /// Change the section filter and re-render.
    pub fn set_section(&mut self, section: Option<String>) -> Result<String, SinkError> {
        self.filter.section = section;
        self.render()
    }

    /// Render the page for the current filter. Returns its path.
    pub fn render(&mut self) -> Result<String, SinkError> {
        let path = self.filter.page_path();
        let page = self.page(&path);
        self.sink.write_page(&path, &page.into_string())?;
        Ok(path)
    }

    /// Render every filter combination plus `archive/index.html`.
    pub fn render_all(&mut self) -> Result<usize, SinkError> {
        let months: Vec<Option<MonthToken>> = std::iter::once(None)
            .chain(self.cache.months.iter().copied().map(Some))
            .collect();
        let sections: Vec<Option<String>> = std::iter::once(None)
            .chain(self.cache.section_options().into_iter().map(|(id, _)| Some(id)))
            .collect();

        let mut count = 0;
        for month in &months {
            for section in &sections {
                self.filter = ArchiveFilter {
                    month: *month,
                    section: section.clone(),
                };
                self.render()?;
                count += 1;
            }
        }

        self.filter = ArchiveFilter::default();
        let index = "archive/index.html";
        let page = self.page(index);
        self.sink.write_page(index, &page.into_string())?;
        Ok(count + 1)
    }

    fn page(&self, path: &str) -> Markup {
        let prefix = root_prefix(path);
        let ctx = RenderContext {
            view: View::Archive,
            links: self.chrome.links,
            images: self.chrome.images,
            media_root: self.chrome.media_root,
            prefix: &prefix,
        };

        let body = if self.cache.months.is_empty() {
            render::error_panel(
                "Error Loading Archive",
                "Unable to load archive content. No published months were found.",
            )
        } else {
            let cards: Vec<Markup> = self
                .cache
                .filter_archive(&self.filter)
                .into_iter()
                .filter_map(|entry| render::render_section(entry, &ctx))
                .collect();
            if cards.is_empty() {
                render::empty_results()
            } else {
                html! { @for card in &cards { (card) } }
            }
        };

        let content = html! {
            div.archive-controls {
                (self.month_selector(&prefix))
                (self.section_selector(&prefix))
            }
            div #archive-container {
                (body)
            }
        };
        let title = format!("{} · Archive", self.chrome.title);
        generate::page(self.chrome, &title, &prefix, "archive-page", content)
    }

    fn month_selector(&self, prefix: &str) -> Markup {
        let section = self.filter.section.as_deref();
        html! {
            label.archive-controls__label for="month-selector" { "Month" }
            select #month-selector data-navigate {
                option value={ (prefix) (archive_path(None, section)) }
                    selected[self.filter.month.is_none()] { "All Months" }
                @for month in &self.cache.months {
                    option value={ (prefix) (archive_path(Some(*month), section)) }
                        selected[self.filter.month == Some(*month)] { (month.short_label()) }
                }
            }
        }
    }

    fn section_selector(&self, prefix: &str) -> Markup {
        let month = self.filter.month;
        let current = self.filter.section.as_deref();
        html! {
            label.archive-controls__label for="section-selector" { "Section" }
            select #section-selector data-navigate {
                option value={ (prefix) (archive_path(month, None)) }
                    selected[current.is_none()] { "All Sections" }
                @for (id, title) in self.cache.section_options() {
                    option value={ (prefix) (archive_path(month, Some(&id))) }
                        selected[current == Some(id.as_str())] { (title) }
                }
            }
        }
    }
}

// ============================================================================
// Live view
// ============================================================================

pub struct LiveController<'a, K: PageSink> {
    cache: &'a ContentCache,
    chrome: &'a Chrome<'a>,
    sink: &'a mut K,
}

impl<'a, K: PageSink> LiveController<'a, K> {
    pub fn new(cache: &'a ContentCache, chrome: &'a Chrome<'a>, sink: &'a mut K) -> Self {
        Self {
            cache,
            chrome,
            sink,
        }
    }

    /// Render one month's page at its own path.
    pub fn render_month(&mut self, month: MonthToken) -> Result<String, SinkError> {
        let path = live_path(month);
        let page = self.page(Some(month), &path);
        self.sink.write_page(&path, &page.into_string())?;
        Ok(path)
    }

    /// Render every month plus `index.html` for the most recent one.
    ///
    /// With no months, `index.html` carries the error panel.
    pub fn render_all(&mut self) -> Result<usize, SinkError> {
        let months = self.cache.months.clone();
        for &month in &months {
            self.render_month(month)?;
        }
        let page = self.page(self.cache.latest(), "index.html");
        self.sink.write_page("index.html", &page.into_string())?;
        Ok(months.len() + 1)
    }

    fn page(&self, month: Option<MonthToken>, path: &str) -> Markup {
        let prefix = root_prefix(path);
        let ctx = RenderContext {
            view: View::Live,
            links: self.chrome.links,
            images: self.chrome.images,
            media_root: self.chrome.media_root,
            prefix: &prefix,
        };

        let (title, body) = match month {
            None => (
                self.chrome.title.to_string(),
                render::error_panel(
                    "Error Loading Content",
                    "Unable to load content. No published months were found.",
                ),
            ),
            Some(month) => (
                format!("{} · {}", self.chrome.title, month.label()),
                self.rows(month, &ctx),
            ),
        };

        let content = html! {
            @if let Some(current) = month {
                (self.edition_switcher(current, &prefix))
            }
            div #content-container {
                (body)
            }
        };
        generate::page(self.chrome, &title, &prefix, "live-page", content)
    }

    /// Sections grouped by `row`, rows ascending, manifest order within a row.
    fn rows(&self, month: MonthToken, ctx: &RenderContext) -> Markup {
        let mut rows: BTreeMap<u32, Vec<Markup>> = BTreeMap::new();
        for entry in self.cache.month_entries(month) {
            if let Some(card) = render::render_section(entry, ctx) {
                rows.entry(entry.section.row).or_default().push(card);
            }
        }
        if rows.is_empty() {
            return html! {
                div.content-empty { p { "No content available for " (month.label()) "." } }
            };
        }
        html! {
            @for (row, cards) in &rows {
                div.content-row data-row=(row) {
                    @for card in cards { (card) }
                }
            }
        }
    }

    /// Edition picker, shown only when there is more than one month.
    fn edition_switcher(&self, current: MonthToken, prefix: &str) -> Markup {
        html! {
            @if self.cache.months.len() > 1 {
                div.month-switcher {
                    label.month-switcher__label for="edition-selector" { "Edition: " }
                    select.month-switcher__select #edition-selector data-navigate {
                        @for month in &self.cache.months {
                            option value={ (prefix) (live_path(*month)) }
                                selected[*month == current] { (month.label()) }
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// International
// ============================================================================

pub const INTERNATIONAL_PAGE: &str = "international/index.html";

/// Renders the international page from the loaded items, or an error panel
/// when the item list could not be read.
pub struct InternationalController<'a, K: PageSink> {
    items: &'a Result<Vec<InternationalItem>, InternationalError>,
    assets_dir: &'a str,
    chrome: &'a Chrome<'a>,
    sink: &'a mut K,
}

impl<'a, K: PageSink> InternationalController<'a, K> {
    pub fn new(
        items: &'a Result<Vec<InternationalItem>, InternationalError>,
        assets_dir: &'a str,
        chrome: &'a Chrome<'a>,
        sink: &'a mut K,
    ) -> Self {
        Self {
            items,
            assets_dir,
            chrome,
            sink,
        }
    }

    pub fn render(&mut self) -> Result<String, SinkError> {
        let prefix = root_prefix(INTERNATIONAL_PAGE);
        let ctx = RenderContext {
            view: View::Live,
            links: self.chrome.links,
            images: self.chrome.images,
            media_root: self.chrome.media_root,
            prefix: &prefix,
        };
        let body = match self.items {
            Ok(items) => render::international_section(items, &ctx, self.assets_dir),
            Err(_) => render::error_panel(
                "Error Loading International Content",
                "Unable to load international content. Please try again later.",
            ),
        };
        let content = html! {
            h2.page-title { "International" }
            div #international-container { (body) }
        };
        let title = format!("{} · International", self.chrome.title);
        let page = generate::page(self.chrome, &title, &prefix, "international-page", content);
        self.sink.write_page(INTERNATIONAL_PAGE, &page.into_string())?;
        Ok(INTERNATIONAL_PAGE.to_string())
    }
}

// ============================================================================
// Masters
// ============================================================================

pub const MASTERS_PAGE: &str = "masters/index.html";

pub fn masters_district_path(district: &District) -> String {
    format!("masters/{}/index.html", masters::slug(&district.id))
}

pub fn masters_store_path(district: &District, store: &Store) -> String {
    format!(
        "masters/{}/{}.html",
        masters::slug(&district.id),
        masters::slug(&store.id)
    )
}

/// Renders the masters browser: statistics, then district and store tabs.
///
/// ```text
/// masters/index.html                # first district, first store
/// masters/<district>/index.html     # that district's first store
/// masters/<district>/<store>.html
/// ```
///
/// Without a registry only `masters/index.html` is written, carrying the
/// error panel.
pub struct MastersController<'a, K: PageSink> {
    registry: Option<&'a Registry>,
    stats: Statistics,
    chrome: &'a Chrome<'a>,
    sink: &'a mut K,
}

impl<'a, K: PageSink> MastersController<'a, K> {
    pub fn new(registry: Option<&'a Registry>, chrome: &'a Chrome<'a>, sink: &'a mut K) -> Self {
        let stats = registry.map(Statistics::compute).unwrap_or_default();
        Self {
            registry,
            stats,
            chrome,
            sink,
        }
    }

    pub fn render_all(&mut self) -> Result<usize, SinkError> {
        let Some(registry) = self.registry else {
            let content = render::error_panel("Error Loading Data", "Unable to load masters data.");
            self.write(MASTERS_PAGE, content)?;
            return Ok(1);
        };
        let first = registry.districts.first();
        let page = self.dashboard(registry, first, first.and_then(|d| d.stores.first()), MASTERS_PAGE);
        self.write(MASTERS_PAGE, page)?;
        let mut written = 1;
        for district in &registry.districts {
            let path = masters_district_path(district);
            let page = self.dashboard(registry, Some(district), district.stores.first(), &path);
            self.write(&path, page)?;
            written += 1;
            for store in &district.stores {
                let path = masters_store_path(district, store);
                let page = self.dashboard(registry, Some(district), Some(store), &path);
                self.write(&path, page)?;
                written += 1;
            }
        }
        Ok(written)
    }

    fn write(&mut self, path: &str, content: Markup) -> Result<(), SinkError> {
        let prefix = root_prefix(path);
        let content = html! {
            h2.page-title { "Coffee Masters" }
            div #masters-container { (content) }
        };
        let title = format!("{} · Coffee Masters", self.chrome.title);
        let page = generate::page(self.chrome, &title, &prefix, "masters-page", content);
        self.sink.write_page(path, &page.into_string())
    }

    fn dashboard(
        &self,
        registry: &Registry,
        district: Option<&District>,
        store: Option<&Store>,
        path: &str,
    ) -> Markup {
        let prefix = root_prefix(path);
        html! {
            (render::masters_stats(&self.stats))
            @if registry.districts.is_empty() {
                div.no-content-message { p { "No districts registered yet." } }
            }
            nav.district-tabs {
                @for d in &registry.districts {
                    a.district-tab.active[district.is_some_and(|c| c.id == d.id)]
                        href={ (prefix) (masters_district_path(d)) } { (d.name) }
                }
            }
            @if let Some(district) = district {
                nav.store-tabs {
                    @for s in &district.stores {
                        a.store-tab.active[store.is_some_and(|c| c.id == s.id)]
                            href={ (prefix) (masters_store_path(district, s)) } {
                            (s.name)
                            span.store-tab__badge { (s.head_count()) }
                        }
                    }
                }
                @match store {
                    Some(store) => {
                        (render::store_detail(store))
                    },
                    None => {
                        div.no-content-message { p { "No stores in this district." } }
                    },
                }
            }
        }
    }
}
