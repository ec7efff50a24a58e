//! Card rendering.
//!
//! One render function per [`CardKind`], shared by the archive and the live
//! view. The kind is resolved from the section id and, in the live view, the
//! manifest layout:
//!
//! | Kind              | Sections                                   |
//! |-------------------|--------------------------------------------|
//! | `Profile`         | champion, editor, master-speaks            |
//! | `Timeline`        | changing-timezones                         |
//! | `MultiItem`       | projects, featured, matcha-zone            |
//! | `ProjectSelector` | any `dropdown` section in the live view    |
//! | `List`            | knowledge-bites                            |
//! | `PlainText`       | spread-kindness                            |
//! | `Generic`         | everything else, and live sections with no payload |
//! | `Resources`       | international items (not a month section)  |
//!
//! All payload text is escaped. Images are emitted as lazy placeholders: the
//! real URL goes in `data-src` and the page script swaps it in once the image
//! scrolls into view.

use crate::international::InternationalItem;
use crate::loader::{ContentEntry, SectionContent, SubItem};
use crate::manifest::{Layout, LinksMap, SectionDescriptor};
use crate::masters::{self, Person, Statistics, Store};
use crate::probe::{MediaBundle, SectionKind};
use crate::source;
use crate::text::{self, format_text};
use crate::timeline::{self, TimelineEntry};
use maud::{Markup, html};
use serde_json::Value;
use std::collections::HashMap;

/// Placeholder size when an image could not be measured.
pub const DEFAULT_PLACEHOLDER: (u32, u32) = (400, 300);
const PLACEHOLDER_FILL: &str = "#f0f0f0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Archive,
    Live,
}

/// Card shape for a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Profile,
    Timeline,
    MultiItem,
    ProjectSelector,
    List,
    PlainText,
    Generic,
    /// International item with downloadable files.
    Resources,
}

impl CardKind {
    pub fn resolve(kind: SectionKind, layout: Layout, view: View) -> Self {
        match (view, layout, kind) {
            (View::Live, Layout::Dropdown, _) => CardKind::ProjectSelector,
            (View::Live, Layout::Dynamic, _) => CardKind::MultiItem,
            (_, _, SectionKind::Champion | SectionKind::Editor | SectionKind::MasterSpeaks) => {
                CardKind::Profile
            }
            (_, _, SectionKind::ChangingTimezones) => CardKind::Timeline,
            (_, _, SectionKind::Projects | SectionKind::Featured | SectionKind::MatchaZone) => {
                CardKind::MultiItem
            }
            (_, _, SectionKind::KnowledgeBites) => CardKind::List,
            (_, _, SectionKind::SpreadKindness) => CardKind::PlainText,
            // Unknown dropdown/dynamic sections were loaded as collections
            (View::Archive, Layout::Dropdown | Layout::Dynamic, SectionKind::Other) => {
                CardKind::MultiItem
            }
            _ => CardKind::Generic,
        }
    }

    fn css_name(self) -> &'static str {
        match self {
            CardKind::Profile => "profile",
            CardKind::Timeline => "timezone",
            CardKind::MultiItem => "media",
            CardKind::ProjectSelector => "project",
            CardKind::List => "list",
            CardKind::PlainText => "text",
            CardKind::Generic => "generic",
            CardKind::Resources => "resources",
        }
    }
}

/// A link shown under a card when the links map has a URL for `key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallToAction {
    pub key: &'static str,
    pub label: &'static str,
}

pub fn call_to_action(kind: SectionKind) -> Option<CallToAction> {
    let (key, label) = match kind {
        SectionKind::Champion => ("champion-instagram", "Follow on Instagram"),
        SectionKind::Editor => ("editor-instagram", "Connect with Editor"),
        SectionKind::MasterSpeaks => ("coffee-master-apply", "Become a Coffee Master"),
        SectionKind::MatchaZone => ("matcha-instagram", "Follow Matcha Zone"),
        _ => return None,
    };
    Some(CallToAction { key, label })
}

/// Measured image size, from the build-time image pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// Source path → measured size.
pub type ImageIndex = HashMap<String, ImageInfo>;

/// Where media URLs point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRoot {
    /// Media is copied into the output at its source path.
    Relative,
    /// Media stays on a remote site; URLs are `<base><path>`.
    Remote(String),
}

/// Everything a render function needs beyond the entry itself.
pub struct RenderContext<'a> {
    pub view: View,
    pub links: &'a LinksMap,
    pub images: &'a ImageIndex,
    pub media_root: &'a MediaRoot,
    /// Relative path from the current page to the site root (`""`, `"../"`).
    pub prefix: &'a str,
}

impl RenderContext<'_> {
    /// URL for a source path as seen from the current page.
    pub fn media_url(&self, path: &str) -> String {
        match self.media_root {
            MediaRoot::Relative => format!("{}{}", self.prefix, source::encode_path(path)),
            MediaRoot::Remote(base) => format!("{base}{}", source::encode_path(path)),
        }
    }

    fn call_to_action(&self, kind: SectionKind) -> Option<(String, &'static str)> {
        call_to_action(kind)
            .and_then(|cta| self.links.get(cta.key).map(|url| (url.clone(), cta.label)))
    }
}

/// Sized SVG placeholder as a data URI.
pub fn placeholder(width: u32, height: u32) -> String {
    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 {width} {height}'>\
         <rect width='{width}' height='{height}' fill='{PLACEHOLDER_FILL}'/></svg>"
    );
    let encoded = svg
        .replace('%', "%25")
        .replace('#', "%23")
        .replace('<', "%3C")
        .replace('>', "%3E");
    format!("data:image/svg+xml,{encoded}")
}

// ============================================================================
// Entry points
// ============================================================================

/// Render one section of one month.
///
/// Returns `None` for a malformed section, and in the archive for a section
/// with no content.
pub fn render_section(entry: &ContentEntry, ctx: &RenderContext) -> Option<Markup> {
    let section = &entry.section;
    let kind = SectionKind::from_id(&section.id);
    let content = entry.content();
    if content.is_none() && (ctx.view == View::Archive || !entry.is_absent()) {
        return None;
    }
    let card_kind = match content {
        Some(_) => CardKind::resolve(kind, section.layout, ctx.view),
        None => CardKind::Generic,
    };
    let month_label = (ctx.view == View::Archive).then(|| entry.month.label());
    let card = Card {
        section,
        kind,
        card_kind,
        month_label: month_label.as_deref(),
        folder: &entry.path,
        ctx,
    };

    let body = match (card_kind, content) {
        (CardKind::Profile, Some(SectionContent::Single { data, media })) => card.profile(data, media),
        (CardKind::Timeline, Some(SectionContent::Single { data, .. })) => {
            card.timeline(&timeline::extract_masters(data))
        }
        (CardKind::ProjectSelector, Some(SectionContent::Projects { projects })) => {
            card.project_selector(projects)
        }
        (CardKind::MultiItem | CardKind::ProjectSelector, Some(content)) => card.multi_item(content),
        (CardKind::List, Some(SectionContent::Single { data, media })) => card.list(data, media),
        (CardKind::PlainText, Some(SectionContent::Single { data, media })) => {
            card.plain_text(data, media)
        }
        (_, Some(SectionContent::Single { media, .. })) => card.generic(Some(media)),
        (_, Some(content)) => card.multi_item(content),
        (_, None) => card.generic(None),
    };

    let wrapper_class = match ctx.view {
        View::Archive => format!("archive-section archive-section--{}", section.id),
        View::Live => format!("section section-{} section--{}", section.id, section.layout.as_str()),
    };
    Some(html! {
        section class=(wrapper_class) data-section=(section.id) {
            (body)
        }
    })
}

/// Source paths of every image `render_section` would emit for `entry`.
pub fn referenced_images(entry: &ContentEntry) -> Vec<String> {
    let Some(content) = entry.content() else {
        return Vec::new();
    };
    let mut paths = content.image_paths(&entry.path);
    if SectionKind::from_id(&entry.section.id) != SectionKind::ChangingTimezones {
        return paths;
    }
    if let SectionContent::Single { data, .. } = content {
        for master in timeline::extract_masters(data) {
            for image in [&master.then_image, &master.now_image] {
                let path = source::join(&entry.path, image);
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }
    }
    paths
}

/// Visible error panel shown when nothing could be loaded.
pub fn error_panel(title: &str, message: &str) -> Markup {
    html! {
        div.error-message {
            h3 { (title) }
            p { (message) }
        }
    }
}

pub fn empty_results() -> Markup {
    html! {
        div.archive-empty {
            p { "No content found for the selected filters." }
        }
    }
}

/// Lazy `<img>`: sized placeholder in `src`, real URL in `data-src`.
fn lazy_image(ctx: &RenderContext, path: &str, alt: &str, extra_class: Option<&str>) -> Markup {
    let (width, height) = ctx
        .images
        .get(path)
        .map(|i| (i.width, i.height))
        .unwrap_or(DEFAULT_PLACEHOLDER);
    let class = match extra_class {
        Some(extra) => format!("card__image {extra} lazy-image"),
        None => "card__image lazy-image".to_string(),
    };
    html! {
        img class=(class)
            data-src=(ctx.media_url(path))
            alt=(alt)
            width=(width)
            height=(height)
            loading="lazy"
            src=(placeholder(width, height));
    }
}

// ============================================================================
// International items
// ============================================================================

/// One international item: cover, text and its downloadable resources.
/// `assets_dir` is the source path holding the file-type icons.
pub fn international_card(item: &InternationalItem, ctx: &RenderContext, assets_dir: &str) -> Markup {
    let class = format!(
        "card card--important card--{} international-card",
        CardKind::Resources.css_name()
    );
    html! {
        article class=(class) {
            @if let Some(image) = &item.image {
                (lazy_image(ctx, image, &item.title, None))
            }
            div.card__header {
                h3.card__title { (item.title) }
            }
            div.card__content {
                (format_text(&item.description))
                @if !item.resources.is_empty() {
                    div.card__files {
                        h4 { "Available Resources:" }
                        ul.card__file-list {
                            @for resource in &item.resources {
                                li {
                                    a.card__file-link href=(ctx.media_url(&resource.path)) download {
                                        img.card__file-icon
                                            src=(ctx.media_url(&source::join(assets_dir, resource.kind.icon())))
                                            alt=""
                                            aria-hidden="true";
                                        span { (resource.name) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// The international grid, or a notice when there is nothing to show.
pub fn international_section(items: &[InternationalItem], ctx: &RenderContext, assets_dir: &str) -> Markup {
    html! {
        @if items.is_empty() {
            div.no-content-message {
                p { "No international content available at this time." }
            }
        } @else {
            div.media-grid {
                @for item in items {
                    (international_card(item, ctx, assets_dir))
                }
            }
        }
    }
}

// ============================================================================
// Masters
// ============================================================================

/// Registry-wide numbers, then one row per district.
pub fn masters_stats(stats: &Statistics) -> Markup {
    let tiles = [
        ("Total Stores", stats.stores.to_string()),
        ("Total Masters", stats.tally.masters.to_string()),
        ("Certified", stats.tally.certified.to_string()),
        ("To Be Certified", stats.tally.to_be_certified.to_string()),
        ("Avg per Store", format!("{:.1}", stats.avg_per_store())),
        ("Certification Rate", format!("{:.0}%", stats.certification_rate())),
    ];
    html! {
        div.stats-grid {
            @for (label, value) in &tiles {
                div.stat-card {
                    span.stat-card__value { (value) }
                    span.stat-card__label { (label) }
                }
            }
        }
        @if !stats.per_district.is_empty() {
            table.district-stats {
                thead {
                    tr { th { "District" } th { "Stores" } th { "Masters" } th { "Certified" } th { "Avg per Store" } }
                }
                tbody {
                    @for district in &stats.per_district {
                        tr {
                            td { (district.name) @if !district.code.is_empty() { " (" (district.code) ")" } }
                            td { (district.stores) }
                            td { (district.tally.masters) }
                            td { (district.tally.certified) }
                            td { (format!("{:.1}", district.avg_per_store())) }
                        }
                    }
                }
            }
        }
    }
}

fn person_card(person: &Person, class: &str, fallback_role: &str) -> Markup {
    let role = if person.role.is_empty() { fallback_role } else { person.role.as_str() };
    html! {
        div class=(class) {
            div.person__avatar aria-hidden="true" { (masters::initials(&person.name)) }
            div.person__details {
                h4.person__name { (person.name) }
                p.person__role { (role) }
                @if person.is_certified {
                    span.cert-badge.cert-badge--certified { "Certified" }
                } @else {
                    span.cert-badge.cert-badge--pending { "Certification Pending" }
                }
                dl.person__dates {
                    dt { "Employed" }
                    dd { (masters::format_date(person.employment_date.as_deref())) }
                    dt { "Certified" }
                    dd { (masters::format_date(person.certification_date.as_deref())) }
                    dt { "Expires" }
                    dd { (masters::format_date(person.certification_expiry.as_deref())) }
                }
            }
        }
    }
}

/// Store header, its leader and its masters.
pub fn store_detail(store: &Store) -> Markup {
    html! {
        div.store-detail {
            div.store-header {
                h3.store-header__name { (store.name) }
                @if !store.code.is_empty() { p.store-header__code { (store.code) } }
                @if !store.address.is_empty() { p.store-header__address { (store.address) } }
            }
            (person_card(&store.store_leader, "person leader-card", "Store Leader"))
            h4.masters-heading { "Coffee Masters" }
            @if store.masters.is_empty() {
                p.no-masters { "No coffee masters registered yet." }
            } @else {
                div.masters-list {
                    @for master in &store.masters {
                        (person_card(master, "person master-card", "Coffee Master"))
                    }
                }
            }
        }
    }
}

// ============================================================================
// Card variants
// ============================================================================

struct Card<'a> {
    section: &'a SectionDescriptor,
    kind: SectionKind,
    card_kind: CardKind,
    month_label: Option<&'a str>,
    folder: &'a str,
    ctx: &'a RenderContext<'a>,
}

impl Card<'_> {
    fn class(&self) -> String {
        let mut class = format!(
            "card card--{} card--{}",
            self.section.theme,
            self.card_kind.css_name()
        );
        if self.month_label.is_some() {
            class.push_str(" card--archive");
        }
        class
    }

    fn header(&self, title: &str, subtitle: Option<&str>) -> Markup {
        html! {
            div.card__header {
                h3.card__title { (title) }
                @if let Some(label) = self.month_label {
                    span.card__date { (label) }
                }
                @if let Some(subtitle) = subtitle {
                    p.card__subtitle { (subtitle) }
                }
            }
        }
    }

    fn image(&self, path: &str, alt: &str, extra_class: Option<&str>) -> Markup {
        lazy_image(self.ctx, path, alt, extra_class)
    }

    fn primary_image(&self, folder: &str, media: &MediaBundle, alt: &str) -> Option<Markup> {
        media
            .primary_image()
            .map(|name| self.image(&source::join(folder, name), alt, None))
    }

    fn pdf_link(&self, folder: &str, media: &MediaBundle, label: &str) -> Option<Markup> {
        media.primary_pdf().map(|name| {
            html! {
                a.card__pdf-link href=(self.ctx.media_url(&source::join(folder, name)))
                    target="_blank" rel="noopener noreferrer" { "📄 " (label) }
            }
        })
    }

    fn cta(&self) -> Option<Markup> {
        self.ctx.call_to_action(self.kind).map(|(url, label)| {
            html! {
                a.card__link href=(url) target="_blank" rel="noopener noreferrer" { (label) }
            }
        })
    }

    /// Image beside text when there is an image, text alone otherwise.
    fn media_text(image: Option<Markup>, text: Markup) -> Markup {
        html! {
            @if let Some(image) = image {
                div.card__media-text-wrapper {
                    (image)
                    div.card__text { (text) }
                }
            } @else {
                div.card__text { (text) }
            }
        }
    }

    fn profile(&self, data: &Value, media: &MediaBundle) -> Markup {
        let name = text::field(data, "name");
        // Master speaks keeps the section title; the others prefer the payload's
        let title = match self.kind {
            SectionKind::MasterSpeaks => self.section.display_title().to_string(),
            _ => text::first_non_empty(&[&text::field(data, "title"), self.section.display_title()]),
        };
        let alt = text::first_non_empty(&[&name, &title]);
        let image = media
            .primary_image()
            .map(|img| self.image(&source::join(self.folder, img), &alt, Some("card__image--profile")));
        html! {
            article class=(self.class()) {
                (self.header(&title, (!name.is_empty()).then_some(name.as_str())))
                div.card__content.card__content--profile {
                    @if let Some(image) = image { (image) }
                    blockquote.card__quote {
                        (format_text(&text::field(data, "message")))
                    }
                    @if let Some(cta) = self.cta() { (cta) }
                }
            }
        }
    }

    fn timeline(&self, masters: &[TimelineEntry]) -> Markup {
        let base_title = self.section.display_title();
        html! {
            div.timezone-cards {
                @for master in masters {
                    article class=(self.class()) {
                        (self.header(&format!("{base_title}: {}", master.name), None))
                        div.card__content {
                            div.card__timeline {
                                div.card__timeline-item {
                                    (self.image(
                                        &source::join(self.folder, &master.then_image),
                                        &format!("{} - {}", master.name, master.then_label),
                                        None,
                                    ))
                                    h4.card__timeline-label { (master.then_label) }
                                    (format_text(&master.then_description))
                                }
                                div.card__timeline-item {
                                    (self.image(
                                        &source::join(self.folder, &master.now_image),
                                        &format!("{} - Now", master.name),
                                        None,
                                    ))
                                    h4.card__timeline-label { "Now" }
                                    (format_text(&master.now_description))
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn item_card(&self, title: &str, folder: &str, data: &Value, media: &MediaBundle, pdf_label: &str) -> Markup {
        let image = self.primary_image(folder, media, title);
        let text = html! {
            (format_text(&text::field(data, "description")))
            @if let Some(cta) = self.cta() { (cta) }
            @if let Some(pdf) = self.pdf_link(folder, media, pdf_label) { (pdf) }
        };
        html! {
            article class=(self.class()) {
                (self.header(title, None))
                div.card__content {
                    (Self::media_text(image, text))
                }
            }
        }
    }

    fn project_card(&self, index: usize, project: &SubItem) -> Markup {
        let title = project_title(index, project);
        let label = match self.ctx.view {
            View::Live => "View Project PDF",
            View::Archive => "View PDF",
        };
        self.item_card(&title, &project.path, &project.data, &project.media, label)
    }

    fn multi_item(&self, content: &SectionContent) -> Markup {
        match content {
            SectionContent::Single { data, media } => {
                let title =
                    text::first_non_empty(&[&text::field(data, "title"), self.section.display_title()]);
                self.item_card(&title, self.folder, data, media, "Read More")
            }
            SectionContent::Projects { projects } => html! {
                div.card-row {
                    @for (i, project) in projects.iter().enumerate() {
                        (self.project_card(i, project))
                    }
                }
            },
            SectionContent::Featured { items } => {
                let label = match self.ctx.view {
                    View::Live => "Learn More",
                    View::Archive => "Read More",
                };
                html! {
                    div.card-row {
                        @for item in items {
                            @let title = text::first_non_empty(&[&text::field(&item.data, "title"), &item.name]);
                            (self.item_card(&title, &item.path, &item.data, &item.media, label))
                        }
                    }
                }
            }
        }
    }

    /// Project list plus a details pane. The page script copies the chosen
    /// project's `<template>` into the pane.
    fn project_selector(&self, projects: &[SubItem]) -> Markup {
        let pane_id = format!("project-cards-{}", self.section.id);
        html! {
            div.projects-container {
                div.project-dropdown {
                    div.project-dropdown__header.open {
                        h3.project-dropdown__title { (self.section.display_title()) }
                        span.project-dropdown__icon { "▼" }
                    }
                    div.project-dropdown__list.open {
                        @for (i, project) in projects.iter().enumerate() {
                            button.project-item type="button"
                                data-project-id=(project.name)
                                data-target=(pane_id) {
                                span.project-item__icon { "📁" }
                                span.project-item__name { (project_title(i, project)) }
                            }
                        }
                    }
                }
                @for (i, project) in projects.iter().enumerate() {
                    template data-project=(project.name) {
                        (self.project_card(i, project))
                    }
                }
                div.project-cards-container id=(pane_id) {}
            }
        }
    }

    fn list(&self, data: &Value, media: &MediaBundle) -> Markup {
        let title = text::first_non_empty(&[&text::field(data, "title"), self.section.display_title()]);
        let bites: Vec<String> = data
            .get("bites")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|b| match b {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let image = self.primary_image(self.folder, media, self.section.display_title());
        let list = html! {
            ul.card__list {
                @for bite in &bites {
                    li { (bite) }
                }
            }
        };
        html! {
            article class=(self.class()) {
                (self.header(&title, None))
                div.card__content {
                    (Self::media_text(image, list))
                }
            }
        }
    }

    fn plain_text(&self, data: &Value, media: &MediaBundle) -> Markup {
        let title = text::first_non_empty(&[&text::field(data, "title"), self.section.display_title()]);
        let image = self.primary_image(self.folder, media, self.section.display_title());
        html! {
            article class=(self.class()) {
                (self.header(&title, None))
                div.card__content {
                    (Self::media_text(image, format_text(&text::field(data, "content"))))
                }
            }
        }
    }

    fn generic(&self, media: Option<&MediaBundle>) -> Markup {
        let title = self.section.display_title();
        let image = media.and_then(|m| self.primary_image(self.folder, m, title));
        let text = html! {
            (format_text(&self.section.description))
            @if let Some(pdf) = media.and_then(|m| self.pdf_link(self.folder, m, "View Document")) {
                (pdf)
            }
        };
        html! {
            article class=(self.class()) {
                (self.header(title, None))
                div.card__content {
                    (Self::media_text(image, text))
                }
            }
        }
    }
}

pub fn project_title(index: usize, project: &SubItem) -> String {
    let title = text::field(&project.data, "title");
    if title.is_empty() {
        format!("Project {}", index + 1)
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::international::{Resource, ResourceKind};
    use crate::loader::{self, SectionState};
    use crate::test_helpers::{MemorySource, count, descriptor, month, sample_site};
    use serde_json::json;

    fn render_with(entry: &ContentEntry, view: View, links: &LinksMap) -> String {
        let images = ImageIndex::new();
        let ctx = RenderContext {
            view,
            links,
            images: &images,
            media_root: &MediaRoot::Relative,
            prefix: "../",
        };
        render_section(entry, &ctx)
            .map(|m| m.into_string())
            .unwrap_or_default()
    }

    fn single(id: &str, layout: Layout, data: Value, media: MediaBundle) -> ContentEntry {
        ContentEntry {
            month: month("03.2025"),
            section: descriptor(id, layout),
            path: format!("media/03.2025/{id}"),
            state: SectionState::Loaded {
                content: SectionContent::Single { data, media },
            },
        }
    }

    fn media_with_image(name: &str) -> MediaBundle {
        MediaBundle {
            json: vec!["text.json".into()],
            images: vec![name.into()],
            pdfs: vec![],
        }
    }

    // =========================================================================
    // Kind resolution
    // =========================================================================

    #[test]
    fn resolve_by_id_in_archive() {
        use SectionKind::*;
        let r = |k| CardKind::resolve(k, Layout::Column, View::Archive);
        assert_eq!(r(Champion), CardKind::Profile);
        assert_eq!(r(MasterSpeaks), CardKind::Profile);
        assert_eq!(r(ChangingTimezones), CardKind::Timeline);
        assert_eq!(r(MatchaZone), CardKind::MultiItem);
        assert_eq!(r(KnowledgeBites), CardKind::List);
        assert_eq!(r(SpreadKindness), CardKind::PlainText);
        assert_eq!(r(Certifications), CardKind::Generic);
        assert_eq!(r(Other), CardKind::Generic);
    }

    #[test]
    fn resolve_live_uses_layout() {
        assert_eq!(
            CardKind::resolve(SectionKind::Projects, Layout::Dropdown, View::Live),
            CardKind::ProjectSelector
        );
        assert_eq!(
            CardKind::resolve(SectionKind::Other, Layout::Dynamic, View::Live),
            CardKind::MultiItem
        );
        assert_eq!(
            CardKind::resolve(SectionKind::Projects, Layout::Dropdown, View::Archive),
            CardKind::MultiItem
        );
    }

    // =========================================================================
    // Variants
    // =========================================================================

    #[test]
    fn profile_with_link_and_image() {
        let mut links = LinksMap::new();
        links.insert("champion-instagram".into(), "https://insta/champ".into());
        let entry = single(
            "champion",
            Layout::Column,
            json!({"name": "Ana", "message": "Hi\n\nthere"}),
            media_with_image("champion.png"),
        );
        let html = render_with(&entry, View::Live, &links);
        assert!(html.contains("Follow on Instagram"));
        assert!(html.contains(r#"href="https://insta/champ""#));
        assert!(html.contains(r#"data-src="../media/03.2025/champion/champion.png""#));
        assert!(html.contains("card__image--profile"));
        assert!(html.contains("<p>Hi</p><p>there</p>"));
    }

    #[test]
    fn profile_without_link_has_no_cta() {
        let entry = single("editor", Layout::Column, json!({"name": "Eve"}), MediaBundle::default());
        let html = render_with(&entry, View::Live, &LinksMap::new());
        assert!(!html.contains("card__link"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn archive_card_carries_month_label() {
        let entry = single("editor", Layout::Column, json!({"name": "Eve"}), MediaBundle::default());
        let html = render_with(&entry, View::Archive, &LinksMap::new());
        assert!(html.contains(r#"<span class="card__date">March 2025</span>"#));
        assert!(html.contains("archive-section--editor"));
    }

    #[test]
    fn payload_text_is_escaped() {
        let entry = single(
            "spread-kindness",
            Layout::Column,
            json!({"content": "<script>alert(1)</script>"}),
            MediaBundle::default(),
        );
        let html = render_with(&entry, View::Archive, &LinksMap::new());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn knowledge_bites_are_escaped_list_items() {
        let entry = single(
            "knowledge-bites",
            Layout::Column,
            json!({"bites": ["Arabica <3", 42, {"x": 1}]}),
            MediaBundle::default(),
        );
        let html = render_with(&entry, View::Archive, &LinksMap::new());
        assert!(html.contains("<li>Arabica &lt;3</li>"));
        assert!(html.contains("<li>42</li>"));
        assert_eq!(count(&html, "<li>"), 2);
    }

    #[test]
    fn timeline_renders_card_per_master() {
        let entry = single(
            "changing-timezones",
            Layout::Row,
            json!({"master-1": "Ben", "master-1-then": "2016", "master-2": "Cleo"}),
            MediaBundle::default(),
        );
        let html = render_with(&entry, View::Live, &LinksMap::new());
        assert_eq!(count(&html, "card__timeline\""), 2);
        assert!(html.contains("Title changing-timezones: Ben"));
        assert!(html.contains("master-2-now.png"));
        assert!(html.contains("Ben - 2016"));
    }

    #[test]
    fn matcha_zone_read_more_and_cta() {
        let mut links = LinksMap::new();
        links.insert("matcha-instagram".into(), "https://insta/matcha".into());
        let media = MediaBundle {
            json: vec!["text.json".into()],
            images: vec![],
            pdfs: vec!["project.pdf".into()],
        };
        let entry = single("matcha-zone", Layout::Column, json!({"title": "Matcha"}), media);
        let html = render_with(&entry, View::Archive, &links);
        assert!(html.contains("Follow Matcha Zone"));
        assert!(html.contains("Read More"));
        assert!(html.contains("media/03.2025/matcha-zone/project.pdf"));
    }

    #[test]
    fn generic_uses_description() {
        let entry = single("recipes", Layout::Column, json!({}), MediaBundle::default());
        let html = render_with(&entry, View::Archive, &LinksMap::new());
        assert!(html.contains("Title recipes"));
        assert!(html.contains("<p>About recipes</p>"));
    }

    #[test]
    fn placeholder_is_sized_svg() {
        let uri = placeholder(800, 600);
        assert!(uri.starts_with("data:image/svg+xml,"));
        assert!(uri.contains("viewBox='0 0 800 600'"));
        assert!(uri.contains("%23f0f0f0"));
        assert!(!uri.contains('<'));
    }

    #[test]
    fn measured_images_get_their_size() {
        let entry = single("champion", Layout::Column, json!({}), media_with_image("champion.png"));
        let mut images = ImageIndex::new();
        images.insert(
            "media/03.2025/champion/champion.png".into(),
            ImageInfo { width: 640, height: 480 },
        );
        let links = LinksMap::new();
        let ctx = RenderContext {
            view: View::Live,
            links: &links,
            images: &images,
            media_root: &MediaRoot::Relative,
            prefix: "",
        };
        let html = render_section(&entry, &ctx).unwrap().into_string();
        assert!(html.contains(r#"width="640""#));
        assert!(html.contains("0 0 640 480"));
    }

    #[test]
    fn remote_media_root_uses_absolute_urls() {
        let entry = single("champion", Layout::Column, json!({}), media_with_image("champion.png"));
        let images = ImageIndex::new();
        let links = LinksMap::new();
        let root = MediaRoot::Remote("https://cdn.example.com/".into());
        let ctx = RenderContext {
            view: View::Live,
            links: &links,
            images: &images,
            media_root: &root,
            prefix: "../",
        };
        let html = render_section(&entry, &ctx).unwrap().into_string();
        assert!(html.contains(r#"data-src="https://cdn.example.com/media/03.2025/champion/champion.png""#));
    }

    #[test]
    fn spaces_in_paths_are_encoded() {
        let mut entry = single(
            "knowledge-bites",
            Layout::Column,
            json!({"bites": []}),
            media_with_image("picture.png"),
        );
        entry.path = "media/03.2025/knowledge bites".into();
        let html = render_with(&entry, View::Live, &LinksMap::new());
        assert!(html.contains("knowledge%20bites/picture.png"));
    }

    #[test]
    fn reserved_characters_in_folders_are_encoded() {
        let mut entry = single(
            "knowledge-bites",
            Layout::Column,
            json!({"bites": []}),
            media_with_image("picture.png"),
        );
        entry.path = "media/03.2025/50% off #1?".into();
        let html = render_with(&entry, View::Live, &LinksMap::new());
        assert!(html.contains("media/03.2025/50%25%20off%20%231%3F/picture.png"));
        assert!(!html.contains("#1?/picture.png"));
    }

    // =========================================================================
    // Absent and malformed entries
    // =========================================================================

    #[test]
    fn absent_section_is_generic_in_live_and_hidden_in_archive() {
        let entry = ContentEntry {
            month: month("03.2025"),
            section: descriptor("champion", Layout::Column),
            path: "media/03.2025/champion".into(),
            state: SectionState::Absent,
        };
        let live = render_with(&entry, View::Live, &LinksMap::new());
        assert!(live.contains("card--generic"));
        assert!(live.contains("About champion"));
        assert!(render_with(&entry, View::Archive, &LinksMap::new()).is_empty());
    }

    #[test]
    fn malformed_section_is_hidden_in_both_views() {
        let entry = ContentEntry {
            month: month("03.2025"),
            section: descriptor("editor", Layout::Column),
            path: "media/03.2025/editor".into(),
            state: SectionState::Malformed,
        };
        assert!(render_with(&entry, View::Live, &LinksMap::new()).is_empty());
        assert!(render_with(&entry, View::Archive, &LinksMap::new()).is_empty());
    }

    // =========================================================================
    // Collections
    // =========================================================================

    fn sample_entries() -> Vec<ContentEntry> {
        let source = sample_site();
        let m = month("03.2025");
        let sections = crate::manifest::load_manifest(&source, "media", m);
        loader::load_month(&source, "media", m, &sections)
    }

    #[test]
    fn projects_archive_cards_with_view_pdf() {
        let entries = sample_entries();
        let entry = crate::test_helpers::find_entry(&entries, "03.2025", "projects");
        let html = render_with(entry, View::Archive, &LinksMap::new());
        assert_eq!(count(&html, "<article"), 2);
        assert!(html.contains("Cold Brew Lab"));
        assert!(html.contains("View PDF"));
        assert!(!html.contains("View Project PDF"));
    }

    #[test]
    fn projects_live_cards_say_view_project_pdf() {
        let entries = sample_entries();
        let entry = crate::test_helpers::find_entry(&entries, "03.2025", "projects");
        let mut section = entry.clone();
        section.section.layout = Layout::Dynamic;
        let html = render_with(&section, View::Live, &LinksMap::new());
        assert!(html.contains("View Project PDF"));
    }

    #[test]
    fn projects_live_selector_with_templates() {
        let entries = sample_entries();
        let entry = crate::test_helpers::find_entry(&entries, "03.2025", "projects");
        let html = render_with(entry, View::Live, &LinksMap::new());
        assert_eq!(count(&html, "<template"), 2);
        assert_eq!(count(&html, "project-item\""), 2);
        assert!(html.contains(r#"id="project-cards-projects""#));
        assert!(html.contains(r#"data-project-id="project-1""#));
    }

    #[test]
    fn featured_items_read_more() {
        let entries = sample_entries();
        let entry = crate::test_helpers::find_entry(&entries, "03.2025", "featured");
        let html = render_with(entry, View::Live, &LinksMap::new());
        assert!(html.contains("New Menu"));
        assert!(html.contains("featured/launch/picture.png"));
    }

    #[test]
    fn featured_pdf_label_depends_on_view() {
        let item = SubItem {
            name: "launch".into(),
            path: "media/03.2025/featured/launch".into(),
            data: json!({"title": "New Menu"}),
            media: MediaBundle {
                json: vec!["text.json".into()],
                images: vec![],
                pdfs: vec!["menu.pdf".into()],
            },
        };
        let entry = ContentEntry {
            month: month("03.2025"),
            section: descriptor("featured", Layout::Dynamic),
            path: "media/03.2025/featured".into(),
            state: SectionState::Loaded {
                content: SectionContent::Featured { items: vec![item] },
            },
        };
        assert!(render_with(&entry, View::Live, &LinksMap::new()).contains("Learn More"));
        let archive = render_with(&entry, View::Archive, &LinksMap::new());
        assert!(archive.contains("Read More"));
        assert!(!archive.contains("Learn More"));
    }

    #[test]
    fn project_title_falls_back_to_number() {
        let item = SubItem {
            name: "project-3".into(),
            path: "p".into(),
            data: json!({}),
            media: MediaBundle::default(),
        };
        assert_eq!(project_title(2, &item), "Project 3");
    }

    #[test]
    fn referenced_images_include_timeline_images() {
        let source = MemorySource::new().with(
            "m/tz/text.json",
            r#"{"master-1":"Ben"}"#,
        );
        let section = descriptor("changing-timezones", Layout::Row);
        let content = loader::load_section_content(&source, &section, "m/tz").unwrap();
        let entry = ContentEntry {
            month: month("03.2025"),
            section,
            path: "m/tz".into(),
            state: SectionState::Loaded { content },
        };
        assert_eq!(
            referenced_images(&entry),
            vec!["m/tz/master-1-then.png", "m/tz/master-1-now.png"]
        );
    }

    // =========================================================================
    // International
    // =========================================================================

    fn international_item(resources: Vec<Resource>) -> InternationalItem {
        InternationalItem {
            folder: "expo".into(),
            path: "media/international/expo".into(),
            title: "Expo <2025>".into(),
            description: "Booth & talks".into(),
            image: Some("media/international/expo/cover.png".into()),
            resources,
        }
    }

    fn render_international(items: &[InternationalItem]) -> String {
        let images = ImageIndex::new();
        let links = LinksMap::new();
        let ctx = RenderContext {
            view: View::Live,
            links: &links,
            images: &images,
            media_root: &MediaRoot::Relative,
            prefix: "../",
        };
        international_section(items, &ctx, "assets").into_string()
    }

    #[test]
    fn international_card_lists_resources_with_icons() {
        let html = render_international(&[international_item(vec![Resource {
            name: "expo deck.pptx".into(),
            path: "media/international/expo/expo deck.pptx".into(),
            kind: ResourceKind::Pptx,
        }])]);
        assert!(html.contains("card--resources international-card"));
        assert!(html.contains("Expo &lt;2025&gt;"));
        assert!(html.contains("Booth &amp; talks"));
        assert!(html.contains(r#"data-src="../media/international/expo/cover.png""#));
        assert!(html.contains("Available Resources:"));
        assert!(html.contains(r#"href="../media/international/expo/expo%20deck.pptx" download"#));
        assert!(html.contains(r#"src="../assets/icons/file-ppt.svg""#));
    }

    #[test]
    fn international_card_without_resources_has_no_file_list() {
        let html = render_international(&[international_item(vec![])]);
        assert!(!html.contains("Available Resources:"));
        assert_eq!(count(&html, "international-card"), 1);
    }

    #[test]
    fn no_international_items_shows_notice() {
        let html = render_international(&[]);
        assert!(html.contains("No international content available at this time."));
        assert!(!html.contains("media-grid"));
    }
}
