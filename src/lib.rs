//! # Almanac
//!
//! A static renderer for month-dated content folders. Each month is a folder
//! (`media/03.2025/`) with a `sections.json` manifest and one sub-folder per
//! section holding hand-written JSON, images and PDFs. Almanac turns the
//! folders into themed cards: a live view of each month and a filterable
//! archive across all of them. Two undated pages sit beside them: the
//! international items and the coffee-master registry.
//!
//! # Pipeline
//!
//! ```text
//! 1. Discover   trailing window of months  →  months with a sections.json
//! 2. Load       manifest + section folders →  content cache
//! 3. Measure    referenced images          →  sizes, broken-image report
//! 4. Render     cache                      →  live and archive pages
//! ```
//!
//! Content comes from a [`source::ContentSource`]: a local directory or a
//! remote site probed over HTTP. Nothing about a folder's contents is listed;
//! every file is found by probing a fixed set of candidate names.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`month`] | `MM.YYYY` tokens: parsing, ordering, labels, trailing windows |
//! | [`source`] | Local and HTTP content sources |
//! | [`manifest`] | Month discovery, `sections.json` parsing, the links map |
//! | [`probe`] | Section kinds, expected files and media detection |
//! | [`loader`] | Section content loading: single payloads, projects, featured items |
//! | [`timeline`] | `master-N` extraction for the then/now cards |
//! | [`international`] | Undated international items: folder list, cover and resource probing |
//! | [`masters`] | Coffee-master registry: districts, stores, certification statistics |
//! | [`text`] | HTML escaping and paragraph formatting |
//! | [`render`] | Card rendering for both views |
//! | [`lazy`] | Visibility-triggered load scheduler |
//! | [`controller`] | Content cache, archive filters, live month, international and masters pages, page sinks |
//! | [`generate`] | Whole-site build |
//! | [`scaffold`] | `setup-month` folder scaffolding |
//! | [`validate`] | JSON validation of a month folder |
//! | [`config`] | `almanac.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Absence Is Normal
//!
//! Most months leave most optional files out. A missing file is never an error
//! and never logged above `debug`. A file that exists but does not parse is
//! logged as a warning and only its own section drops out.
//!
//! ## One Render Path, Two Views
//!
//! Card kinds are chosen by section id and layout, then rendered by the same
//! functions for the live and archive views. The archive adds a month label
//! and skips sections with no content.
//!
//! ## Pages Per Filter
//!
//! The output is static. Every archive filter combination is its own page and
//! the selectors navigate between them, so the site works from any file
//! server.

pub mod config;
pub mod controller;
pub mod generate;
pub mod international;
pub mod lazy;
pub mod loader;
pub mod manifest;
pub mod masters;
pub mod month;
pub mod output;
pub mod probe;
pub mod render;
pub mod scaffold;
pub mod source;
pub mod text;
pub mod timeline;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
