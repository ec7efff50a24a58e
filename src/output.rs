//! CLI output formatting for every command.
//!
//! Output is information-first: each month or section leads with its
//! positional index and title, with source paths and states shown as indented
//! context lines.
//!
//! # Output Format
//!
//! ## Discover
//!
//! ```text
//! Months
//! 001 March 2025 (03.2025)
//! 002 January 2025 (01.2025)
//! ```
//!
//! ## Check
//!
//! ```text
//! March 2025 (03.2025)
//!     001 Coffee Champion [champion] loaded
//!         Source: media/03.2025/champion
//!         Payload: champion.json
//!         Images: champion.png
//!     002 From the Editor [editor] malformed
//!         Source: media/03.2025/editor
//! ```
//!
//! ## Build
//!
//! ```text
//! Months: 03.2025, 01.2025
//! Sections: 7 loaded, 1 absent, 1 malformed
//! Images: 4 checked, 1 broken
//!     Broken: media/03.2025/changing-timezones/master-1-now.png
//! Generated 28 pages, copied 4 media files → dist
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::controller::ContentCache;
use crate::generate::BuildReport;
use crate::loader::{ContentEntry, SectionContent, SectionState};
use crate::month::MonthToken;
use crate::scaffold::ScaffoldReport;
use crate::validate::ValidationReport;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn month_header(month: MonthToken) -> String {
    format!("{} ({})", month.label(), month)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Discover
// ============================================================================

pub fn format_discover_output(months: &[MonthToken], today: MonthToken, window: u32) -> Vec<String> {
    if months.is_empty() {
        return vec![format!(
            "No months found in the {window} months up to {}",
            today.label()
        )];
    }
    let mut lines = vec!["Months".to_string()];
    for (i, month) in months.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), month_header(*month)));
    }
    lines
}

pub fn print_discover_output(months: &[MonthToken], today: MonthToken, window: u32) {
    print_lines(format_discover_output(months, today, window));
}

// ============================================================================
// Check
// ============================================================================

fn state_label(state: &SectionState) -> &'static str {
    match state {
        SectionState::Loaded { .. } => "loaded",
        SectionState::Absent => "absent",
        SectionState::Malformed => "malformed",
    }
}

fn entry_lines(index: usize, entry: &ContentEntry) -> Vec<String> {
    let section = &entry.section;
    let mut lines = vec![format!(
        "{}{} {} [{}] {}",
        indent(1),
        format_index(index),
        section.display_title(),
        section.id,
        state_label(&entry.state)
    )];
    let ctx = indent(2);
    lines.push(format!("{ctx}Source: {}", entry.path));

    match entry.content() {
        Some(SectionContent::Single { media, .. }) => {
            if let Some(json) = media.primary_json() {
                lines.push(format!("{ctx}Payload: {json}"));
            }
            if !media.images.is_empty() {
                lines.push(format!("{ctx}Images: {}", media.images.join(", ")));
            }
            if !media.pdfs.is_empty() {
                lines.push(format!("{ctx}PDFs: {}", media.pdfs.join(", ")));
            }
        }
        Some(SectionContent::Projects { projects }) => {
            lines.push(format!("{ctx}Projects: {}", projects.len()));
            for (i, project) in projects.iter().enumerate() {
                lines.push(format!("{ctx}{}{}", indent(1), crate::render::project_title(i, project)));
            }
        }
        Some(SectionContent::Featured { items }) => {
            lines.push(format!("{ctx}Featured items: {}", items.len()));
            for item in items {
                lines.push(format!("{ctx}{}{}", indent(1), item.name));
            }
        }
        None => {}
    }
    lines
}

/// Everything the cache holds, month by month.
pub fn format_check_output(cache: &ContentCache) -> Vec<String> {
    if cache.months.is_empty() {
        return vec!["No months found".to_string()];
    }
    let mut lines = Vec::new();
    for (m, &month) in cache.months.iter().enumerate() {
        if m > 0 {
            lines.push(String::new());
        }
        lines.push(month_header(month));
        let entries: Vec<&ContentEntry> = cache.month_entries(month).collect();
        if entries.is_empty() {
            lines.push(format!("{}(no sections)", indent(1)));
        }
        for (i, entry) in entries.into_iter().enumerate() {
            lines.extend(entry_lines(i + 1, entry));
        }
    }
    lines
}

pub fn print_check_output(cache: &ContentCache) {
    print_lines(format_check_output(cache));
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(report: &BuildReport, output_dir: &Path) -> Vec<String> {
    let months = if report.months.is_empty() {
        "none".to_string()
    } else {
        report
            .months
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut lines = vec![
        format!("Months: {months}"),
        format!(
            "Sections: {} loaded, {} absent, {} malformed",
            report.loaded, report.absent, report.malformed
        ),
        format!(
            "Images: {} checked, {} broken",
            report.images_checked,
            report.broken_images.len()
        ),
    ];
    for path in &report.broken_images {
        lines.push(format!("{}Broken: {path}", indent(1)));
    }
    lines.push(match report.international {
        Some(n) => format!("International: {n} item(s)"),
        None => "International: unavailable".to_string(),
    });
    lines.push(match report.masters_stores {
        Some(n) => format!("Masters: {n} store(s)"),
        None => "Masters: unavailable".to_string(),
    });
    lines.push(format!(
        "Generated {} pages, copied {} media files \u{2192} {}",
        report.pages,
        report.media_files,
        output_dir.display()
    ));
    lines
}

pub fn print_build_output(report: &BuildReport, output_dir: &Path) {
    print_lines(format_build_output(report, output_dir));
}

// ============================================================================
// Setup
// ============================================================================

pub fn format_setup_output(report: &ScaffoldReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Month {} \u{2192} {}",
        report.month,
        report.month_dir.display()
    )];
    if report.month_dir_existed {
        lines.push(format!("{}Folder already exists", indent(1)));
    }
    lines.push(format!(
        "{}sections.json: {}",
        indent(1),
        if report.manifest_written { "written" } else { "kept existing" }
    ));
    for path in &report.created {
        lines.push(format!("{}Created: {path}", indent(1)));
    }
    lines
}

pub fn print_setup_output(report: &ScaffoldReport) {
    print_lines(format_setup_output(report));
}

// ============================================================================
// Validate
// ============================================================================

pub fn format_validate_output(report: &ValidationReport) -> Vec<String> {
    let mut lines = vec![format!("Validating {}", month_header(report.month))];
    for file in &report.files {
        match &file.error {
            None => lines.push(format!("{}ok    {}", indent(1), file.path)),
            Some(e) => {
                lines.push(format!("{}FAIL  {}", indent(1), file.path));
                lines.push(format!("{}Error: {e}", indent(2)));
            }
        }
    }
    lines.push(String::new());
    lines.push(format!("Total JSON files: {}", report.total()));
    lines.push(format!("Valid files: {}", report.valid()));
    lines.push(format!("Invalid files: {}", report.total() - report.valid()));
    if report.is_ok() {
        lines.push("All JSON files are valid".to_string());
    }
    lines
}

pub fn print_validate_output(report: &ValidationReport) {
    print_lines(format_validate_output(report));
}

// ============================================================================
// Tests
// ============================================================================
