//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is a content inventory: every entity (work, category, route) is
//! shown by its identity (positional index + title or path), with supporting
//! facts on indented lines underneath. Diagnostics go through `tracing` on
//! stderr; this module only produces what the user asked to see.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! Works
//! 001 Kaiwa
//!     Period: 2021.4 - present
//!     Category: web-app
//!     Tags: vue, python
//!     Pick up
//!
//! Categories
//! 001 Web Application (web-app)
//!
//! Tags
//! 001 Vue.js (vue)
//!
//! Fetched 3 works, 2 categories, 3 tags, 2 histories, 2 skills, 1 certification
//! Snapshot 3f2a9c01be77
//! ```
//!
//! ## Resolve
//!
//! ```text
//! 001 / (home)
//! 002 /about (about)
//! 003 /works (works)
//! 004 /works/detail/kaiwa (work)
//!
//! Resolved 4 routes
//! Routes 91c0de55aa12 from snapshot 3f2a9c01be77
//! ```
//!
//! ## Generate
//!
//! ```text
//! 001 / → index.html
//! 002 /about → about/index.html
//!
//! Generated 2 pages, 3 assets
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::generate::GenerateReport;
use crate::manifest;
use crate::resolve::RouteSet;
use crate::shaping;
use crate::types::Snapshot;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 work`, `2 works`.
fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    }
}

/// Entries with index and slug: `001 Web Application (web-app)`.
fn slugged_list<'a>(
    heading: &str,
    entries: impl Iterator<Item = (&'a str, &'a str)>,
    lines: &mut Vec<String>,
) {
    lines.push(heading.to_string());
    for (i, (name, slug)) in entries.enumerate() {
        lines.push(format!("{} {} ({})", format_index(i + 1), name, slug));
    }
    lines.push(String::new());
}

// ============================================================================
// Fetch
// ============================================================================

pub fn format_fetch_output(snapshot: &Snapshot) -> Vec<String> {
    let mut lines = vec!["Works".to_string()];
    for (i, work) in snapshot.works.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), work.title));
        lines.push(format!(
            "{}Period: {}",
            indent(1),
            shaping::work_period(work)
        ));
        lines.push(format!("{}Category: {}", indent(1), work.category.slug));
        if !work.tags.is_empty() {
            let tags: Vec<&str> = work.tags.iter().map(|t| t.slug.as_str()).collect();
            lines.push(format!("{}Tags: {}", indent(1), tags.join(", ")));
        }
        if let Some(first) = work.short_description.lines().next() {
            lines.push(format!("{}{}", indent(1), truncate_desc(first, 40)));
        }
        if work.pick_up {
            lines.push(format!("{}Pick up", indent(1)));
        }
    }
    lines.push(String::new());

    slugged_list(
        "Categories",
        snapshot
            .categories
            .iter()
            .map(|c| (c.name.as_str(), c.slug.as_str())),
        &mut lines,
    );
    slugged_list(
        "Tags",
        snapshot
            .tags
            .iter()
            .map(|t| (t.name.as_str(), t.slug.as_str())),
        &mut lines,
    );

    if let Some(profile) = &snapshot.profile {
        lines.push("Profile".to_string());
        lines.push(format!("{}{}", indent(1), profile.name));
        lines.push(String::new());
    }

    lines.push(format!(
        "Fetched {}, {}, {}, {}, {}, {}",
        plural(snapshot.works.len(), "work", "works"),
        plural(snapshot.categories.len(), "category", "categories"),
        plural(snapshot.tags.len(), "tag", "tags"),
        plural(snapshot.histories.len(), "history", "histories"),
        plural(snapshot.skills.len(), "skill", "skills"),
        plural(
            snapshot.certifications.len(),
            "certification",
            "certifications"
        ),
    ));
    lines.push(format!(
        "Snapshot {}",
        manifest::short(&manifest::fingerprint(snapshot))
    ));
    lines
}

pub fn print_fetch_output(snapshot: &Snapshot) {
    for line in format_fetch_output(snapshot) {
        println!("{}", line);
    }
}

// ============================================================================
// Resolve
// ============================================================================

pub fn format_resolve_output(routes: &RouteSet) -> Vec<String> {
    let mut lines: Vec<String> = routes
        .routes
        .iter()
        .enumerate()
        .map(|(i, route)| {
            format!(
                "{} {} ({})",
                format_index(i + 1),
                route.path,
                route.context.kind()
            )
        })
        .collect();
    lines.push(String::new());
    lines.push(format!("Resolved {}", plural(routes.len(), "route", "routes")));
    lines.push(format!(
        "Routes {} from snapshot {}",
        manifest::short(&routes.fingerprint),
        manifest::short(&routes.source)
    ));
    lines
}

pub fn print_resolve_output(routes: &RouteSet) {
    for line in format_resolve_output(routes) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate
// ============================================================================

pub fn format_generate_output(report: &GenerateReport, output_dir: &Path) -> Vec<String> {
    let mut lines: Vec<String> = report
        .pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let file = page.file.strip_prefix(output_dir).unwrap_or(&page.file);
            format!("{} {} → {}", format_index(i + 1), page.path, file.display())
        })
        .collect();
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}",
        plural(report.pages.len(), "page", "pages"),
        plural(report.assets, "asset", "assets")
    ));
    if report.pruned > 0 {
        lines.push(format!(
            "Removed {}",
            plural(report.pruned, "stale page", "stale pages")
        ));
    }
    lines
}

pub fn print_generate_output(report: &GenerateReport, output_dir: &Path) {
    for line in format_generate_output(report, output_dir) {
        println!("{}", line);
    }
    println!("Site generated at {}", output_dir.display());
}
