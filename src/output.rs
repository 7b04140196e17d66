//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every entity (category, product, route) is its semantic identity
//! (positional index and title, or the route) with filesystem paths shown
//! as secondary context via indented `Source:` lines.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Categories
//! 001 Seed Lasers (2 products)
//!     Source: Seed-Lasers/
//!     001 1 5um Seed
//!         Source: 1.5um-seed
//!     002 NLS-1550 Narrow Linewidth Seed
//!         Source: narrow-linewidth-seed/
//! ```
//!
//! ## Product
//!
//! ```text
//! seed-lasers/1-5um-seed → Seed 1.5
//!     Source: Seed-Lasers/1.5um-seed.ts
//! ```
//!
//! ```text
//! testing-systems/noise-analyzer not found
//!     Rejected: Testing-Systems/noise-analyzer.ts
//!         module: `createProduct` comes from module `../../factory`, which cannot be loaded
//!         literal: no `export default {` or exported object literal
//!         stripped: `createProduct` is not defined
//! ```
//!
//! ## Build / Check
//!
//! ```text
//! 001 seed-lasers/1-5um-seed → products/seed-lasers/1-5um-seed/index.json
//! 002 testing-systems/linewidth-analyzer → ... (folder fallback)
//!
//! Missing
//! 001 testing-systems/noise-analyzer
//!     Rejected: ...
//!
//! Generated 7 products, 2 missing
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::export::ProductsIndex;
use crate::generate::{BuildReport, GeneratedRoute};
use crate::resolve::{CandidateFailure, Resolution, ResolveError};
use crate::types::{Category, ProductPath};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `base` when possible, for shorter source lines.
fn display_path(path: &Path, base: Option<&Path>) -> String {
    base.and_then(|b| path.strip_prefix(b).ok())
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, word: &str) -> String {
    match (n, word.strip_suffix('y')) {
        (1, _) => format!("{n} {word}"),
        (_, Some(stem)) => format!("{n} {stem}ies"),
        _ => format!("{n} {word}s"),
    }
}

/// Rejected candidates with one line per reason (one per tier for
/// extraction failures).
fn failure_lines(failures: &[CandidateFailure], base: Option<&Path>, depth: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for failure in failures {
        lines.push(format!(
            "{}Rejected: {}",
            indent(depth),
            display_path(&failure.path, base)
        ));
        match &failure.error {
            ResolveError::Extract(extract) => {
                for tier in &extract.failures {
                    lines.push(format!("{}{}: {}", indent(depth + 1), tier.tier, tier.error));
                }
            }
            other => lines.push(format!("{}{}", indent(depth + 1), other)),
        }
    }
    lines
}

// ============================================================================
// Scan
// ============================================================================

/// Format the category tree.
pub fn format_catalog_output(categories: &[Category], root: Option<&Path>) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(root) = root else {
        lines.push("No products directory found".to_string());
        return lines;
    };

    lines.push("Categories".to_string());
    if categories.is_empty() {
        lines.push(format!("{}(none in {})", indent(1), root.display()));
    }
    for (i, category) in categories.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            category.category_title,
            plural(category.products.len(), "product")
        ));
        lines.push(format!("{}Source: {}/", indent(1), category.dir_name));
        for (j, product) in category.products.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), format_index(j + 1), product.title));
            let is_dir = root.join(&category.dir_name).join(&product.source).is_dir();
            let suffix = if is_dir { "/" } else { "" };
            lines.push(format!("{}Source: {}{}", indent(2), product.source, suffix));
        }
    }
    lines
}

/// Print the category tree to stdout.
pub fn print_catalog_output(categories: &[Category], root: Option<&Path>) {
    for line in format_catalog_output(categories, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Product
// ============================================================================

/// Format the outcome of resolving one route.
pub fn format_resolution(path: &ProductPath, resolution: &Resolution, root: Option<&Path>) -> Vec<String> {
    let mut lines = Vec::new();
    match (&resolution.product, &resolution.source) {
        (Some(product), Some(source)) => {
            lines.push(format!("{} → {}", path, product.title));
            let fallback = if resolution.folder_fallback {
                " (folder fallback)"
            } else {
                ""
            };
            lines.push(format!(
                "{}Source: {}{}",
                indent(1),
                display_path(source, root),
                fallback
            ));
            for shadowed in &resolution.shadowed {
                lines.push(format!("{}Shadowed: {}", indent(1), display_path(shadowed, root)));
            }
        }
        _ => lines.push(format!("{} not found", path)),
    }
    lines.extend(failure_lines(&resolution.failures, root, 1));
    lines
}

/// Print a resolution to stderr, keeping stdout free for the product JSON.
pub fn print_resolution(path: &ProductPath, resolution: &Resolution, root: Option<&Path>) {
    for line in format_resolution(path, resolution, root) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Build / Check
// ============================================================================

fn generated_line(index: usize, route: &GeneratedRoute, dist: Option<&Path>) -> String {
    let target = match &route.output {
        Some(output) => format!(" → {}", display_path(output, dist)),
        None => String::new(),
    };
    let fallback = if route.folder_fallback {
        " (folder fallback)"
    } else {
        ""
    };
    format!("{} {}{}{}", format_index(index), route.path, target, fallback)
}

/// Format a build or check report.
///
/// `dist` is the output directory for a build, `None` for a check.
pub fn format_build_report(report: &BuildReport, root: Option<&Path>, dist: Option<&Path>) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, route) in report.generated.iter().enumerate() {
        lines.push(generated_line(i + 1, route, dist));
        for shadowed in &route.shadowed {
            lines.push(format!("{}Shadowed: {}", indent(1), display_path(shadowed, root)));
        }
    }

    if !report.missing.is_empty() {
        lines.push(String::new());
        lines.push("Missing".to_string());
        for (i, route) in report.missing.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), route.path));
            if route.failures.is_empty() {
                lines.push(format!("{}No loadable source file", indent(1)));
            }
            lines.extend(failure_lines(&route.failures, root, 1));
        }
    }

    lines.push(String::new());
    let verb = if dist.is_some() { "Generated" } else { "Resolved" };
    lines.push(format!(
        "{} {}, {} missing",
        verb,
        plural(report.generated.len(), "product"),
        report.missing.len()
    ));
    lines
}

/// Print a build or check report to stdout.
pub fn print_build_report(report: &BuildReport, root: Option<&Path>, dist: Option<&Path>) {
    for line in format_build_report(report, root, dist) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

/// Format the export summary.
pub fn format_export_output(path: &Path, index: &ProductsIndex) -> Vec<String> {
    let products: usize = index.products.iter().map(|c| c.products.len()).sum();
    let mut lines = vec![format!(
        "Wrote {} ({}, {})",
        path.display(),
        plural(index.products.len(), "category"),
        plural(products, "product")
    )];
    for category in &index.products {
        lines.push(format!(
            "{}{} ({})",
            indent(1),
            category.category_slug,
            category.products.len()
        ));
    }
    lines
}

/// Print the export summary to stdout.
pub fn print_export_output(path: &Path, index: &ProductsIndex) {
    for line in format_export_output(path, index) {
        println!("{}", line);
    }
}

// ============================================================================
