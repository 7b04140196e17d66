//! The generation pass: one payload per product route.
//!
//! Takes the catalog's static path list, resolves every route, and writes
//! what the page generator consumes:
//!
//! ```text
//! out/
//! ├── paths.json                                   # [{ category, product }, ...]
//! └── products/
//!     └── seed-lasers/
//!         └── 1-5um-seed/
//!             └── index.json                       # canonical Product
//! ```
//!
//! Routes resolve in parallel on the rayon pool. The catalog's caches are
//! filled before fan-out, and resolution itself shares no state, so the
//! order of the report matches the path list regardless of scheduling.
//!
//! A route that does not resolve is not an error: it is listed in
//! [`BuildReport::missing`] with the reason each candidate was rejected, and
//! its page is simply not produced. Only failing to write output is fatal.

use crate::catalog::Catalog;
use crate::resolve::{CandidateFailure, Resolution};
use crate::types::ProductPath;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A route whose payload was produced.
#[derive(Debug)]
pub struct GeneratedRoute {
    pub path: ProductPath,
    pub source: PathBuf,
    /// Written payload; `None` for a check run.
    pub output: Option<PathBuf>,
    pub folder_fallback: bool,
    pub shadowed: Vec<PathBuf>,
}

/// A route that did not resolve.
#[derive(Debug)]
pub struct MissingRoute {
    pub path: ProductPath,
    pub failures: Vec<CandidateFailure>,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub generated: Vec<GeneratedRoute>,
    pub missing: Vec<MissingRoute>,
}

impl BuildReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Payload location for a route.
pub fn route_payload_path(dist_dir: &Path, path: &ProductPath) -> PathBuf {
    dist_dir
        .join("products")
        .join(&path.category)
        .join(&path.product)
        .join("index.json")
}

/// Static paths with duplicates removed, first occurrence kept.
///
/// `alpha.json` next to `alpha.ts` lists the same route twice.
fn unique_paths(paths: &[ProductPath]) -> Vec<&ProductPath> {
    let mut seen = HashSet::new();
    paths.iter().filter(|p| seen.insert(*p)).collect()
}

fn resolve_all<'a>(catalog: &Catalog, paths: &[&'a ProductPath]) -> Vec<(&'a ProductPath, Resolution)> {
    paths
        .par_iter()
        .map(|path| (*path, catalog.product(&path.category, &path.product)))
        .collect()
}

fn write_payload(dist_dir: &Path, path: &ProductPath, resolution: &Resolution) -> Result<Option<PathBuf>, GenerateError> {
    let Some(product) = &resolution.product else {
        return Ok(None);
    };
    let output = route_payload_path(dist_dir, path);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, serde_json::to_string_pretty(product)?)?;
    Ok(Some(output))
}

fn report(resolved: Vec<(&ProductPath, Resolution)>, outputs: Vec<Option<PathBuf>>) -> BuildReport {
    let mut report = BuildReport::default();
    for ((path, resolution), output) in resolved.into_iter().zip(outputs) {
        match (resolution.product, resolution.source) {
            (Some(_), Some(source)) => report.generated.push(GeneratedRoute {
                path: path.clone(),
                source,
                output,
                folder_fallback: resolution.folder_fallback,
                shadowed: resolution.shadowed,
            }),
            _ => {
                debug!(route = %path, failures = resolution.failures.len(), "route not generated");
                report.missing.push(MissingRoute {
                    path: path.clone(),
                    failures: resolution.failures,
                })
            }
        }
    }
    report
}

/// Resolve every route and write `paths.json` plus one payload per product.
pub fn generate(catalog: &Catalog, dist_dir: &Path) -> Result<BuildReport, GenerateError> {
    let paths = unique_paths(catalog.paths());
    fs::create_dir_all(dist_dir)?;
    fs::write(
        dist_dir.join("paths.json"),
        serde_json::to_string_pretty(&paths)?,
    )?;

    let resolved = resolve_all(catalog, &paths);
    let outputs = resolved
        .par_iter()
        .map(|(path, resolution)| write_payload(dist_dir, path, resolution))
        .collect::<Result<Vec<_>, _>>()?;

    let report = report(resolved, outputs);
    info!(
        generated = report.generated.len(),
        missing = report.missing.len(),
        dist = %dist_dir.display(),
        "generation pass finished"
    );
    Ok(report)
}

/// Resolve every route without writing anything.
pub fn check(catalog: &Catalog) -> BuildReport {
    let paths = unique_paths(catalog.paths());
    let resolved = resolve_all(catalog, &paths);
    let outputs = vec![None; resolved.len()];
    report(resolved, outputs)
}
