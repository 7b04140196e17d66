//! Resolving a `{category, product}` route to a product record.
//!
//! URL slugs and file names disagree about decimal points (`1-5um` in the
//! URL, `1.5um.ts` on disk), so a lookup tries every slug variant against a
//! fixed list of file layouts and takes the first file that exists and
//! yields an object:
//!
//! ```text
//! <category>/
//! ├── <variant>/product.json     1
//! ├── <variant>/meta.json        2
//! ├── <variant>/index.json       3
//! ├── <variant>.json             4
//! ├── <variant>/index.ts         5
//! ├── <variant>/index.tsx        6
//! ├── <variant>/index.js         7
//! ├── <variant>.ts               8
//! ├── <variant>.tsx              9
//! └── <variant>.js               10
//! ```
//!
//! Variants are tried in the order [`slug_variants`] produces them, each
//! against all ten layouts. When no candidate works, any script directly
//! inside `<category>/<slug>/` is tried (the folder fallback), with the
//! reduced normalization of [`normalize::minimal_product`].
//!
//! Nothing here fails the caller. A [`Resolution`] carries the product when
//! one was found, and always carries the reason each tried file was
//! rejected, so callers and tests can see why a route came up empty.

use crate::catalog::{category_dirs, list_dir};
use crate::extract::{self, Dialect, ExtractFailure};
use crate::normalize::{self, Product};
use crate::slug::{normalize_slug, slug_variants};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// File layouts tried for each slug variant, in order.
const CANDIDATE_LAYOUTS: [Layout; 10] = [
    Layout::InDir("product.json"),
    Layout::InDir("meta.json"),
    Layout::InDir("index.json"),
    Layout::File("json"),
    Layout::InDir("index.ts"),
    Layout::InDir("index.tsx"),
    Layout::InDir("index.js"),
    Layout::File("ts"),
    Layout::File("tsx"),
    Layout::File("js"),
];

#[derive(Debug, Clone, Copy)]
enum Layout {
    /// `<variant>/<file>`
    InDir(&'static str),
    /// `<variant>.<ext>`
    File(&'static str),
}

impl Layout {
    fn path(self, category_dir: &Path, variant: &str) -> PathBuf {
        match self {
            Layout::InDir(file) => category_dir.join(variant).join(file),
            Layout::File(ext) => category_dir.join(format!("{variant}.{ext}")),
        }
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Extract(#[from] ExtractFailure),
    #[error("top-level value is {0}, not an object")]
    NotAnObject(&'static str),
    #[error("unsupported file type")]
    UnsupportedExtension,
}

/// A candidate file that existed but did not produce a product.
#[derive(Debug)]
pub struct CandidateFailure {
    pub path: PathBuf,
    pub error: ResolveError,
}

/// Outcome of resolving one route.
#[derive(Debug, Default)]
pub struct Resolution {
    pub product: Option<Product>,
    /// The file the product came from.
    pub source: Option<PathBuf>,
    /// Whether the product came from the folder fallback.
    pub folder_fallback: bool,
    /// Every candidate that existed but was rejected, in the order tried.
    pub failures: Vec<CandidateFailure>,
    /// Existing candidates for other slug variants that lost to `source`.
    pub shadowed: Vec<PathBuf>,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        self.product.is_some()
    }
}

/// The ordered, de-duplicated candidate list: `(variant index, path)`.
pub fn candidate_paths(category_dir: &Path, product_slug: &str) -> Vec<(usize, PathBuf)> {
    let mut candidates: Vec<(usize, PathBuf)> = Vec::new();
    for (index, variant) in slug_variants(product_slug).iter().enumerate() {
        for layout in CANDIDATE_LAYOUTS {
            let path = layout.path(category_dir, variant);
            if !candidates.iter().any(|(_, p)| *p == path) {
                candidates.push((index, path));
            }
        }
    }
    candidates
}

/// True when `name` is one plain path component (no separators, no `..`).
fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// The directory for `category` under `root`.
///
/// An exact name match wins; otherwise the first directory whose normalized
/// name equals the normalized request, so `seed-lasers` finds `Seed-Lasers`.
pub fn category_dir(root: &Path, category: &str) -> Option<PathBuf> {
    if is_single_component(category) {
        let exact = root.join(category);
        if exact.is_dir() {
            return Some(exact);
        }
    }
    let wanted = normalize_slug(category);
    if wanted.is_empty() {
        return None;
    }
    category_dirs(root).into_iter().find(|dir| {
        dir.file_name()
            .is_some_and(|name| normalize_slug(&name.to_string_lossy()) == wanted)
    })
}

/// Read one candidate file into a raw descriptor object.
pub fn load_raw(path: &Path) -> Result<Map<String, Value>, ResolveError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "json" {
        let content = fs::read_to_string(path)?;
        return match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(ResolveError::NotAnObject(extract::kind_of(&other))),
        };
    }

    let dialect = Dialect::from_extension(&ext).ok_or(ResolveError::UnsupportedExtension)?;
    let source = fs::read_to_string(path)?;
    let extracted = extract::extract_object(&source, dialect)?;
    debug!(path = %path.display(), tier = %extracted.tier, "extracted product object");
    Ok(extracted.object)
}

/// Resolve `category`/`product_slug` under the products root.
pub fn resolve_product(root: &Path, category: &str, product_slug: &str) -> Resolution {
    let mut resolution = Resolution::default();

    if !is_single_component(product_slug) {
        debug!(product = product_slug, "rejecting product slug with path components");
        return resolution;
    }
    let Some(category_dir) = category_dir(root, category) else {
        debug!(root = %root.display(), category, "category folder not found");
        return resolution;
    };

    let candidates = candidate_paths(&category_dir, product_slug);
    for (i, (variant, path)) in candidates.iter().enumerate() {
        if !path.is_file() {
            continue;
        }
        debug!(path = %path.display(), "found candidate");
        match load_raw(path) {
            Ok(raw) => {
                resolution.product = Some(normalize::product(&raw, category, product_slug));
                resolution.source = Some(path.clone());
                resolution.shadowed = candidates[i + 1..]
                    .iter()
                    .filter(|(v, p)| v != variant && p.is_file())
                    .map(|(_, p)| p.clone())
                    .collect();
                if !resolution.shadowed.is_empty() {
                    warn!(
                        winner = %path.display(),
                        shadowed = ?resolution.shadowed,
                        "several slug variants exist on disk; using the first"
                    );
                }
                return resolution;
            }
            Err(error) => {
                debug!(path = %path.display(), %error, "candidate rejected");
                resolution.failures.push(CandidateFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    folder_fallback(&category_dir, category, product_slug, &candidates, resolution)
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|e| Dialect::from_extension(&e.to_string_lossy()))
        .is_some()
}

/// Try every script in `<category>/<slug>/` not already tried as a candidate.
fn folder_fallback(
    category_dir: &Path,
    category: &str,
    product_slug: &str,
    candidates: &[(usize, PathBuf)],
    mut resolution: Resolution,
) -> Resolution {
    let folder = category_dir.join(product_slug);
    if !folder.is_dir() {
        return resolution;
    }

    let scripts: Vec<PathBuf> = list_dir(&folder)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_script(p) && !candidates.iter().any(|(_, c)| c == p))
        .collect();

    for path in scripts {
        match load_raw(&path) {
            Ok(raw) => {
                debug!(path = %path.display(), "resolved through folder fallback");
                resolution.product = Some(normalize::minimal_product(&raw, category, product_slug));
                resolution.source = Some(path);
                resolution.folder_fallback = true;
                return resolution;
            }
            Err(error) => {
                debug!(path = %path.display(), %error, "fallback file rejected");
                resolution.failures.push(CandidateFailure { path, error });
            }
        }
    }
    resolution
}
