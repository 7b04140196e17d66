//! Category and product enumeration.
//!
//! The products root holds one directory per category; inside each, a
//! product is either a directory or a file with a recognized extension:
//!
//! ```text
//! src/data/products/
//! ├── Seed-Lasers/                       # category "seed-lasers"
//! │   ├── 1.5um-seed.ts                  # product "1-5um-seed" (file)
//! │   ├── 1.5um-seed.json                # sidecar: title override for the above
//! │   └── narrow-linewidth/              # product "narrow-linewidth" (directory)
//! │       ├── meta.json                  # sidecar: title override
//! │       └── index.ts
//! └── Fiber-Amplifiers/
//!     └── edfa.json                      # product "edfa"
//! ```
//!
//! Titles are derived from the slug (`narrow-linewidth` → "Narrow Linewidth")
//! unless a sidecar provides a non-empty `title`. A sidecar that cannot be
//! read or parsed is ignored: a half-written product should not take the
//! whole catalog down.
//!
//! ## Caching
//!
//! [`Catalog`] computes the category list on first use and keeps it for the
//! rest of the run; the static path list is derived from it the same way.
//! Both live behind `OnceLock`, so the generation pass can resolve products
//! from many threads without recomputing or racing the enumeration.

use crate::config::CatalogConfig;
use crate::discover;
use crate::resolve::{self, Resolution};
use crate::slug::{normalize_slug, title_case};
use crate::types::{Category, ProductPath, ProductSummary};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use walkdir::WalkDir;

/// Extensions a file must carry to count as a product.
pub const PRODUCT_EXTENSIONS: &[&str] = &["json", "md", "ts", "tsx", "js"];

/// How many sample paths the path-list debug event carries.
const PATH_SAMPLE: usize = 10;

/// An entry inside a category directory that counts as a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductEntry {
    /// File name with the product extension removed, or the directory name.
    pub raw_name: String,
    pub is_dir: bool,
}

/// The product catalog for one generation run.
///
/// Construct once, pass by reference. Enumeration happens at most once per
/// `Catalog`; [`Catalog::walk_count`] reports how many filesystem walks have
/// actually run.
#[derive(Debug)]
pub struct Catalog {
    start: PathBuf,
    root: Option<PathBuf>,
    config: CatalogConfig,
    categories: OnceLock<Vec<Category>>,
    paths: OnceLock<Vec<ProductPath>>,
    walks: AtomicUsize,
}

impl Catalog {
    /// Create a catalog over an already-located products root.
    ///
    /// `start` is the project directory; lookups fall back relative to it
    /// when `root` is `None`.
    pub fn new(start: impl Into<PathBuf>, root: Option<PathBuf>, config: CatalogConfig) -> Self {
        Self {
            start: start.into(),
            root,
            config,
            categories: OnceLock::new(),
            paths: OnceLock::new(),
            walks: AtomicUsize::new(0),
        }
    }

    /// Locate the products root from `start` and create a catalog over it.
    pub fn discover(start: impl Into<PathBuf>, config: CatalogConfig) -> Self {
        let start = start.into();
        let root = discover::products_root(&start, &config);
        if root.is_none() {
            debug!(start = %start.display(), "no products root found");
        }
        Self::new(start, root, config)
    }

    /// The discovered products root, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// All categories with their product summaries.
    ///
    /// Walks the filesystem on the first call only.
    pub fn categories(&self) -> &[Category] {
        self.categories.get_or_init(|| {
            self.walks.fetch_add(1, Ordering::Relaxed);
            match &self.root {
                Some(root) => read_categories(root, &self.config),
                None => Vec::new(),
            }
        })
    }

    /// Slugs of every category, in catalog order.
    pub fn category_slugs(&self) -> Vec<&str> {
        self.categories()
            .iter()
            .map(|c| c.category_slug.as_str())
            .collect()
    }

    /// Every `{category, product}` route to pre-render.
    pub fn paths(&self) -> &[ProductPath] {
        self.paths.get_or_init(|| {
            let paths = product_paths(self.categories());
            if !self.config.production {
                let sample: Vec<String> = paths
                    .iter()
                    .take(PATH_SAMPLE)
                    .map(ToString::to_string)
                    .collect();
                debug!(count = paths.len(), ?sample, "generated product paths");
            }
            paths
        })
    }

    /// Number of filesystem walks performed so far (0 or 1).
    pub fn walk_count(&self) -> usize {
        self.walks.load(Ordering::Relaxed)
    }

    /// Resolve the full product record for a route.
    pub fn product(&self, category: &str, product_slug: &str) -> Resolution {
        let root = discover::lookup_root(&self.start, self.root.as_deref(), &self.config.discovery);
        resolve::resolve_product(&root, category, product_slug)
    }
}

/// Flatten categories into the static route list.
pub fn product_paths(categories: &[Category]) -> Vec<ProductPath> {
    categories
        .iter()
        .flat_map(|c| {
            c.products
                .iter()
                .map(|p| ProductPath::new(&c.category_slug, &p.slug))
        })
        .collect()
}

/// Enumerate categories under `root`, applying sidecar title overrides.
pub fn read_categories(root: &Path, config: &CatalogConfig) -> Vec<Category> {
    category_dirs(root)
        .into_iter()
        .map(|dir| {
            let dir_name = file_name(&dir);
            let category_slug = normalize_slug(&dir_name);
            let products = product_entries(&dir)
                .into_iter()
                .map(|entry| {
                    let slug = normalize_slug(&entry.raw_name);
                    let title = sidecar_title(&dir, &entry).unwrap_or_else(|| title_case(&slug));
                    ProductSummary {
                        slug,
                        title,
                        source: entry.raw_name,
                    }
                })
                .collect();
            Category {
                category_title: title_case(&category_slug),
                category_image: config.category_image(&dir_name).to_string(),
                category_slug,
                products,
                dir_name,
            }
        })
        .collect()
}

/// Category directories directly under `root`, sorted by name.
///
/// An unreadable root yields no categories.
pub fn category_dirs(root: &Path) -> Vec<PathBuf> {
    list_dir(root)
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect()
}

/// Product entries directly inside a category directory, sorted by name.
pub fn product_entries(category_dir: &Path) -> Vec<ProductEntry> {
    list_dir(category_dir)
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            if e.file_type().is_dir() {
                return Some(ProductEntry {
                    raw_name: name,
                    is_dir: true,
                });
            }
            strip_product_extension(&name).map(|stem| ProductEntry {
                raw_name: stem.to_string(),
                is_dir: false,
            })
        })
        .collect()
}

/// Remove a recognized product extension (case-insensitive).
pub fn strip_product_extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    PRODUCT_EXTENSIONS
        .iter()
        .any(|known| ext.eq_ignore_ascii_case(known))
        .then_some(stem)
}

pub(crate) fn list_dir(dir: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    let dir_display = dir.display().to_string();
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                debug!(dir = %dir_display, error = %err, "skipping unreadable entry");
                None
            }
        })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[derive(Deserialize)]
struct Sidecar {
    title: Option<serde_json::Value>,
}

/// Title override from `<dir>/meta.json` (directory products) or
/// `<name>.json` next to a file product.
fn sidecar_title(category_dir: &Path, entry: &ProductEntry) -> Option<String> {
    let folder_meta = category_dir.join(&entry.raw_name).join("meta.json");
    let file_meta = category_dir.join(format!("{}.json", entry.raw_name));
    let path = if entry.is_dir && folder_meta.exists() {
        folder_meta
    } else if file_meta.exists() {
        file_meta
    } else {
        return None;
    };

    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "unreadable sidecar");
            return None;
        }
    };
    match serde_json::from_str::<Sidecar>(&content) {
        Ok(Sidecar {
            title: Some(serde_json::Value::String(title)),
        }) if !title.is_empty() => Some(title),
        Ok(_) => None,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "malformed sidecar");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn catalog_at(tmp: &TempDir) -> Catalog {
        Catalog::discover(tmp.path(), CatalogConfig::default())
    }

    #[test]
    fn two_directory_products_in_one_category() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        write_file(&root.join("Seed-Lasers/alpha/index.ts"), "export default { title: 'A' }");
        write_file(&root.join("Seed-Lasers/beta/index.ts"), "export default { title: 'B' }");

        let catalog = catalog_at(&tmp);
        let categories = catalog.categories();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].category_slug, "seed-lasers");
        assert_eq!(categories[0].category_title, "Seed Lasers");
        assert_eq!(product_slugs(&categories[0]), vec!["alpha", "beta"]);
        assert_eq!(product_titles(&categories[0]), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn second_call_is_a_cache_hit() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        write_file(&root.join("Seed-Lasers/alpha/index.ts"), "");
        write_file(&root.join("Seed-Lasers/beta/index.ts"), "");

        let catalog = catalog_at(&tmp);
        let first = catalog.categories();
        // New files after the first walk must not show up
        write_file(&root.join("Seed-Lasers/gamma/index.ts"), "");
        let second = catalog.categories();

        assert!(std::ptr::eq(first, second));
        assert_eq!(second[0].products.len(), 2);
        assert_eq!(catalog.walk_count(), 1);

        let paths_a = catalog.paths();
        let paths_b = catalog.paths();
        assert!(std::ptr::eq(paths_a, paths_b));
        assert_eq!(catalog.walk_count(), 1);
    }

    #[test]
    fn file_products_filtered_by_extension() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        let cat = root.join("Fiber-Amplifiers");
        write_file(&cat.join("edfa.json"), "{}");
        write_file(&cat.join("notes.md"), "# Notes");
        write_file(&cat.join("ydfa.TS"), "");
        write_file(&cat.join("photo.jpg"), "fake image");
        write_file(&cat.join("README"), "");

        let categories = catalog_at(&tmp).categories().to_vec();
        assert_eq!(product_slugs(&categories[0]), vec!["edfa", "notes", "ydfa"]);
    }

    #[test]
    fn files_at_root_are_not_categories() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        write_file(&root.join("index.ts"), "");
        write_file(&root.join("Seed-Lasers/a.ts"), "");

        let catalog = catalog_at(&tmp);
        assert_eq!(catalog.category_slugs(), vec!["seed-lasers"]);
    }

    #[test]
    fn slugs_are_normalized_from_raw_names() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        write_file(&root.join("Seed-Lasers/1.5um-seed.ts"), "");

        let catalog = catalog_at(&tmp);
        let seed = find_category(catalog.categories(), "seed-lasers");
        assert_eq!(product_slugs(seed), vec!["1-5um-seed"]);
        assert_eq!(product_titles(seed), vec!["1 5um Seed"]);
        assert_eq!(seed.products[0].source, "1.5um-seed");
    }

    // =========================================================================
    // Sidecar title tests
    // =========================================================================

    #[test]
    fn folder_meta_overrides_title() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        write_file(&root.join("Seed-Lasers/alpha/index.ts"), "");
        write_file(
            &root.join("Seed-Lasers/alpha/meta.json"),
            r#"{ "title": "Alpha Seed Laser" }"#,
        );

        let catalog = catalog_at(&tmp);
        assert_eq!(
            product_titles(&catalog.categories()[0]),
            vec!["Alpha Seed Laser"]
        );
    }

    #[test]
    fn sibling_json_overrides_file_product_title() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        write_file(&root.join("Seed-Lasers/alpha.ts"), "");
        write_file(&root.join("Seed-Lasers/alpha.json"), r#"{ "title": "From JSON" }"#);

        let catalog = catalog_at(&tmp);
        let seed = &catalog.categories()[0];
        // alpha.json and alpha.ts are both product entries with the same slug
        assert_eq!(product_titles(seed), vec!["From JSON", "From JSON"]);
    }

    #[test]
    fn malformed_sidecar_falls_back_to_derived_title() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        write_file(&root.join("Seed-Lasers/alpha/index.ts"), "");
        write_file(&root.join("Seed-Lasers/alpha/meta.json"), "{ not json");

        let catalog = catalog_at(&tmp);
        assert_eq!(product_titles(&catalog.categories()[0]), vec!["Alpha"]);
    }

    #[test]
    fn empty_or_non_string_title_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        write_file(&root.join("Seed-Lasers/alpha/meta.json"), r#"{ "title": "" }"#);
        write_file(&root.join("Seed-Lasers/beta/meta.json"), r#"{ "title": 42 }"#);

        let catalog = catalog_at(&tmp);
        assert_eq!(
            product_titles(&catalog.categories()[0]),
            vec!["Alpha", "Beta"]
        );
    }

    // =========================================================================
    // Paths and degenerate roots
    // =========================================================================

    #[test]
    fn paths_flatten_every_category() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        write_file(&root.join("Fiber-Amplifiers/edfa.json"), "{}");
        write_file(&root.join("Seed-Lasers/alpha.ts"), "");
        write_file(&root.join("Seed-Lasers/beta.ts"), "");

        let catalog = catalog_at(&tmp);
        assert_eq!(
            catalog.paths(),
            &[
                ProductPath::new("fiber-amplifiers", "edfa"),
                ProductPath::new("seed-lasers", "alpha"),
                ProductPath::new("seed-lasers", "beta"),
            ]
        );
    }

    #[test]
    fn empty_root_yields_empty_catalog() {
        let tmp = TempDir::new().unwrap();
        products_root(&tmp);

        let catalog = catalog_at(&tmp);
        assert!(catalog.root().is_some());
        assert!(catalog.categories().is_empty());
        assert!(catalog.paths().is_empty());
    }

    #[test]
    fn missing_root_yields_empty_catalog() {
        let tmp = TempDir::new().unwrap();
        let catalog = Catalog::new(tmp.path(), None, CatalogConfig::default());
        assert!(catalog.categories().is_empty());
        assert!(catalog.paths().is_empty());
        assert_eq!(catalog.walk_count(), 1);
    }

    #[test]
    fn category_image_attached_from_config() {
        let tmp = TempDir::new().unwrap();
        let root = products_root(&tmp);
        write_file(&root.join("Seed-Lasers/alpha.ts"), "");
        write_file(&root.join("Custom-Things/beta.ts"), "");

        let catalog = catalog_at(&tmp);
        let seed = find_category(catalog.categories(), "seed-lasers");
        assert_eq!(
            seed.category_image,
            "/category/High-Precision-Seed-Fiber-Lasers.jpg"
        );
        let custom = find_category(catalog.categories(), "custom-things");
        assert_eq!(custom.category_image, "");
    }

    #[test]
    fn strip_extension_is_case_insensitive() {
        assert_eq!(strip_product_extension("a.TSX"), Some("a"));
        assert_eq!(strip_product_extension("1.5um.json"), Some("1.5um"));
        assert_eq!(strip_product_extension("photo.png"), None);
        assert_eq!(strip_product_extension("noext"), None);
    }
}
