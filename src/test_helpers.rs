//! Shared test utilities for the photon-catalog test suite.
//!
//! Provides fixture setup, tree-writing helpers, and lookups over catalog
//! data (`Category`, `ProductSummary`) that panic with the available names
//! on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let catalog = Catalog::discover(tmp.path(), CatalogConfig::default());
//!
//! let seed = find_category(catalog.categories(), "seed-lasers");
//! assert_eq!(product_slugs(seed), vec!["1-5um-seed", "narrow-linewidth-seed"]);
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::types::{Category, ProductSummary};

/// Products root inside the fixture site.
pub const FIXTURE_PRODUCTS: &str = "src/data/products";

// =========================================================================
// Fixture setup
// =========================================================================

/// A private copy of `fixtures/site/` in a fresh temp directory.
///
/// Tests may add, break, or delete products without affecting each other.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    for entry in WalkDir::new(&fixtures) {
        let entry = entry.unwrap();
        let target = tmp.path().join(entry.path().strip_prefix(&fixtures).unwrap());
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).unwrap();
        } else {
            std::fs::copy(entry.path(), &target).unwrap();
        }
    }
    tmp
}

/// Create an empty `src/data/products` under `tmp` and return its path.
pub fn products_root(tmp: &TempDir) -> PathBuf {
    let root = tmp.path().join(FIXTURE_PRODUCTS);
    std::fs::create_dir_all(&root).unwrap();
    root
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

// =========================================================================
// Catalog lookups: panic with the available names on a miss
// =========================================================================

/// Find a category by slug. Panics if not found.
pub fn find_category<'a>(categories: &'a [Category], slug: &str) -> &'a Category {
    categories
        .iter()
        .find(|c| c.category_slug == slug)
        .unwrap_or_else(|| {
            let slugs: Vec<&str> = categories.iter().map(|c| c.category_slug.as_str()).collect();
            panic!("category '{slug}' not found. Available: {slugs:?}")
        })
}

/// Find a product summary by slug within a category. Panics if not found.
pub fn find_product<'a>(category: &'a Category, slug: &str) -> &'a ProductSummary {
    category
        .products
        .iter()
        .find(|p| p.slug == slug)
        .unwrap_or_else(|| {
            let slugs = product_slugs(category);
            panic!(
                "product '{slug}' not found in category '{}'. Available: {slugs:?}",
                category.category_slug
            )
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All product slugs in category order.
pub fn product_slugs(category: &Category) -> Vec<&str> {
    category.products.iter().map(|p| p.slug.as_str()).collect()
}

/// All product titles in category order.
pub fn product_titles(category: &Category) -> Vec<&str> {
    category.products.iter().map(|p| p.title.as_str()).collect()
}
