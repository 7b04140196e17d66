//! The products index: `<public>/data/products.json`.
//!
//! Client-side search and the header menu need the category list in the
//! browser, before any product page is built. The index is produced from a
//! plain directory listing: no descriptor is read, no sidecar is consulted,
//! titles come straight from directory and file names. It is cheap and it
//! cannot fail on a broken product file.
//!
//! ```json
//! {
//!   "products": [
//!     {
//!       "categorySlug": "seed-lasers",
//!       "categoryTitle": "Seed Lasers",
//!       "categoryImage": "/category/High-Precision-Seed-Fiber-Lasers.jpg",
//!       "products": [{ "slug": "1-5um-seed", "title": "1.5um Seed" }]
//!     }
//!   ]
//! }
//! ```
//!
//! [`load_products_index`] is the read side: what the site's static
//! products endpoint serves.

use crate::catalog::{category_dirs, product_entries};
use crate::config::CatalogConfig;
use crate::slug::{normalize_slug, title_case};
use crate::types::{Category, ProductSummary};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Index location relative to the public directory.
pub const INDEX_PATH: &str = "data/products.json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductsIndex {
    pub products: Vec<Category>,
}

/// Build the index from the products root. A missing root gives an empty
/// index.
pub fn build_index(root: Option<&Path>, config: &CatalogConfig) -> ProductsIndex {
    let Some(root) = root else {
        return ProductsIndex::default();
    };
    let products = category_dirs(root)
        .into_iter()
        .map(|dir| {
            let dir_name = dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let products = product_entries(&dir)
                .into_iter()
                .map(|entry| ProductSummary {
                    slug: normalize_slug(&entry.raw_name),
                    title: title_case(&entry.raw_name),
                    source: entry.raw_name,
                })
                .collect();
            Category {
                category_slug: normalize_slug(&dir_name),
                category_title: title_case(&dir_name),
                category_image: config.category_image(&dir_name).to_string(),
                products,
                dir_name,
            }
        })
        .collect();
    ProductsIndex { products }
}

/// Write the index as pretty JSON under `public_dir`; returns the file path.
pub fn write_products_index(public_dir: &Path, index: &ProductsIndex) -> Result<PathBuf, ExportError> {
    let path = public_dir.join(INDEX_PATH);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(index)?)?;
    info!(
        path = %path.display(),
        categories = index.products.len(),
        "wrote products index"
    );
    Ok(path)
}

/// The index document as served: parsed verbatim, or `{"products": []}`
/// when the file is absent or unparseable.
pub fn load_products_index(path: &Path) -> Value {
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str::<Value>(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(value) => value,
        Err(error) => {
            debug!(path = %path.display(), %error, "serving empty products index");
            json!({ "products": [] })
        }
    }
}
