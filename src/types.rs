//! Shared records passed between the catalog, the resolver, and the
//! generation pass.
//!
//! Field names serialize in camelCase: these records end up in JSON consumed
//! by the site's page components and client-side search.

use serde::{Deserialize, Serialize};

/// A product as listed in navigation and the products index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub slug: String,
    pub title: String,
    /// Directory or file name the product was discovered as.
    #[serde(skip)]
    pub source: String,
}

/// A category directory and the products inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_slug: String,
    pub category_title: String,
    #[serde(default)]
    pub category_image: String,
    pub products: Vec<ProductSummary>,
    /// Directory name on disk (before slug normalization).
    #[serde(skip)]
    pub dir_name: String,
}

/// One statically generated product route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductPath {
    pub category: String,
    pub product: String,
}

impl ProductPath {
    pub fn new(category: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            product: product.into(),
        }
    }
}

impl std::fmt::Display for ProductPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.product)
    }
}

/// An image reference in canonical form.
///
/// Authors write images either as a bare path or as `{ src, alt }`; after
/// normalization every image is this struct, with empty strings standing in
/// for missing values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

impl ImageRef {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }
}
