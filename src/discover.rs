//! Locating the products root.
//!
//! The catalog tool is run from the site root, from a monorepo root that
//! holds the site under `Frontend/`, or from some subdirectory of either.
//! Discovery walks upward from the start directory and checks each level for
//! the configured layouts:
//!
//! ```text
//! repo/                         ← may be the start directory
//! ├── Frontend/
//! │   └── src/data/products/    ← layout 2
//! └── src/data/products/        ← layout 1 (checked first)
//! ```
//!
//! A missing root is not an error: the caller gets `None` and builds an
//! empty catalog.

use crate::config::{CatalogConfig, DiscoveryConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Find the products root starting at `start`.
///
/// Checks `max_ancestors` directories (start included) walking upward, each
/// against every layout in order; then each fallback relative to `start`.
pub fn find_products_dir(start: &Path, discovery: &DiscoveryConfig) -> Option<PathBuf> {
    for dir in start.ancestors().take(discovery.max_ancestors) {
        for layout in &discovery.layouts {
            let candidate = dir.join(layout);
            if candidate.is_dir() {
                debug!(root = %candidate.display(), "found products root");
                return Some(candidate);
            }
        }
    }
    discovery
        .fallbacks
        .iter()
        .map(|fallback| start.join(fallback))
        .find(|candidate| candidate.is_dir())
}

/// The products root for a project: an explicit `products_dir` from config
/// when set, otherwise the discovered one.
pub fn products_root(start: &Path, config: &CatalogConfig) -> Option<PathBuf> {
    match &config.products_dir {
        Some(dir) => {
            let root = start.join(dir);
            root.is_dir().then_some(root)
        }
        None => find_products_dir(start, &config.discovery),
    }
}

/// The root product lookups run against.
///
/// Lookups do not give up when discovery fails: they fall back to the first
/// fallback layout, and to the second when the first does not exist, so a
/// "not found" result names a concrete directory.
pub fn lookup_root(start: &Path, discovered: Option<&Path>, discovery: &DiscoveryConfig) -> PathBuf {
    if let Some(root) = discovered {
        return root.to_path_buf();
    }
    let mut fallbacks = discovery.fallbacks.iter().map(|f| start.join(f));
    let primary = fallbacks
        .next()
        .unwrap_or_else(|| start.join("src/data/products"));
    if primary.exists() {
        return primary;
    }
    fallbacks.next().unwrap_or(primary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn discovery() -> DiscoveryConfig {
        DiscoveryConfig::default()
    }

    #[test]
    fn finds_layout_in_start_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("src/data/products");
        fs::create_dir_all(&root).unwrap();

        assert_eq!(find_products_dir(tmp.path(), &discovery()), Some(root));
    }

    #[test]
    fn finds_frontend_layout() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("Frontend/src/data/products");
        fs::create_dir_all(&root).unwrap();

        assert_eq!(find_products_dir(tmp.path(), &discovery()), Some(root));
    }

    #[test]
    fn first_layout_wins_at_same_level() {
        let tmp = TempDir::new().unwrap();
        let primary = tmp.path().join("src/data/products");
        fs::create_dir_all(&primary).unwrap();
        fs::create_dir_all(tmp.path().join("Frontend/src/data/products")).unwrap();

        assert_eq!(find_products_dir(tmp.path(), &discovery()), Some(primary));
    }

    #[test]
    fn walks_up_from_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("src/data/products");
        fs::create_dir_all(&root).unwrap();
        let deep = tmp.path().join("scripts/tools");
        fs::create_dir_all(&deep).unwrap();

        assert_eq!(find_products_dir(&deep, &discovery()), Some(root));
    }

    #[test]
    fn walk_is_bounded() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/data/products")).unwrap();
        let deep = tmp.path().join("a/b/c");
        fs::create_dir_all(&deep).unwrap();

        let shallow = DiscoveryConfig {
            max_ancestors: 2,
            ..DiscoveryConfig::default()
        };
        // a/b/c and a/b are checked; the root three levels up is not
        assert_eq!(find_products_dir(&deep, &shallow), None);
    }

    #[test]
    fn data_products_fallback() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("data/products");
        fs::create_dir_all(&root).unwrap();

        assert_eq!(find_products_dir(tmp.path(), &discovery()), Some(root));
    }

    #[test]
    fn file_is_not_a_root() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/data")).unwrap();
        fs::write(tmp.path().join("src/data/products"), "not a dir").unwrap();

        assert_eq!(find_products_dir(tmp.path(), &discovery()), None);
    }

    #[test]
    fn nothing_found_is_none() {
        let tmp = TempDir::new().unwrap();
        let max = DiscoveryConfig {
            max_ancestors: 1,
            ..DiscoveryConfig::default()
        };
        assert_eq!(find_products_dir(tmp.path(), &max), None);
    }

    // =========================================================================
    // products_root / lookup_root tests
    // =========================================================================

    #[test]
    fn explicit_products_dir_skips_discovery() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/data/products")).unwrap();
        let custom = tmp.path().join("content/catalog");
        fs::create_dir_all(&custom).unwrap();

        let config = CatalogConfig {
            products_dir: Some("content/catalog".to_string()),
            ..CatalogConfig::default()
        };
        assert_eq!(products_root(tmp.path(), &config), Some(custom));
    }

    #[test]
    fn missing_explicit_products_dir_is_none() {
        let tmp = TempDir::new().unwrap();
        let config = CatalogConfig {
            products_dir: Some("nowhere".to_string()),
            ..CatalogConfig::default()
        };
        assert_eq!(products_root(tmp.path(), &config), None);
    }

    #[test]
    fn lookup_root_prefers_discovered() {
        let tmp = TempDir::new().unwrap();
        let found = tmp.path().join("somewhere");
        assert_eq!(lookup_root(tmp.path(), Some(&found), &discovery()), found);
    }

    #[test]
    fn lookup_root_falls_back_to_data_products() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            lookup_root(tmp.path(), None, &discovery()),
            tmp.path().join("data/products")
        );
    }
}
