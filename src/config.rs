//! Catalog configuration module.
//!
//! Handles loading, validating, and merging `catalog.toml`. Stock defaults are
//! the base layer; a `catalog.toml` in the project root overrides any subset
//! of them. Running without a config file is the normal case.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # products_dir = "src/data/products"  # Explicit products root (skips discovery)
//! production = false                     # Suppress debug logging
//!
//! [discovery]
//! max_ancestors = 6                      # Parent levels searched for a layout
//! layouts = ["src/data/products", "Frontend/src/data/products"]
//! fallbacks = ["src/data/products", "data/products"]
//!
//! [output]
//! public_dir = "public"                  # products.json → public/data/products.json
//! dist_dir = "out"                       # Route payloads from `build`
//!
//! [category_images]
//! "Seed-Lasers" = "/category/High-Precision-Seed-Fiber-Lasers.jpg"
//!
//! [processing]
//! max_processes = 4                      # Max parallel resolvers (omit for auto)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [output]
//! dist_dir = "site"
//! ```
//!
//! Unknown keys are rejected to catch typos early. `category_images` is
//! replaced wholesale when present, so a user map does not inherit stock
//! entries for categories it no longer has.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "catalog.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading {CONFIG_FILENAME}: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing {CONFIG_FILENAME}: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid {CONFIG_FILENAME}: {0}")]
    Validation(String),
}

/// Catalog configuration loaded from `catalog.toml`.
///
/// Every field has a default; a user file names only what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Explicit products root, relative to the project root. Skips discovery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products_dir: Option<String>,
    /// Production mode: debug-level diagnostics are not emitted.
    pub production: bool,
    /// Where to look for the products root.
    pub discovery: DiscoveryConfig,
    /// Where generated artifacts are written.
    pub output: OutputConfig,
    /// Category directory name → hero image path for the products index.
    pub category_images: BTreeMap<String, String>,
    /// Parallel resolution settings.
    pub processing: ProcessingConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            products_dir: None,
            production: false,
            discovery: DiscoveryConfig::default(),
            output: OutputConfig::default(),
            category_images: default_category_images(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Reject values discovery or output cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.max_ancestors == 0 || self.discovery.max_ancestors > 32 {
            return Err(ConfigError::Validation(
                "discovery.max_ancestors must be 1-32".into(),
            ));
        }
        if self.discovery.layouts.is_empty() {
            return Err(ConfigError::Validation(
                "discovery.layouts must not be empty".into(),
            ));
        }
        if self.output.public_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output.public_dir must not be empty".into(),
            ));
        }
        if self.output.dist_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output.dist_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Image path for a category directory, or an empty string when unmapped.
    pub fn category_image(&self, dir_name: &str) -> &str {
        self.category_images
            .get(dir_name)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Products-root discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// How many directories (the start directory included) are searched
    /// walking upward.
    pub max_ancestors: usize,
    /// Layouts checked at every ancestor, in order.
    pub layouts: Vec<String>,
    /// Layouts checked relative to the start directory once the walk fails.
    pub fallbacks: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_ancestors: 6,
            layouts: vec![
                "src/data/products".to_string(),
                "Frontend/src/data/products".to_string(),
            ],
            fallbacks: vec!["src/data/products".to_string(), "data/products".to_string()],
        }
    }
}

/// Output locations, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Static assets directory; the products index lands in `<public_dir>/data/`.
    pub public_dir: String,
    /// Destination of the generation pass.
    pub dist_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            dist_dir: "out".to_string(),
        }
    }
}

/// Worker settings for the generation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Upper bound on rayon workers resolving routes. Unset means one per
    /// core; larger values are capped at the core count.
    pub max_processes: Option<usize>,
}

/// Worker count for the rayon pool: `max_processes` held to `1..=cores`, or
/// every core when unset.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    match config.max_processes {
        Some(requested) => requested.clamp(1, cores),
        None => cores,
    }
}

fn default_category_images() -> BTreeMap<String, String> {
    [
        ("Broadband-ASE-Sources", "/category/Broadband-ASE-Sources.jpg"),
        ("Fiber-Amplifiers", "/category/Fiber-Amplifier.jpg"),
        (
            "High-Power-Fiber-Lasers",
            "/category/High-Power-Single-Frequency-Fiber-Lasers.jpg",
        ),
        (
            "point-light-sources",
            "/category/Point-Light-Source-Solutions.jpg",
        ),
        ("Seed-Lasers", "/category/High-Precision-Seed-Fiber-Lasers.jpg"),
        (
            "Single-Frequency-Fiber-Lasers",
            "/category/Single-Frequency-Fiber-Lasers.jpg",
        ),
        (
            "Testing-Systems",
            "/category/Laser-Testing-and-Measurement-Systems.jpg",
        ),
        (
            "Wavelength-Conversion-Lasers",
            "/category/Wavelength-Conversion-Laser-Solutions-High-Precision-Performance.jpg",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

// =============================================================================
// Layered loading
// =============================================================================

/// Stock defaults as a TOML table: the bottom layer a user file is merged
/// onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CatalogConfig::default()).expect("stock config serializes to TOML")
}

/// Lay `overlay` over `base`, descending into tables present in both.
///
/// Scalars and arrays in `overlay` win outright, and so does
/// `category_images`: a user map lists exactly the categories the site has.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(layer)) => {
            for (key, value) in layer {
                let value = match table.remove(&key) {
                    Some(existing) if key != "category_images" => merge_toml(existing, value),
                    _ => value,
                };
                table.insert(key, value);
            }
            toml::Value::Table(table)
        }
        (_, overlay) => overlay,
    }
}

/// The user layer: `catalog.toml` in `project_root`, or `None` when the
/// project has no config file.
pub fn read_user_layer(project_root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    match fs::read_to_string(project_root.join(CONFIG_FILENAME)) {
        Ok(text) => Ok(Some(toml::from_str(&text)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Stock defaults with `layer` merged on top, deserialized and validated.
pub fn config_from_layer(layer: Option<toml::Value>) -> Result<CatalogConfig, ConfigError> {
    let merged = layer.into_iter().fold(stock_defaults_value(), merge_toml);
    let config: CatalogConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// The effective config for a project.
pub fn load_config(project_root: &Path) -> Result<CatalogConfig, ConfigError> {
    config_from_layer(read_user_layer(project_root)?)
}

/// Returns a fully-commented stock `catalog.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photon Catalog Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the project root as catalog.toml.
# Unknown keys will cause an error.

# Explicit products root, relative to the project root.
# When unset, the root is discovered (see [discovery]).
# products_dir = "src/data/products"

# Production mode: debug-level diagnostics (candidate probing, extraction
# failures) are not emitted. Same as passing --production.
production = false

# ---------------------------------------------------------------------------
# Products root discovery
# ---------------------------------------------------------------------------
[discovery]
# Number of directories searched walking upward from the project root
# (the project root itself included).
max_ancestors = 6

# Layouts checked at each of those directories, in order.
layouts = ["src/data/products", "Frontend/src/data/products"]

# Layouts checked relative to the project root once the upward walk fails.
fallbacks = ["src/data/products", "data/products"]

# ---------------------------------------------------------------------------
# Generated artifacts
# ---------------------------------------------------------------------------
[output]
# The products index is written to <public_dir>/data/products.json.
public_dir = "public"

# Route payloads from `build` go to <dist_dir>/products/<category>/<product>/.
dist_dir = "out"

# ---------------------------------------------------------------------------
# Category images (keyed by category directory name)
# ---------------------------------------------------------------------------
# A table here replaces the stock map entirely.
[category_images]
"Broadband-ASE-Sources" = "/category/Broadband-ASE-Sources.jpg"
"Fiber-Amplifiers" = "/category/Fiber-Amplifier.jpg"
"High-Power-Fiber-Lasers" = "/category/High-Power-Single-Frequency-Fiber-Lasers.jpg"
"Seed-Lasers" = "/category/High-Precision-Seed-Fiber-Lasers.jpg"
"Single-Frequency-Fiber-Lasers" = "/category/Single-Frequency-Fiber-Lasers.jpg"
"Testing-Systems" = "/category/Laser-Testing-and-Measurement-Systems.jpg"
"Wavelength-Conversion-Lasers" = "/category/Wavelength-Conversion-Laser-Solutions-High-Precision-Performance.jpg"
"point-light-sources" = "/category/Point-Light-Source-Solutions.jpg"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel product resolvers during `build` and `check`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_discovery() {
        let config = CatalogConfig::default();
        assert_eq!(config.discovery.max_ancestors, 6);
        assert_eq!(
            config.discovery.layouts,
            vec!["src/data/products", "Frontend/src/data/products"]
        );
        assert_eq!(
            config.discovery.fallbacks,
            vec!["src/data/products", "data/products"]
        );
        assert!(config.products_dir.is_none());
        assert!(!config.production);
    }

    #[test]
    fn default_config_output_dirs() {
        let config = CatalogConfig::default();
        assert_eq!(config.output.public_dir, "public");
        assert_eq!(config.output.dist_dir, "out");
    }

    #[test]
    fn category_image_lookup() {
        let config = CatalogConfig::default();
        assert_eq!(
            config.category_image("Seed-Lasers"),
            "/category/High-Precision-Seed-Fiber-Lasers.jpg"
        );
        assert_eq!(config.category_image("Unknown-Category"), "");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[output]
dist_dir = "site"
"#;
        let config: CatalogConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.output.dist_dir, "site");
        assert_eq!(config.output.public_dir, "public");
        assert_eq!(config.discovery.max_ancestors, 6);
    }

    #[test]
    fn unknown_key_rejected() {
        let toml = r#"
[discovery]
max_ancestor = 3
"#;
        let result: Result<CatalogConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.output.dist_dir, "out");
        assert_eq!(config.category_images.len(), 8);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
products_dir = "content/products"
production = true

[discovery]
max_ancestors = 2
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.products_dir.as_deref(), Some("content/products"));
        assert!(config.production);
        assert_eq!(config.discovery.max_ancestors, 2);
        // Unspecified values keep their defaults
        assert_eq!(config.discovery.layouts.len(), 2);
        assert_eq!(config.output.public_dir, "public");
    }

    #[test]
    fn load_config_category_images_replace_stock_map() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[category_images]
"Seed-Lasers" = "/img/seed.jpg"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.category_images.len(), 1);
        assert_eq!(config.category_image("Seed-Lasers"), "/img/seed.jpg");
        assert_eq!(config.category_image("Fiber-Amplifiers"), "");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validation_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[discovery]\nmax_ancestors = 0\n",
        )
        .unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_empty_layouts() {
        let mut config = CatalogConfig::default();
        config.discovery.layouts.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_output_dirs() {
        let mut config = CatalogConfig::default();
        config.output.dist_dir = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: CatalogConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = CatalogConfig::default();
        assert_eq!(config.discovery.layouts, defaults.discovery.layouts);
        assert_eq!(config.category_images, defaults.category_images);
        assert_eq!(config.output.dist_dir, defaults.output.dist_dir);
    }

    // =========================================================================
    // Worker count
    // =========================================================================

    fn cores() -> usize {
        std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
    }

    #[test]
    fn workers_default_to_every_core() {
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores());
    }

    #[test]
    fn workers_never_exceed_cores() {
        let processing = ProcessingConfig {
            max_processes: Some(cores() + 64),
        };
        assert_eq!(effective_threads(&processing), cores());
    }

    #[test]
    fn workers_at_least_one() {
        for requested in [0, 1] {
            let processing = ProcessingConfig {
                max_processes: Some(requested),
            };
            assert_eq!(effective_threads(&processing), 1);
        }
    }

    // =========================================================================
    // Layer merging
    // =========================================================================

    fn value(text: &str) -> toml::Value {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn nested_tables_merge_per_key() {
        let merged = merge_toml(
            value("[output]\npublic_dir = \"public\"\ndist_dir = \"out\"\n"),
            value("[output]\ndist_dir = \"site\"\n"),
        );
        assert_eq!(merged["output"]["dist_dir"].as_str(), Some("site"));
        assert_eq!(merged["output"]["public_dir"].as_str(), Some("public"));
    }

    #[test]
    fn arrays_are_replaced_not_appended() {
        let merged = merge_toml(
            value("[discovery]\nlayouts = [\"a\", \"b\"]\n"),
            value("[discovery]\nlayouts = [\"c\"]\n"),
        );
        assert_eq!(merged["discovery"]["layouts"], value("x = [\"c\"]")["x"]);
    }

    #[test]
    fn no_layer_is_stock_defaults() {
        let config = config_from_layer(None).unwrap();
        assert_eq!(config.output.dist_dir, "out");
        assert!(!config.production);
    }
}
