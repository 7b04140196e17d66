//! # Photon Catalog
//!
//! Build-time product data for a laser equipment site. Products live on disk
//! as one descriptor per product, grouped into category directories, and the
//! site's page generator needs three things from them: the category list,
//! the set of `{category, product}` routes to pre-render, and one canonical
//! product record per route.
//!
//! # Pipeline
//!
//! ```text
//! 1. Discover   project dir  →  products root        (walk up, try layouts)
//! 2. Enumerate  products root → categories + paths    (cached once per run)
//! 3. Export     products root → public/data/products.json
//! 4. Resolve    route         → canonical Product     (candidates → extract → normalize)
//! 5. Generate   paths         → out/products/<cat>/<prod>/index.json
//! ```
//!
//! Enumeration and export only list the filesystem; they never read a
//! descriptor's code, so they succeed even when individual products are
//! broken. Resolution reads exactly one product and reports, rather than
//! raises, everything that went wrong on the way.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`slug`] | Slug normalization, slug variants, title casing |
//! | [`discover`] | Locating the products root from a project directory |
//! | [`catalog`] | Category and product enumeration, static paths, per-run cache |
//! | [`extract`] | Three-tier extraction of the exported object from a descriptor |
//! | [`resolve`] | Candidate file search and folder fallback for one route |
//! | [`normalize`] | Coercing loosely shaped descriptors into the canonical [`normalize::Product`] |
//! | [`types`] | Shared serialized records (`Category`, `ProductSummary`, `ProductPath`, `ImageRef`) |
//! | [`export`] | The `products.json` index and its static read side |
//! | [`generate`] | The generation pass: every route resolved, payloads written |
//! | [`config`] | Layered `catalog.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Descriptors Are Data
//!
//! Descriptor modules are TypeScript, but they are treated as data, never
//! executed. The [`extract::js`] evaluator understands literals, bindings,
//! spreads, templates and the TypeScript syntax that carries no runtime
//! meaning; anything that would need a real runtime (calls, imports of
//! values) fails the tier and the next, cruder strategy gets a turn.
//!
//! ## Slug Variants
//!
//! Routes are normalized slugs (`1.5um-seed` → `1-5um-seed`), but files keep
//! their authored names. Resolution reverses the normalization by trying a
//! small ordered set of variants ([`slug::slug_variants`]); the first
//! existing file wins.
//!
//! ## Degrade, Don't Abort
//!
//! A product that cannot be loaded is simply absent from the build. The
//! reasons are collected per candidate and per extraction tier so `check`
//! can tell an author exactly what to fix.

pub mod catalog;
pub mod config;
pub mod discover;
pub mod export;
pub mod extract;
pub mod generate;
pub mod normalize;
pub mod output;
pub mod resolve;
pub mod slug;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
