//! Mapping raw descriptor objects onto the canonical product record.
//!
//! Descriptors have been written over several years by different people and
//! disagree on shape: images are paths or `{ src, alt }` objects (or
//! `{ url }`), specs live in `rows`, `blocks`, `groups`, or `specGroups`,
//! and the same value hides under several keys (`tableCsvUrl`,
//! `tableCSVUrl`, `tableCsv`). Normalization resolves all of this once, so
//! renderers see exactly one shape:
//!
//! - Every optional field has an empty default (`""`, `[]`, an empty
//!   [`ImageRef`]). Renderers only ever ask "is this empty".
//! - Every image is an [`ImageRef`].
//! - `previewImageSrc` is filled from the most specific source available:
//!   explicit preview field, then the first gallery image, then the first
//!   entry of `images`.
//! - `specs` sections carry one flat `rows` list. The grouped form they were
//!   authored in is kept next to it as `blocks`.
//!
//! [`product`] is the full normalization used for descriptors found by
//! candidate search. [`minimal_product`] is the reduced one used for the
//! folder fallback, where the file is an arbitrary script in the product's
//! directory and only the core fields are trusted.

use crate::types::ImageRef;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Canonical product record: the payload a product page renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub slug: String,
    pub category: String,
    pub published: bool,
    pub featured: bool,
    pub meta: ProductMeta,
    pub title: String,
    pub short_description: String,
    pub hero_image: ImageRef,
    pub preview_image_src: String,
    pub gallery_images: Vec<ImageRef>,
    pub datasheet_url: String,
    pub datasheet_image_src: String,
    pub sections: Vec<Section>,
    pub related_products: Vec<RelatedProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_csv_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_image_url: Option<String>,
    #[serde(rename = "graphImageURL", skip_serializing_if = "Option::is_none")]
    pub graph_image_url: Option<String>,
}

/// Page metadata (document title, meta description).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductMeta {
    pub title: String,
    pub description: String,
    pub keywords: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedProduct {
    pub slug: String,
    pub title: String,
    pub short_description: String,
    pub image: ImageRef,
    pub href: String,
}

/// One content block of a product page, in display order.
///
/// Only the fields normalization touches are typed; everything else the
/// author wrote (`heading`, `content`, `items`, `columns`, ...) passes
/// through in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: String,
    /// Flattened spec rows (`specs` sections only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Value>>,
    /// The grouped form a `specs` section was authored in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Value>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Text,
    Features,
    Specs,
    Comparison,
    Other,
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self.kind.as_str() {
            "text" => SectionKind::Text,
            "features" => SectionKind::Features,
            "specs" => SectionKind::Specs,
            "comparison" => SectionKind::Comparison,
            _ => SectionKind::Other,
        }
    }
}

// ============================================================================
// Raw field access
// ============================================================================

/// JavaScript truthiness.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A non-empty string field.
fn text<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    raw.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// The first non-empty string among `keys`.
fn first_text<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| text(raw, key))
}

fn array<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    raw.get(key)?.as_array()
}

/// The first element of an array field, if truthy.
fn first<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    array(raw, key)?.first().filter(|v| truthy(v))
}

/// An image written as a path or as `{ src | url, alt }`.
///
/// Strings take `default_alt`; objects take their own `alt`, else
/// `default_alt`. Returns `None` for anything that is not an image.
fn image(value: &Value, default_alt: &str) -> Option<ImageRef> {
    match value {
        Value::String(src) if !src.is_empty() => Some(ImageRef::new(src.as_str(), default_alt)),
        Value::Object(obj) => {
            let src = first_text(obj, &["src", "url"]).unwrap_or("");
            let alt = text(obj, "alt").unwrap_or(default_alt);
            Some(ImageRef::new(src, alt))
        }
        _ => None,
    }
}

/// The `src` of an image-ish value, if non-empty.
fn image_src(value: &Value) -> Option<String> {
    image(value, "").map(|img| img.src).filter(|src| !src.is_empty())
}

// ============================================================================
// Full normalization
// ============================================================================

/// Normalize a raw descriptor found by candidate search.
pub fn product(raw: &Map<String, Value>, category: &str, product_slug: &str) -> Product {
    let raw_title = text(raw, "title").unwrap_or("");
    let title = first_text(raw, &["title", "metaTitle"])
        .unwrap_or(product_slug)
        .to_string();
    let short_description = first_text(raw, &["shortDescription", "description"])
        .unwrap_or("")
        .to_string();

    let gallery_images = gallery(raw, raw_title);
    let preview_image_src = preview_src(raw);
    let datasheet = array(raw, "datasheets")
        .and_then(|d| d.first())
        .and_then(Value::as_object);
    let datasheet_url = text(raw, "datasheetUrl")
        .or_else(|| datasheet.and_then(|d| text(d, "url")))
        .unwrap_or("")
        .to_string();
    let datasheet_image_src = first_text(raw, &["datasheetImageSrc", "datasheetUrl"])
        .or_else(|| datasheet.and_then(|d| first_text(d, &["image", "url"])))
        .unwrap_or("")
        .to_string();

    Product {
        slug: text(raw, "slug").unwrap_or(product_slug).to_string(),
        category: category.to_string(),
        published: raw.get("published").and_then(Value::as_bool).unwrap_or(true),
        featured: raw.get("featured").and_then(Value::as_bool).unwrap_or(false),
        meta: meta(raw, product_slug),
        hero_image: hero(raw, raw_title),
        preview_image_src,
        gallery_images,
        datasheet_url,
        datasheet_image_src,
        sections: sections(raw),
        related_products: related_products(raw),
        table_csv_url: first_text(raw, &["tableCsvUrl", "tableCSVUrl", "tableCsv"])
            .map(String::from),
        table_data: raw.get("tableData").filter(|v| truthy(v)).cloned(),
        table_image_url: text(raw, "tableImageUrl").map(String::from),
        graph_image_url: first_text(raw, &["graphImageURL", "graphImageUrl", "graphImage"])
            .map(String::from),
        title,
        short_description,
    }
}

fn meta(raw: &Map<String, Value>, product_slug: &str) -> ProductMeta {
    let authored = raw.get("meta").and_then(Value::as_object);
    let field = |key: &str| authored.and_then(|m| text(m, key));
    ProductMeta {
        title: field("title")
            .or_else(|| first_text(raw, &["metaTitle", "title", "slug"]))
            .unwrap_or(product_slug)
            .to_string(),
        description: field("description")
            .or_else(|| first_text(raw, &["metaDescription", "shortDescription"]))
            .unwrap_or("")
            .to_string(),
        keywords: field("keywords").unwrap_or("").to_string(),
    }
}

/// `heroImage`, else the first of `images`, else `{ hero, title }`.
fn hero(raw: &Map<String, Value>, raw_title: &str) -> ImageRef {
    raw.get("heroImage")
        .filter(|v| truthy(v))
        .or_else(|| first(raw, "images"))
        .and_then(|v| image(v, raw_title))
        .unwrap_or_else(|| ImageRef::new(text(raw, "hero").unwrap_or(""), raw_title))
}

/// `galleryImages`, else `images`; entries without a source are dropped.
fn gallery(raw: &Map<String, Value>, raw_title: &str) -> Vec<ImageRef> {
    array(raw, "galleryImages")
        .or_else(|| array(raw, "images"))
        .map(|items| {
            items
                .iter()
                .filter_map(|v| image(v, raw_title))
                .filter(|img| !img.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn preview_src(raw: &Map<String, Value>) -> String {
    ["previewImageSrc", "previewImage", "preview"]
        .iter()
        .filter_map(|key| raw.get(*key))
        .find_map(image_src)
        .or_else(|| first(raw, "galleryImages").and_then(image_src))
        .or_else(|| first(raw, "images").and_then(image_src))
        .unwrap_or_default()
}

fn related_products(raw: &Map<String, Value>) -> Vec<RelatedProduct> {
    let Some(items) = array(raw, "relatedProducts") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| {
            let title = text(item, "title").unwrap_or("");
            RelatedProduct {
                slug: text(item, "slug").unwrap_or("").to_string(),
                title: title.to_string(),
                short_description: first_text(item, &["shortDescription", "description"])
                    .unwrap_or("")
                    .to_string(),
                image: item
                    .get("image")
                    .and_then(|v| image(v, title))
                    .unwrap_or_default(),
                href: text(item, "href").unwrap_or("").to_string(),
            }
        })
        .collect()
}

// ============================================================================
// Sections
// ============================================================================

/// Keys a `specs` section may group its rows under, in priority order.
const SPEC_GROUP_KEYS: [&str; 3] = ["blocks", "groups", "specGroups"];

fn sections(raw: &Map<String, Value>) -> Vec<Section> {
    let Some(items) = array(raw, "sections") else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match value {
            Value::Object(obj) => Some(section(obj)),
            other => {
                debug!(index, value = %other, "dropping non-object section");
                None
            }
        })
        .collect()
}

/// Normalize one section: typed image, and for `specs`, flattened rows.
pub fn section(raw: &Map<String, Value>) -> Section {
    let mut fields = raw.clone();
    let kind = match fields.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => String::new(),
    };

    if let Some(img) = fields.get("image").and_then(|v| image(v, "")) {
        fields.insert("image".to_string(), image_value(&img));
    }

    if kind != "specs" {
        return Section {
            kind,
            rows: None,
            blocks: None,
            fields,
        };
    }

    let mut rows = match fields.remove("rows") {
        Some(Value::Array(rows)) => rows,
        _ => Vec::new(),
    };
    // Only the winning group key moves into `blocks`; the others pass through
    let blocks = SPEC_GROUP_KEYS
        .into_iter()
        .find(|key| fields.get(*key).is_some_and(Value::is_array))
        .and_then(|key| match fields.remove(key) {
            Some(Value::Array(groups)) => Some(groups),
            _ => None,
        });
    if blocks.is_some() {
        // A non-array `blocks` would collide with the typed field
        fields.remove("blocks");
    }
    for block in blocks.iter().flatten() {
        if let Some(block_rows) = block.get("rows").and_then(Value::as_array) {
            rows.extend(block_rows.iter().cloned());
        }
    }

    Section {
        kind,
        rows: Some(rows),
        blocks,
        fields,
    }
}

fn image_value(img: &ImageRef) -> Value {
    let mut obj = Map::new();
    obj.insert("src".to_string(), Value::String(img.src.clone()));
    obj.insert("alt".to_string(), Value::String(img.alt.clone()));
    Value::Object(obj)
}

// ============================================================================
// Folder fallback
// ============================================================================

/// Reduced normalization for a script found by the folder fallback.
///
/// Only slug, category, title, short description, hero image, datasheet URL,
/// sections, and the table/graph passthroughs are populated.
pub fn minimal_product(raw: &Map<String, Value>, category: &str, product_slug: &str) -> Product {
    let raw_title = text(raw, "title").unwrap_or("");
    Product {
        slug: text(raw, "slug").unwrap_or(product_slug).to_string(),
        category: category.to_string(),
        published: true,
        title: text(raw, "title").unwrap_or(product_slug).to_string(),
        short_description: first_text(raw, &["shortDescription", "description"])
            .unwrap_or("")
            .to_string(),
        hero_image: raw
            .get("heroImage")
            .filter(|v| truthy(v))
            .or_else(|| first(raw, "images"))
            .and_then(|v| image(v, raw_title))
            .unwrap_or_default(),
        datasheet_url: text(raw, "datasheetUrl").unwrap_or("").to_string(),
        sections: sections(raw),
        table_csv_url: first_text(raw, &["tableCsvUrl", "tableCSVUrl", "tableCsv"])
            .map(String::from),
        table_data: raw.get("tableData").filter(|v| truthy(v)).cloned(),
        table_image_url: text(raw, "tableImageUrl").map(String::from),
        graph_image_url: first_text(raw, &["graphImageURL", "graphImageUrl", "graphImage"])
            .map(String::from),
        ..Product::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("test input must be an object, got {other}"),
        }
    }

    fn normalize(value: Value) -> Product {
        product(&raw(value), "seed-lasers", "1-5um-seed")
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn empty_descriptor_gets_safe_defaults() {
        let p = normalize(json!({}));
        assert_eq!(p.slug, "1-5um-seed");
        assert_eq!(p.category, "seed-lasers");
        assert_eq!(p.title, "1-5um-seed");
        assert!(p.published);
        assert!(!p.featured);
        assert_eq!(p.short_description, "");
        assert_eq!(p.hero_image, ImageRef::default());
        assert_eq!(p.preview_image_src, "");
        assert!(p.gallery_images.is_empty());
        assert!(p.sections.is_empty());
        assert!(p.related_products.is_empty());
        assert_eq!(p.datasheet_url, "");
        assert_eq!(p.table_csv_url, None);
        assert_eq!(p.meta.title, "1-5um-seed");
    }

    #[test]
    fn authored_slug_and_flags_win() {
        let p = normalize(json!({ "slug": "1.5um-seed", "published": false, "featured": true }));
        assert_eq!(p.slug, "1.5um-seed");
        assert!(!p.published);
        assert!(p.featured);
    }

    #[test]
    fn title_and_description_fallbacks() {
        let p = normalize(json!({ "metaTitle": "Meta", "description": "Long" }));
        assert_eq!(p.title, "Meta");
        assert_eq!(p.short_description, "Long");
    }

    #[test]
    fn meta_derived_from_fields() {
        let p = normalize(json!({ "title": "Seed", "shortDescription": "Short" }));
        assert_eq!(
            p.meta,
            ProductMeta {
                title: "Seed".to_string(),
                description: "Short".to_string(),
                keywords: String::new(),
            }
        );
    }

    #[test]
    fn authored_meta_fills_gaps_only() {
        let p = normalize(json!({
            "title": "Seed",
            "metaDescription": "From metaDescription",
            "meta": { "title": "Custom", "keywords": "laser, seed" }
        }));
        assert_eq!(p.meta.title, "Custom");
        assert_eq!(p.meta.description, "From metaDescription");
        assert_eq!(p.meta.keywords, "laser, seed");
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[test]
    fn hero_as_string_takes_title_alt() {
        let p = normalize(json!({ "title": "Seed", "heroImage": "/hero.jpg" }));
        assert_eq!(p.hero_image, ImageRef::new("/hero.jpg", "Seed"));
    }

    #[test]
    fn hero_as_object_keeps_alt() {
        let p = normalize(json!({ "title": "Seed", "heroImage": { "src": "/h.jpg", "alt": "Front" } }));
        assert_eq!(p.hero_image, ImageRef::new("/h.jpg", "Front"));
    }

    #[test]
    fn hero_falls_back_to_images_then_hero() {
        let p = normalize(json!({ "title": "T", "images": [{ "url": "/a.jpg" }] }));
        assert_eq!(p.hero_image, ImageRef::new("/a.jpg", "T"));

        let p = normalize(json!({ "title": "T", "hero": "/legacy.jpg" }));
        assert_eq!(p.hero_image, ImageRef::new("/legacy.jpg", "T"));
    }

    #[test]
    fn gallery_mixes_strings_and_objects() {
        let p = normalize(json!({
            "title": "Seed",
            "galleryImages": ["/1.jpg", { "src": "/2.jpg", "alt": "Two" }, { "url": "/3.jpg" }, {}, 7]
        }));
        assert_eq!(
            p.gallery_images,
            vec![
                ImageRef::new("/1.jpg", "Seed"),
                ImageRef::new("/2.jpg", "Two"),
                ImageRef::new("/3.jpg", "Seed"),
            ]
        );
    }

    #[test]
    fn gallery_falls_back_to_images() {
        let p = normalize(json!({ "images": ["/x.jpg"] }));
        assert_eq!(p.gallery_images, vec![ImageRef::new("/x.jpg", "")]);
    }

    #[test]
    fn preview_priority() {
        let explicit = normalize(json!({
            "previewImage": { "src": "/explicit.jpg" },
            "galleryImages": ["/gallery.jpg"],
            "images": ["/images.jpg"]
        }));
        assert_eq!(explicit.preview_image_src, "/explicit.jpg");

        let gallery = normalize(json!({
            "galleryImages": [{ "src": "/gallery.jpg" }],
            "images": ["/images.jpg"]
        }));
        assert_eq!(gallery.preview_image_src, "/gallery.jpg");

        let images = normalize(json!({ "images": [{ "url": "/images.jpg" }] }));
        assert_eq!(images.preview_image_src, "/images.jpg");
    }

    #[test]
    fn empty_preview_field_is_skipped() {
        let p = normalize(json!({ "previewImageSrc": "", "preview": "/p.jpg" }));
        assert_eq!(p.preview_image_src, "/p.jpg");
    }

    // =========================================================================
    // Datasheets, tables, related products
    // =========================================================================

    #[test]
    fn datasheet_fallbacks() {
        let p = normalize(json!({
            "datasheets": [{ "url": "/ds.pdf", "image": "/ds.png" }]
        }));
        assert_eq!(p.datasheet_url, "/ds.pdf");
        assert_eq!(p.datasheet_image_src, "/ds.png");

        let p = normalize(json!({ "datasheetUrl": "/direct.pdf" }));
        assert_eq!(p.datasheet_url, "/direct.pdf");
        assert_eq!(p.datasheet_image_src, "/direct.pdf");
    }

    #[test]
    fn table_and_graph_aliases() {
        let p = normalize(json!({
            "tableCSVUrl": "/t.csv",
            "tableData": [["a", "b"]],
            "tableImageUrl": "/t.png",
            "graphImage": "/g.png"
        }));
        assert_eq!(p.table_csv_url.as_deref(), Some("/t.csv"));
        assert_eq!(p.table_data, Some(json!([["a", "b"]])));
        assert_eq!(p.table_image_url.as_deref(), Some("/t.png"));
        assert_eq!(p.graph_image_url.as_deref(), Some("/g.png"));
    }

    #[test]
    fn related_products_are_typed() {
        let p = normalize(json!({
            "relatedProducts": [
                { "slug": "edfa", "title": "EDFA", "image": "/edfa.jpg", "href": "/products/amps/edfa" },
                "not-an-object"
            ]
        }));
        assert_eq!(
            p.related_products,
            vec![RelatedProduct {
                slug: "edfa".to_string(),
                title: "EDFA".to_string(),
                short_description: String::new(),
                image: ImageRef::new("/edfa.jpg", "EDFA"),
                href: "/products/amps/edfa".to_string(),
            }]
        );
    }

    // =========================================================================
    // Sections
    // =========================================================================

    #[test]
    fn section_order_and_fields_preserved() {
        let p = normalize(json!({
            "sections": [
                { "type": "text", "heading": "Overview", "content": "hi" },
                { "type": "features", "items": ["a", "b"] }
            ]
        }));
        assert_eq!(p.sections.len(), 2);
        assert_eq!(p.sections[0].kind(), SectionKind::Text);
        assert_eq!(p.sections[0].fields["content"], json!("hi"));
        assert_eq!(p.sections[1].kind(), SectionKind::Features);
        assert_eq!(p.sections[1].rows, None);
    }

    #[test]
    fn specs_blocks_are_flattened() {
        let p = normalize(json!({
            "sections": [{ "type": "specs", "blocks": [{ "rows": [["A", "1"]] }] }]
        }));
        let specs = &p.sections[0];
        assert_eq!(specs.kind(), SectionKind::Specs);
        assert_eq!(specs.rows, Some(vec![json!(["A", "1"])]));
        assert_eq!(specs.blocks, Some(vec![json!({ "rows": [["A", "1"]] })]));
    }

    #[test]
    fn specs_direct_rows_come_first() {
        let s = section(&raw(json!({
            "type": "specs",
            "rows": [["Direct", "0"]],
            "specGroups": [
                { "title": "Optical", "rows": [["Power", "10 mW"]] },
                { "title": "Empty" },
                { "title": "Electrical", "rows": [["Voltage", "5 V"]] }
            ]
        })));
        assert_eq!(
            s.rows,
            Some(vec![json!(["Direct", "0"]), json!(["Power", "10 mW"]), json!(["Voltage", "5 V"])])
        );
        assert_eq!(s.blocks.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn specs_group_key_priority() {
        let s = section(&raw(json!({
            "type": "specs",
            "groups": [{ "rows": [["G", "1"]] }],
            "blocks": [{ "rows": [["B", "1"]] }]
        })));
        assert_eq!(s.rows, Some(vec![json!(["B", "1"])]));
        assert_eq!(s.fields["groups"], json!([{ "rows": [["G", "1"]] }]));
    }

    #[test]
    fn specs_losing_group_keys_pass_through() {
        let s = section(&raw(json!({
            "type": "specs",
            "blocks": [{ "rows": [["B", "1"]] }],
            "specGroups": [{ "title": "Optical", "rows": [["Power", "10 mW"]] }]
        })));
        assert_eq!(s.rows, Some(vec![json!(["B", "1"])]));
        assert_eq!(s.blocks, Some(vec![json!({ "rows": [["B", "1"]] })]));
        assert_eq!(
            s.fields["specGroups"],
            json!([{ "title": "Optical", "rows": [["Power", "10 mW"]] }])
        );

        let out = serde_json::to_value(&s).unwrap();
        assert_eq!(out["specGroups"][0]["title"], json!("Optical"));
        assert_eq!(out["blocks"], json!([{ "rows": [["B", "1"]] }]));
    }

    #[test]
    fn specs_non_array_blocks_yields_to_groups() {
        let s = section(&raw(json!({
            "type": "specs",
            "blocks": "see datasheet",
            "groups": [{ "rows": [["G", "1"]] }]
        })));
        assert_eq!(s.rows, Some(vec![json!(["G", "1"])]));
        assert!(!s.fields.contains_key("blocks"));
        assert!(!s.fields.contains_key("groups"));
    }

    #[test]
    fn specs_serializes_single_shape() {
        let s = section(&raw(json!({ "type": "specs", "heading": "Specs", "groups": [] })));
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            json!({ "type": "specs", "rows": [], "blocks": [], "heading": "Specs" })
        );
    }

    #[test]
    fn section_image_normalized() {
        let s = section(&raw(json!({ "type": "text", "image": "/diagram.png" })));
        assert_eq!(s.fields["image"], json!({ "src": "/diagram.png", "alt": "" }));
    }

    #[test]
    fn non_object_sections_dropped() {
        let p = normalize(json!({ "sections": [null, "text", { "type": "text" }] }));
        assert_eq!(p.sections.len(), 1);
    }

    // =========================================================================
    // Serialization and minimal mode
    // =========================================================================

    #[test]
    fn serializes_camel_case_with_graph_url_key() {
        let p = normalize(json!({ "title": "Seed", "graphImageUrl": "/g.png" }));
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["shortDescription"], json!(""));
        assert_eq!(value["heroImage"], json!({ "src": "", "alt": "Seed" }));
        assert_eq!(value["graphImageURL"], json!("/g.png"));
        assert!(value.get("tableCsvUrl").is_none());
    }

    #[test]
    fn minimal_product_populates_core_fields_only() {
        let p = minimal_product(
            &raw(json!({
                "title": "Analyzer",
                "description": "Measures linewidth",
                "heroImage": "/a.jpg",
                "galleryImages": ["/g.jpg"],
                "featured": true,
                "datasheetUrl": "/a.pdf",
                "sections": [{ "type": "specs", "groups": [{ "rows": [["R", "1"]] }] }]
            })),
            "testing-systems",
            "linewidth-analyzer",
        );
        assert_eq!(p.slug, "linewidth-analyzer");
        assert_eq!(p.title, "Analyzer");
        assert_eq!(p.short_description, "Measures linewidth");
        assert_eq!(p.hero_image, ImageRef::new("/a.jpg", "Analyzer"));
        assert_eq!(p.datasheet_url, "/a.pdf");
        assert_eq!(p.sections[0].rows, Some(vec![json!(["R", "1"])]));
        assert!(p.gallery_images.is_empty());
        assert!(!p.featured);
        assert_eq!(p.preview_image_src, "");
    }
}
