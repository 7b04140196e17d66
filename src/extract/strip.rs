//! Regex rewriting of TypeScript into evaluable JavaScript.
//!
//! The last resort: textual rewrites that turn ES-module exports into
//! CommonJS assignments, drop imports, and remove simple type annotations.
//! The rewrites know nothing about strings or comments, so they can damage
//! text that happens to look like an annotation; the result is only trusted
//! if it evaluates.

use regex::Regex;
use std::sync::LazyLock;

static EXPORT_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"export\s+default\s+").expect("valid regex"));

static EXPORT_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+(const|let|var|function|class)\s+").expect("valid regex")
});

static IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s+[^'"]+['"][^'"]+['"]\s*;?"#).expect("valid regex"));

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":\s*[A-Za-z0-9_\[\]<>|]+\s*(=|\)|;|\n)").expect("valid regex")
});

/// Apply the rewrites in order: default export, exported declarations,
/// imports, annotations.
pub fn strip_typescript(src: &str) -> String {
    let out = EXPORT_DEFAULT.replace_all(src, "exports.default = ");
    let out = EXPORT_DECLARATION.replace_all(&out, "${1} ");
    let out = IMPORT.replace_all(&out, "");
    ANNOTATION.replace_all(&out, "${1}").into_owned()
}
