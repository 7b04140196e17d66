//! URL slugs and the spelling variants used to find product files.
//!
//! Product names embed decimal wavelengths ("1.5 µm", "2.0um") that cannot
//! appear literally in a URL-safe slug, and authors are not consistent about
//! how they spell them on disk: one category stores `1.5um-seed.ts`, another
//! a folder named `1-5um`. The URL always carries the hyphenated form, so the
//! resolver cannot know which spelling holds the data. It asks this module
//! for every plausible spelling and tries them in order.
//!
//! ## Normalization
//!
//! ```text
//! "Seed Lasers"          → "seed-lasers"
//! "1.0um-Single  Freq"   → "1-0um-single-freq"
//! "--Fiber__Amplifiers-" → "fiber-amplifiers"
//! ```
//!
//! ## Variants
//!
//! ```text
//! "1-5um-seed" → ["1-5um-seed", "1.5um-seed"]
//! "1.5um"      → ["1.5um", "1-5um"]
//! "laser-2"    → ["laser-2", "laser.2"]
//! ```

use regex::Regex;
use std::sync::LazyLock;

static DIGIT_HYPHEN_UM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)-(\d)um").expect("valid regex"));

/// Convert an arbitrary directory or file name into a URL-safe slug.
///
/// - Lowercases and trims the input
/// - Replaces every character outside `[a-z0-9-]` (whitespace included) with a dash
/// - Collapses consecutive dashes into one
/// - Strips leading and trailing dashes
///
/// Total and idempotent: `normalize_slug(&normalize_slug(x)) == normalize_slug(x)`.
pub fn normalize_slug(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut prev_dash = false;
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    slug.trim_matches('-').to_string()
}

/// Generate alternate spellings of a slug for file lookup.
///
/// The returned list always starts with the slug itself, contains no
/// duplicates and no empty strings, and is ordered by priority: candidate
/// files are probed variant by variant, so an earlier variant wins when
/// several spellings exist on disk.
pub fn slug_variants(slug: &str) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();
    push_unique(&mut variants, slug.to_string());
    // "1-5um" -> "1.5um"
    push_unique(
        &mut variants,
        DIGIT_HYPHEN_UM.replace_all(slug, "${1}.${2}um").into_owned(),
    );
    // "laser-2" -> "laser.2"
    push_unique(&mut variants, dot_last_digit(slug));

    // Dotted spellings back to hyphens, for slugs that arrive with dots
    for i in 0..variants.len() {
        let hyphenated = variants[i].replace('.', "-");
        push_unique(&mut variants, hyphenated);
    }

    variants
}

fn push_unique(variants: &mut Vec<String>, v: String) {
    if !v.is_empty() && !variants.contains(&v) {
        variants.push(v);
    }
}

/// Replace the final dash with a dot when a digit follows it.
fn dot_last_digit(slug: &str) -> String {
    match slug.rfind('-') {
        Some(pos)
            if slug[pos + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit()) =>
        {
            format!("{}.{}", &slug[..pos], &slug[pos + 1..])
        }
        _ => slug.to_string(),
    }
}

/// Derive a display title from a slug or raw name.
///
/// Dashes become spaces and every word character that starts a word is
/// uppercased: `"seed-lasers"` → `"Seed Lasers"`, `"1.5um-seed"` → `"1.5um Seed"`.
pub fn title_case(name: &str) -> String {
    let mut title = String::with_capacity(name.len());
    let mut prev_word = false;
    for c in name.chars() {
        let c = if c == '-' { ' ' } else { c };
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && !prev_word {
            title.push(c.to_ascii_uppercase());
        } else {
            title.push(c);
        }
        prev_word = is_word;
    }
    title
}
