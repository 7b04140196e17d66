//! Turning product descriptor source into a raw JSON object.
//!
//! Descriptor modules are written by people, for a TypeScript toolchain, so
//! some of them import helpers, call functions, or use syntax beyond plain
//! data. Extraction tries three strategies, most faithful first, and takes
//! the first one that yields an object:
//!
//! ```text
//! source ──► Module   evaluate the whole module (js.rs)
//!        └─► Literal  cut out the exported `{ ... }` and evaluate it alone (scan.rs)
//!        └─► Stripped regex-rewrite TS → JS, then evaluate the module (strip.rs)
//! ```
//!
//! A strategy that produces a non-object (an exported string, an array)
//! counts as failed. When all three fail, every tier's error is returned.

pub mod js;
pub mod scan;
pub mod strip;

pub use js::{Dialect, EvalError};

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Which strategy produced an extracted object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Module,
    Literal,
    Stripped,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Module => "module",
            Tier::Literal => "literal",
            Tier::Stripped => "stripped",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no `export default {{` or exported object literal")]
    NoLiteral,
    #[error("exported object literal has no closing brace")]
    Unbalanced,
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("exported value is {0}, not an object")]
    NotAnObject(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFailure {
    pub tier: Tier,
    pub error: ExtractError,
}

/// Every strategy failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", summarize(.failures))]
pub struct ExtractFailure {
    pub failures: Vec<TierFailure>,
}

fn summarize(failures: &[TierFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.tier, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub object: Map<String, Value>,
    pub tier: Tier,
}

/// JSON type name for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn object(value: Value) -> Result<Map<String, Value>, ExtractError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ExtractError::NotAnObject(kind_of(&other))),
    }
}

fn module_tier(source: &str, dialect: Dialect) -> Result<Map<String, Value>, ExtractError> {
    object(js::evaluate_module(source, dialect)?)
}

fn literal_tier(source: &str) -> Result<Map<String, Value>, ExtractError> {
    let literal = scan::exported_literal(source)?;
    object(js::evaluate_expression(literal, Dialect::JavaScript)?)
}

fn stripped_tier(source: &str) -> Result<Map<String, Value>, ExtractError> {
    let stripped = strip::strip_typescript(source);
    object(js::evaluate_module(&stripped, Dialect::JavaScript)?)
}

/// Extract the exported object from descriptor source.
pub fn extract_object(source: &str, dialect: Dialect) -> Result<Extracted, ExtractFailure> {
    let mut failures = Vec::new();
    for tier in [Tier::Module, Tier::Literal, Tier::Stripped] {
        let result = match tier {
            Tier::Module => module_tier(source, dialect),
            Tier::Literal => literal_tier(source),
            Tier::Stripped => stripped_tier(source),
        };
        match result {
            Ok(object) => return Ok(Extracted { object, tier }),
            Err(error) => failures.push(TierFailure { tier, error }),
        }
    }
    Err(ExtractFailure { failures })
}
