//! Data-only evaluation of JavaScript and TypeScript source.
//!
//! Product descriptors are authored as TypeScript modules, but they are data:
//! object and array literals, strings, numbers, a few `const` bindings that
//! reference each other, an `export default`. This evaluator understands
//! exactly that subset and turns it into `serde_json::Value`, without a JS
//! engine and without running anything the author wrote.
//!
//! Supported expressions: object literals (shorthand properties, spreads,
//! quoted and numeric keys), array literals (spreads, holes), single- and
//! double-quoted strings with the full escape set, template literals with
//! `${...}` interpolation, numbers (decimal, exponent, hex/octal/binary,
//! `_` separators), `true`/`false`/`null`/`undefined`, parentheses, unary
//! `-`/`+`, binary `+`, member access (`a.b`, `a?.b`, `a[0]`) and identifier
//! references to earlier bindings.
//!
//! Supported statements (module mode): `import` (bindings become unresolvable
//! values), `const`/`let`/`var`, `export default`, `export const`,
//! `export { a as b }`, CommonJS `module.exports =` / `exports.x =`, and
//! directive strings. In the TypeScript dialect, type annotations, `type`
//! aliases, interfaces, `import type`, and `as`/`satisfies`/`!` suffixes are
//! skipped.
//!
//! Everything else (calls, functions, classes, JSX, operators beyond `+`)
//! is an error: the caller moves on to a cheaper extraction strategy.

use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Source language of a descriptor, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    JavaScript,
    TypeScript,
}

impl Dialect {
    /// `ts`/`tsx` → TypeScript, `js` → JavaScript (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ts" | "tsx" => Some(Self::TypeScript),
            "js" => Some(Self::JavaScript),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("unsupported {what} at byte {offset}")]
    Unsupported { offset: usize, what: String },
    #[error("`{0}` is not defined")]
    Undefined(String),
    #[error("`{name}` comes from module `{module}`, which cannot be loaded")]
    UnresolvedImport { name: String, module: String },
    #[error("cannot load module `{0}`")]
    ModuleNotFound(String),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("module has no exports")]
    NoExport,
}

/// Evaluate a whole module and return its exported value.
///
/// The default export wins, then a `module.exports` assignment, then the
/// first named export whose value is an object.
pub fn evaluate_module(src: &str, dialect: Dialect) -> Result<Value, EvalError> {
    let mut parser = Parser::new(src, dialect);
    parser.module()
}

/// Evaluate a single expression (typically an object literal) with no
/// bindings in scope. Trailing input other than whitespace, comments, and
/// semicolons is an error.
pub fn evaluate_expression(src: &str, dialect: Dialect) -> Result<Value, EvalError> {
    let mut parser = Parser::new(src, dialect);
    let value = parser.expression()?;
    loop {
        parser.skip_trivia()?;
        if !parser.eat(';') {
            break;
        }
    }
    if !parser.at_end() {
        return Err(parser.syntax("unexpected input after expression"));
    }
    Ok(value)
}

#[derive(Debug, Clone)]
enum Binding {
    Value(Value),
    Import { module: String },
}

#[derive(Debug, Default)]
struct Exports {
    default: Option<Value>,
    module: Option<Value>,
    named: Vec<(String, Value)>,
}

impl Exports {
    fn into_value(self) -> Result<Value, EvalError> {
        self.default
            .or(self.module)
            .or_else(|| {
                self.named
                    .into_iter()
                    .map(|(_, v)| v)
                    .find(Value::is_object)
            })
            .ok_or(EvalError::NoExport)
    }
}

/// Expression nesting the evaluator follows before giving up.
const MAX_DEPTH: usize = 128;

struct Parser<'s> {
    src: &'s str,
    pos: usize,
    dialect: Dialect,
    env: HashMap<String, Binding>,
    depth: usize,
}

fn is_id_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_id_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200c}' || c == '\u{200d}'
}

/// Number to value, keeping integers integral.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// JavaScript `Number.prototype.toString()`: positional notation between
/// `1e-7` and `1e21`, exponent form with an explicit sign outside it.
fn js_number(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    let Some(f) = n.as_f64() else {
        return n.to_string();
    };
    let abs = f.abs();
    if abs == 0.0 {
        return "0".to_string();
    }
    if (1e-7..1e21).contains(&abs) {
        return format!("{f}");
    }
    let exp = format!("{f:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

/// JavaScript `String(value)` for the values this evaluator produces.
fn to_js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => js_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => to_js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

impl<'s> Parser<'s> {
    fn new(src: &'s str, dialect: Dialect) -> Self {
        Self {
            src,
            pos: 0,
            dialect,
            env: HashMap::new(),
            depth: 0,
        }
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), EvalError> {
        self.skip_trivia()?;
        if self.eat(c) {
            Ok(())
        } else if self.at_end() {
            Err(EvalError::UnexpectedEof)
        } else {
            Err(self.syntax(format!("expected `{c}`")))
        }
    }

    fn syntax(&self, message: impl Into<String>) -> EvalError {
        EvalError::Syntax {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn unsupported(&self, what: impl Into<String>) -> EvalError {
        EvalError::Unsupported {
            offset: self.pos,
            what: what.into(),
        }
    }

    /// Skip whitespace and comments. Returns whether a line break was crossed.
    fn skip_trivia(&mut self) -> Result<bool, EvalError> {
        let mut crossed = false;
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                    if matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
                        crossed = true;
                    }
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => match self.rest().find('\n') {
                    Some(end) => self.pos += end,
                    None => self.pos = self.src.len(),
                },
                Some('/') if self.peek_second() == Some('*') => {
                    let Some(end) = self.rest()[2..].find("*/") else {
                        return Err(self.syntax("unterminated block comment"));
                    };
                    if self.rest()[2..2 + end].contains('\n') {
                        crossed = true;
                    }
                    self.pos += end + 4;
                }
                _ => return Ok(crossed),
            }
        }
    }

    /// The identifier at the cursor, without consuming it.
    fn peek_ident(&self) -> Option<&'s str> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        let (_, first) = chars.next()?;
        if !is_id_start(first) {
            return None;
        }
        let end = chars
            .find(|&(_, c)| !is_id_continue(c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        Some(&rest[..end])
    }

    fn ident(&mut self) -> Result<&'s str, EvalError> {
        self.skip_trivia()?;
        match self.peek_ident() {
            Some(name) => {
                self.pos += name.len();
                Ok(name)
            }
            None if self.at_end() => Err(EvalError::UnexpectedEof),
            None => Err(self.syntax("expected identifier")),
        }
    }

    fn peek_keyword(&self, kw: &str) -> bool {
        self.peek_ident() == Some(kw)
    }

    fn keyword(&mut self, kw: &str) -> bool {
        if self.peek_keyword(kw) {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    /// Whether the identifier after the one at the cursor starts an
    /// identifier, `{`, or `*` (distinguishes `type Foo` from `type = 1`).
    fn keyword_followed_by_name(&self, kw: &str) -> bool {
        if !self.peek_keyword(kw) {
            return false;
        }
        let after = self.rest()[kw.len()..].trim_start();
        after
            .chars()
            .next()
            .is_some_and(|c| is_id_start(c) || c == '{' || c == '*')
            && !after.starts_with("from ")
            && !after.starts_with("from\"")
            && !after.starts_with("from'")
    }

    /// Consume an optional `;`. A missing one is fine at a line break, `}`,
    /// or end of input (automatic semicolon insertion).
    fn end_statement(&mut self) -> Result<(), EvalError> {
        let crossed = self.skip_trivia()?;
        if self.eat(';') || crossed || self.at_end() || self.peek() == Some('}') {
            Ok(())
        } else {
            Err(self.syntax("expected `;`"))
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn module(&mut self) -> Result<Value, EvalError> {
        let mut exports = Exports::default();
        loop {
            self.skip_trivia()?;
            if self.at_end() {
                break;
            }
            if self.eat(';') {
                continue;
            }
            if matches!(self.peek(), Some('\'' | '"')) {
                // Directive prologue ("use strict")
                self.string()?;
                self.end_statement()?;
                continue;
            }
            let Some(word) = self.peek_ident() else {
                return Err(self.unsupported("statement"));
            };
            match word {
                "import" => self.import_declaration()?,
                "export" => self.export_declaration(&mut exports)?,
                "const" | "let" | "var" => {
                    self.pos += word.len();
                    self.declarations()?;
                }
                "type" | "interface"
                    if self.dialect == Dialect::TypeScript
                        && self.keyword_followed_by_name(word) =>
                {
                    self.type_declaration()?
                }
                "module" | "exports" => self.commonjs_assignment(&mut exports)?,
                other => return Err(self.unsupported(format!("`{other}` statement"))),
            }
        }
        exports.into_value()
    }

    fn import_declaration(&mut self) -> Result<(), EvalError> {
        self.keyword("import");
        self.skip_trivia()?;

        if matches!(self.peek(), Some('\'' | '"')) {
            let module = self.string()?;
            return Err(EvalError::ModuleNotFound(module));
        }

        let type_only =
            self.dialect == Dialect::TypeScript && self.keyword_followed_by_name("type");
        if type_only {
            self.keyword("type");
        }

        let mut bindings: Vec<&'s str> = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.keyword("from") {
                break;
            }
            if self.eat('*') {
                self.skip_trivia()?;
                if !self.keyword("as") {
                    return Err(self.syntax("expected `as`"));
                }
                bindings.push(self.ident()?);
            } else if self.eat('{') {
                self.import_specifiers(&mut bindings)?;
            } else if self.eat(',') {
                continue;
            } else {
                bindings.push(self.ident()?);
            }
        }
        self.skip_trivia()?;
        let module = self.string()?;
        self.end_statement()?;

        if type_only {
            return Ok(());
        }
        if self.dialect == Dialect::JavaScript {
            // Plain JavaScript loads the module immediately
            return Err(EvalError::ModuleNotFound(module));
        }
        for name in bindings {
            self.env.insert(
                name.to_string(),
                Binding::Import {
                    module: module.clone(),
                },
            );
        }
        Ok(())
    }

    /// `{ a, b as c, type D }` after the opening brace.
    fn import_specifiers(&mut self, bindings: &mut Vec<&'s str>) -> Result<(), EvalError> {
        loop {
            self.skip_trivia()?;
            if self.eat('}') {
                return Ok(());
            }
            let type_spec = self.dialect == Dialect::TypeScript && {
                let save = self.pos;
                let is_type = self.keyword("type")
                    && self.skip_trivia().is_ok()
                    && self.peek().is_some_and(is_id_start);
                self.pos = save;
                is_type
            };
            if type_spec {
                self.keyword("type");
            }
            let mut local = if matches!(self.peek(), Some('\'' | '"')) {
                // `import { "a-b" as c }`
                None
            } else {
                Some(self.ident()?)
            };
            if local.is_none() {
                self.string()?;
            }
            self.skip_trivia()?;
            if self.keyword("as") {
                local = Some(self.ident()?);
            }
            if !type_spec && let Some(name) = local {
                bindings.push(name);
            }
            self.skip_trivia()?;
            if !self.eat(',') {
                self.expect('}')?;
                return Ok(());
            }
        }
    }

    fn export_declaration(&mut self, exports: &mut Exports) -> Result<(), EvalError> {
        self.keyword("export");
        self.skip_trivia()?;

        if self.keyword("default") {
            self.skip_trivia()?;
            for kw in ["function", "class", "async"] {
                if self.peek_keyword(kw) {
                    return Err(self.unsupported(format!("`export default {kw}`")));
                }
            }
            if self.dialect == Dialect::TypeScript && self.keyword_followed_by_name("interface") {
                return self.type_declaration();
            }
            let value = self.expression()?;
            self.end_statement()?;
            exports.default = Some(value);
            return Ok(());
        }

        if let Some(word @ ("const" | "let" | "var")) = self.peek_ident() {
            self.pos += word.len();
            for name in self.declarations()? {
                if let Some(Binding::Value(value)) = self.env.get(&name) {
                    exports.named.push((name.clone(), value.clone()));
                }
            }
            return Ok(());
        }

        if self.dialect == Dialect::TypeScript {
            if self.keyword_followed_by_name("interface") {
                return self.type_declaration();
            }
            if self.keyword_followed_by_name("type") {
                let type_start = self.pos;
                self.keyword("type");
                self.skip_trivia()?;
                if self.peek() == Some('{') {
                    // `export type { A, B }`
                    self.skip_type(&[])?;
                    self.skip_trivia()?;
                    if self.keyword("from") {
                        self.skip_trivia()?;
                        self.string()?;
                    }
                    return self.end_statement();
                }
                self.pos = type_start;
                return self.type_declaration();
            }
        }

        if self.eat('{') {
            return self.export_list(exports);
        }
        if self.eat('*') {
            self.skip_trivia()?;
            if self.keyword("as") {
                self.ident()?;
                self.skip_trivia()?;
            }
            if !self.keyword("from") {
                return Err(self.syntax("expected `from`"));
            }
            self.skip_trivia()?;
            let module = self.string()?;
            return Err(EvalError::ModuleNotFound(module));
        }

        match self.peek_ident() {
            Some(word) => Err(self.unsupported(format!("`export {word}`"))),
            None => Err(self.syntax("expected declaration after `export`")),
        }
    }

    /// `export { a, b as c }` after the opening brace.
    fn export_list(&mut self, exports: &mut Exports) -> Result<(), EvalError> {
        let mut pairs: Vec<(&'s str, &'s str)> = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat('}') {
                break;
            }
            let local = self.ident()?;
            self.skip_trivia()?;
            let exported = if self.keyword("as") {
                self.ident()?
            } else {
                local
            };
            pairs.push((local, exported));
            self.skip_trivia()?;
            if !self.eat(',') {
                self.expect('}')?;
                break;
            }
        }
        self.skip_trivia()?;
        if self.keyword("from") {
            self.skip_trivia()?;
            let module = self.string()?;
            return Err(EvalError::ModuleNotFound(module));
        }
        self.end_statement()?;

        for (local, exported) in pairs {
            let value = self.lookup(local)?;
            if exported == "default" {
                exports.default = Some(value);
            } else {
                exports.named.push((exported.to_string(), value));
            }
        }
        Ok(())
    }

    /// `NAME (: Type)? (= expr)? (, ...)*` after `const`/`let`/`var`.
    fn declarations(&mut self) -> Result<Vec<String>, EvalError> {
        let mut names = Vec::new();
        loop {
            self.skip_trivia()?;
            if matches!(self.peek(), Some('{' | '[')) {
                return Err(self.unsupported("destructuring declaration"));
            }
            let name = self.ident()?.to_string();
            let mut save = self.pos;
            self.skip_trivia()?;
            if self.dialect == Dialect::TypeScript && self.eat('!') {
                save = self.pos;
                self.skip_trivia()?;
            }
            if self.peek() == Some(':') {
                if self.dialect == Dialect::JavaScript {
                    return Err(self.syntax("type annotation in JavaScript"));
                }
                self.bump();
                self.skip_type(&['='])?;
                save = self.pos;
                self.skip_trivia()?;
            }
            let value = if self.peek() == Some('=') && self.peek_second() != Some('=') {
                self.bump();
                self.expression()?
            } else {
                // `let x` with no initializer; the line break ends the statement
                self.pos = save;
                Value::Null
            };
            self.env.insert(name.clone(), Binding::Value(value));
            names.push(name);

            let save = self.pos;
            self.skip_trivia()?;
            if !self.eat(',') {
                self.pos = save;
                break;
            }
        }
        self.end_statement()?;
        Ok(names)
    }

    /// `type Name<..> = ...` or `interface Name<..> extends .. { ... }`.
    fn type_declaration(&mut self) -> Result<(), EvalError> {
        if self.keyword("type") {
            self.skip_type(&['='])?;
            self.expect('=')?;
            self.skip_type(&[])?;
            return self.end_statement();
        }
        self.keyword("interface");
        // Header up to the body; generic defaults may contain braces
        let mut angle = 0usize;
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('{') if angle == 0 => break,
                Some('\'' | '"') => {
                    self.string()?;
                }
                Some('{') => {
                    self.skip_type(&[])?;
                }
                Some(c) => {
                    match c {
                        '<' => angle += 1,
                        '>' => angle = angle.saturating_sub(1),
                        _ => {}
                    }
                    self.bump();
                }
                None => return Err(EvalError::UnexpectedEof),
            }
        }
        self.skip_type(&[])?;
        self.end_statement()
    }

    /// `module.exports = ...`, `exports.default = ...`, `exports.name = ...`.
    fn commonjs_assignment(&mut self, exports: &mut Exports) -> Result<(), EvalError> {
        let mut target = vec![self.ident()?];
        loop {
            self.skip_trivia()?;
            if !self.eat('.') {
                break;
            }
            target.push(self.ident()?);
        }
        self.skip_trivia()?;
        if self.peek() != Some('=') || self.peek_second() == Some('=') {
            return Err(self.unsupported("expression statement"));
        }
        self.bump();
        let value = self.expression()?;
        self.end_statement()?;

        match target.as_slice() {
            ["module", "exports"] => exports.module = Some(value),
            ["exports", "default"] | ["module", "exports", "default"] => {
                exports.default = Some(value)
            }
            ["exports", name] | ["module", "exports", name] => {
                exports.named.push((name.to_string(), value))
            }
            _ => return Err(self.unsupported(format!("assignment to `{}`", target.join(".")))),
        }
        Ok(())
    }

    // =========================================================================
    // Types (TypeScript only; skipped, never interpreted)
    // =========================================================================

    /// Skip a type. Stops before an unmatched closer, `;` or `,` at depth
    /// zero, any character in `stop` at depth zero, or a line break that
    /// leaves the type complete.
    fn skip_type(&mut self, stop: &[char]) -> Result<(), EvalError> {
        let mut depth = 0usize;
        // A type is incomplete right after an operator such as `|` or `=>`
        let mut pending = true;
        loop {
            // Trivia after the type belongs to the caller: `end_statement`
            // needs to see the line break that ends it
            let before = self.pos;
            let crossed = self.skip_trivia()?;
            let Some(c) = self.peek() else {
                self.pos = before;
                return Ok(());
            };
            let arrow = c == '=' && self.peek_second() == Some('>');
            if depth == 0 {
                let complete = crossed && !pending && c != '|' && c != '&';
                let closer = matches!(c, ')' | ']' | '}' | '>' | ';' | ',');
                if complete || closer || (stop.contains(&c) && !arrow) {
                    self.pos = before;
                    return Ok(());
                }
            }
            match c {
                '(' | '[' | '{' | '<' => {
                    depth += 1;
                    self.bump();
                    pending = true;
                }
                ')' | ']' | '}' | '>' => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                    pending = false;
                }
                '=' if arrow => {
                    self.pos += 2;
                    pending = true;
                }
                '\'' | '"' => {
                    self.string()?;
                    pending = false;
                }
                '`' => {
                    self.skip_template_type()?;
                    pending = false;
                }
                c if is_id_start(c) || c.is_ascii_digit() => {
                    let word = match self.peek_ident() {
                        Some(w) => w,
                        None => {
                            let len = self
                                .rest()
                                .find(|ch: char| !ch.is_ascii_alphanumeric() && ch != '.')
                                .unwrap_or(self.rest().len());
                            &self.rest()[..len]
                        }
                    };
                    self.pos += word.len();
                    pending = matches!(
                        word,
                        "keyof" | "typeof" | "extends" | "infer" | "is" | "readonly" | "unique"
                            | "new" | "asserts"
                    );
                }
                _ => {
                    self.bump();
                    pending = true;
                }
            }
        }
    }

    /// Skip a template literal type such as `` `px-${number}` ``.
    fn skip_template_type(&mut self) -> Result<(), EvalError> {
        self.bump();
        let mut braces = 0usize;
        loop {
            match self.bump() {
                None => return Err(EvalError::UnexpectedEof),
                Some('\\') => {
                    self.bump();
                }
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    braces += 1;
                }
                Some('}') if braces > 0 => braces -= 1,
                Some('`') if braces == 0 => return Ok(()),
                Some(_) => {}
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expression(&mut self) -> Result<Value, EvalError> {
        let mut value = self.unary()?;
        loop {
            let save = self.pos;
            self.skip_trivia()?;
            let start = self.pos;
            if self.peek() == Some('+') && !matches!(self.peek_second(), Some('+' | '=')) {
                self.bump();
                let rhs = self.unary()?;
                value = match (value, rhs) {
                    (Value::Number(a), Value::Number(b)) => number_value(
                        a.as_f64().unwrap_or(f64::NAN) + b.as_f64().unwrap_or(f64::NAN),
                    ),
                    (a @ Value::String(_), b) | (a, b @ Value::String(_)) => {
                        Value::String(to_js_string(&a) + &to_js_string(&b))
                    }
                    _ => {
                        return Err(EvalError::Unsupported {
                            offset: start,
                            what: "non-string, non-number `+`".to_string(),
                        });
                    }
                };
                continue;
            }
            if self.dialect == Dialect::TypeScript
                && (self.keyword("as") || self.keyword("satisfies"))
            {
                self.skip_type(&['='])?;
                continue;
            }
            self.pos = save;
            return Ok(value);
        }
    }

    /// Every nested expression passes through here, so this is where
    /// depth is bounded.
    fn unary(&mut self) -> Result<Value, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.unsupported("nesting depth"));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<Value, EvalError> {
        self.skip_trivia()?;
        let start = self.pos;
        if self.eat('-') {
            return match self.unary()? {
                Value::Number(n) => Ok(match n.as_i64() {
                    Some(i) if i != 0 => Value::from(-i),
                    _ => number_value(-n.as_f64().unwrap_or(f64::NAN)),
                }),
                _ => Err(EvalError::Unsupported {
                    offset: start,
                    what: "unary `-` on a non-number".to_string(),
                }),
            };
        }
        if self.eat('+') {
            return match self.unary()? {
                n @ Value::Number(_) => Ok(n),
                _ => Err(EvalError::Unsupported {
                    offset: start,
                    what: "unary `+` on a non-number".to_string(),
                }),
            };
        }
        let value = self.primary()?;
        self.postfix(value)
    }

    fn postfix(&mut self, mut value: Value) -> Result<Value, EvalError> {
        loop {
            let save = self.pos;
            self.skip_trivia()?;
            if self.rest().starts_with("?.") && !self.rest()[2..].starts_with(|c: char| c.is_ascii_digit()) {
                self.pos += 2;
                if self.peek() == Some('[') {
                    self.bump();
                    value = self.index(value)?;
                } else {
                    let name = self.ident()?;
                    value = member(&value, name);
                }
            } else if self.peek() == Some('.') && !self.rest().starts_with("...") {
                self.bump();
                let name = self.ident()?;
                value = member(&value, name);
            } else if self.peek() == Some('[') {
                self.bump();
                value = self.index(value)?;
            } else if self.peek() == Some('(') {
                return Err(self.unsupported("call expression"));
            } else if self.dialect == Dialect::TypeScript
                && self.peek() == Some('!')
                && self.peek_second() != Some('=')
            {
                self.bump();
            } else {
                self.pos = save;
                return Ok(value);
            }
        }
    }

    /// `value[expr]` after the opening bracket.
    fn index(&mut self, value: Value) -> Result<Value, EvalError> {
        let key = self.expression()?;
        self.expect(']')?;
        let key = match key {
            Value::Number(n) => js_number(&n),
            Value::String(s) => s,
            other => to_js_string(&other),
        };
        Ok(member(&value, &key))
    }

    fn primary(&mut self) -> Result<Value, EvalError> {
        self.skip_trivia()?;
        let Some(c) = self.peek() else {
            return Err(EvalError::UnexpectedEof);
        };
        match c {
            '{' => self.object(),
            '[' => self.array(),
            '\'' | '"' => self.string().map(Value::String),
            '`' => self.template().map(Value::String),
            '(' => {
                self.bump();
                let value = self.expression()?;
                self.expect(')')?;
                Ok(value)
            }
            '.' if self.peek_second().is_some_and(|d| d.is_ascii_digit()) => self.number(),
            c if c.is_ascii_digit() => self.number(),
            c if is_id_start(c) => {
                let start = self.pos;
                let name = self.ident()?;
                match name {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" | "undefined" | "NaN" | "Infinity" => Ok(Value::Null),
                    "function" | "class" | "new" | "async" | "await" | "yield" | "this"
                    | "typeof" | "void" | "delete" => Err(EvalError::Unsupported {
                        offset: start,
                        what: format!("`{name}` expression"),
                    }),
                    _ => {
                        let save = self.pos;
                        self.skip_trivia()?;
                        if self.rest().starts_with("=>") {
                            return Err(self.unsupported("arrow function"));
                        }
                        self.pos = save;
                        self.lookup(name)
                    }
                }
            }
            '<' => Err(self.unsupported("JSX or type assertion")),
            other => Err(self.syntax(format!("unexpected `{other}`"))),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        match self.env.get(name) {
            Some(Binding::Value(value)) => Ok(value.clone()),
            Some(Binding::Import { module }) => Err(EvalError::UnresolvedImport {
                name: name.to_string(),
                module: module.clone(),
            }),
            None => Err(EvalError::Undefined(name.to_string())),
        }
    }

    fn object(&mut self) -> Result<Value, EvalError> {
        self.bump();
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            if self.eat('}') {
                break;
            }
            if self.eat_str("...") {
                match self.expression()? {
                    Value::Object(spread) => map.extend(spread),
                    Value::Array(items) => {
                        for (i, item) in items.into_iter().enumerate() {
                            map.insert(i.to_string(), item);
                        }
                    }
                    Value::String(s) => {
                        for (i, ch) in s.chars().enumerate() {
                            map.insert(i.to_string(), Value::String(ch.to_string()));
                        }
                    }
                    // Spreading null, booleans, or numbers adds nothing
                    _ => {}
                }
            } else {
                let key_start = self.pos;
                let (key, shorthand_ok) = match self.peek() {
                    Some('\'' | '"') => (self.string()?, false),
                    Some(c) if c.is_ascii_digit() || c == '.' => {
                        (to_js_string(&self.number()?), false)
                    }
                    Some('[') => return Err(self.unsupported("computed property key")),
                    Some(c) if is_id_start(c) => (self.ident()?.to_string(), true),
                    Some(c) => return Err(self.syntax(format!("unexpected `{c}` in object"))),
                    None => return Err(EvalError::UnexpectedEof),
                };
                self.skip_trivia()?;
                if self.eat(':') {
                    let value = self.expression()?;
                    map.insert(key, value);
                } else if self.peek() == Some('(') {
                    return Err(self.unsupported("method definition"));
                } else if shorthand_ok && matches!(self.peek(), Some(',' | '}')) {
                    let value = self.lookup(&key)?;
                    map.insert(key, value);
                } else {
                    return Err(EvalError::Syntax {
                        offset: key_start,
                        message: format!("expected `:` after `{key}`"),
                    });
                }
            }
            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                break;
            }
            return Err(if self.at_end() {
                EvalError::UnexpectedEof
            } else {
                self.syntax("expected `,` or `}` in object")
            });
        }
        Ok(Value::Object(map))
    }

    fn array(&mut self) -> Result<Value, EvalError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat(']') {
                break;
            }
            if self.eat(',') {
                // Hole
                items.push(Value::Null);
                continue;
            }
            if self.eat_str("...") {
                let start = self.pos;
                match self.expression()? {
                    Value::Array(spread) => items.extend(spread),
                    Value::String(s) => {
                        items.extend(s.chars().map(|ch| Value::String(ch.to_string())))
                    }
                    _ => {
                        return Err(EvalError::Unsupported {
                            offset: start,
                            what: "spread of a non-iterable".to_string(),
                        });
                    }
                }
            } else {
                items.push(self.expression()?);
            }
            self.skip_trivia()?;
            if self.eat(',') {
                continue;
            }
            if self.eat(']') {
                break;
            }
            return Err(if self.at_end() {
                EvalError::UnexpectedEof
            } else {
                self.syntax("expected `,` or `]` in array")
            });
        }
        Ok(Value::Array(items))
    }

    fn string(&mut self) -> Result<String, EvalError> {
        let start = self.pos;
        let quote = self.bump().ok_or(EvalError::UnexpectedEof)?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(EvalError::Syntax {
                        offset: start,
                        message: "unterminated string".to_string(),
                    });
                }
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some('\n' | '\r') => {
                    return Err(EvalError::Syntax {
                        offset: start,
                        message: "line break in string literal".to_string(),
                    });
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn template(&mut self) -> Result<String, EvalError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(EvalError::Syntax {
                        offset: start,
                        message: "unterminated template literal".to_string(),
                    });
                }
                Some('`') => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    let value = self.expression()?;
                    self.expect('}')?;
                    out.push_str(&to_js_string(&value));
                }
                Some('\r') => {
                    self.eat('\n');
                    out.push('\n');
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Decode one escape sequence (the backslash is already consumed).
    fn escape(&mut self, out: &mut String) -> Result<(), EvalError> {
        let c = self.bump().ok_or(EvalError::UnexpectedEof)?;
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !self.peek().is_some_and(|d| d.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.hex_digits(2)?;
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            'u' => {
                let code = self.unicode_escape()?;
                if (0xd800..0xdc00).contains(&code) {
                    // High surrogate: pair with a following `\uDC00`-`\uDFFF`
                    let save = self.pos;
                    if self.eat_str("\\u") {
                        let low = self.unicode_escape()?;
                        if (0xdc00..0xe000).contains(&low) {
                            let combined = 0x10000 + ((code - 0xd800) << 10) + (low - 0xdc00);
                            out.push(char::from_u32(combined).unwrap_or('\u{fffd}'));
                            return Ok(());
                        }
                    }
                    self.pos = save;
                    out.push('\u{fffd}');
                } else {
                    out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                }
            }
            '\r' => {
                self.eat('\n');
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
        Ok(())
    }

    /// `XXXX` or `{X...}` after `\u`.
    fn unicode_escape(&mut self) -> Result<u32, EvalError> {
        if self.eat('{') {
            let len = self
                .rest()
                .find('}')
                .ok_or_else(|| self.syntax("unterminated unicode escape"))?;
            let code = u32::from_str_radix(&self.rest()[..len], 16)
                .map_err(|_| self.syntax("invalid unicode escape"))?;
            self.pos += len + 1;
            Ok(code)
        } else {
            self.hex_digits(4)
        }
    }

    fn hex_digits(&mut self, n: usize) -> Result<u32, EvalError> {
        let digits = self
            .rest()
            .get(..n)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.syntax("invalid hex escape"))?;
        let code = u32::from_str_radix(digits, 16).map_err(|_| self.syntax("invalid hex escape"))?;
        self.pos += n;
        Ok(code)
    }

    fn number(&mut self) -> Result<Value, EvalError> {
        let start = self.pos;
        let rest = self.rest();
        let radix = match rest.get(..2) {
            Some("0x" | "0X") => Some(16),
            Some("0o" | "0O") => Some(8),
            Some("0b" | "0B") => Some(2),
            _ => None,
        };

        let value = if let Some(radix) = radix {
            self.pos += 2;
            let len = self
                .rest()
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .unwrap_or(self.rest().len());
            let digits: String = self.rest()[..len].chars().filter(|&c| c != '_').collect();
            self.pos += len;
            let n = u64::from_str_radix(&digits, radix).map_err(|_| EvalError::Syntax {
                offset: start,
                message: "invalid number".to_string(),
            })?;
            number_value(n as f64)
        } else {
            let mut end = 0;
            let bytes = rest.as_bytes();
            let digits = |i: &mut usize| {
                while *i < bytes.len() && (bytes[*i].is_ascii_digit() || bytes[*i] == b'_') {
                    *i += 1;
                }
            };
            digits(&mut end);
            if end < bytes.len() && bytes[end] == b'.' {
                end += 1;
                digits(&mut end);
            }
            if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
                let mut exp = end + 1;
                if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
                    exp += 1;
                }
                if exp < bytes.len() && bytes[exp].is_ascii_digit() {
                    end = exp;
                    digits(&mut end);
                }
            }
            let text: String = rest[..end].chars().filter(|&c| c != '_').collect();
            self.pos += end;
            let n: f64 = text.parse().map_err(|_| EvalError::Syntax {
                offset: start,
                message: format!("invalid number `{text}`"),
            })?;
            number_value(n)
        };

        if self.peek() == Some('n') {
            return Err(self.unsupported("BigInt literal"));
        }
        if self.peek().is_some_and(is_id_start) {
            return Err(self.syntax("identifier directly after number"));
        }
        Ok(value)
    }
}

/// Property access on an evaluated value; missing properties are `null`.
fn member(value: &Value, name: &str) -> Value {
    match value {
        Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
        Value::Array(items) if name == "length" => Value::from(items.len()),
        Value::Array(items) => name
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Null),
        Value::String(s) if name == "length" => Value::from(s.encode_utf16().count()),
        _ => Value::Null,
    }
}
