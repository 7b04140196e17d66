//! Locating the exported object literal in a module's text.
//!
//! Used when the module as a whole cannot be evaluated (it calls helpers,
//! imports values, uses syntax the evaluator does not know). The exported
//! object literal is cut out of the text by brace matching and evaluated on
//! its own.
//!
//! Brace matching tracks string, template, and comment context, so braces
//! inside `"..."`, `'...'`, `` `...` ``, `// ...`, and `/* ... */` do not
//! count, while braces inside a template's `${...}` do.

use super::ExtractError;
use regex::Regex;
use std::sync::LazyLock;

static EXPORT_DEFAULT_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"export\s+default\s*\{").expect("valid regex"));

static EXPORT_BINDING_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export\s+(?:const|let|var)\s+[A-Za-z0-9_$]+(?:\s*:\s*[^{=]+)?\s*=\s*\{")
        .expect("valid regex")
});

/// Byte offset of the `{` opening the exported object literal.
///
/// An `export default` directly followed by `{` wins; otherwise the first
/// `export const|let|var NAME (: Type)? = {`.
pub fn export_literal_start(src: &str) -> Option<usize> {
    EXPORT_DEFAULT_OBJECT
        .find(src)
        .or_else(|| EXPORT_BINDING_OBJECT.find(src))
        .map(|m| m.end() - 1)
}

#[derive(Clone, Copy)]
enum State {
    Code,
    Single,
    Double,
    Template,
    LineComment,
    BlockComment,
}

/// Byte offset of the `}` matching the `{` at `open`.
pub fn matching_brace(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    // One entry per open context: code braces and `${` nest inside templates
    let mut stack: Vec<State> = vec![State::Code];
    let mut depth_stack: Vec<usize> = vec![0];
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        let state = *stack.last()?;
        match state {
            State::Code => match b {
                b'{' => *depth_stack.last_mut()? += 1,
                b'}' => {
                    let depth = depth_stack.last_mut()?;
                    *depth -= 1;
                    if *depth == 0 {
                        if stack.len() == 1 {
                            return Some(i);
                        }
                        // Closing a `${` interpolation: back to the template
                        stack.pop();
                        depth_stack.pop();
                    }
                }
                b'\'' => stack.push(State::Single),
                b'"' => stack.push(State::Double),
                b'`' => stack.push(State::Template),
                b'/' if next == Some(b'/') => {
                    stack.push(State::LineComment);
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    stack.push(State::BlockComment);
                    i += 1;
                }
                _ => {}
            },
            State::Single | State::Double => match b {
                b'\\' => i += 1,
                b'\'' if matches!(state, State::Single) => {
                    stack.pop();
                }
                b'"' if matches!(state, State::Double) => {
                    stack.pop();
                }
                b'\n' => {
                    stack.pop();
                }
                _ => {}
            },
            State::Template => match b {
                b'\\' => i += 1,
                b'`' => {
                    stack.pop();
                }
                b'$' if next == Some(b'{') => {
                    stack.push(State::Code);
                    depth_stack.push(1);
                    i += 1;
                }
                _ => {}
            },
            State::LineComment => {
                if b == b'\n' {
                    stack.pop();
                }
            }
            State::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    stack.pop();
                    i += 1;
                }
            }
        }
        i += 1;
    }
    None
}

/// The exported object literal's text, braces included.
pub fn exported_literal(src: &str) -> Result<&str, ExtractError> {
    let open = export_literal_start(src).ok_or(ExtractError::NoLiteral)?;
    let close = matching_brace(src, open).ok_or(ExtractError::Unbalanced)?;
    Ok(&src[open..=close])
}
