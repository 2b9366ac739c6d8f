//! JSON-with-comments support
//!
//! devcontainer.json files may contain `//` and `/* */` comments and trailing
//! commas. [`standardize`] rewrites such text into strict JSON; comments turn
//! into whitespace so line and column positions in parse errors still point at
//! the input text.

use crate::error::MergeError;
use serde_json::Value;
use std::path::Path;

/// Strip comments and trailing commas, producing strict JSON text
pub fn standardize(input: &str) -> Result<String, &'static str> {
    let without_comments = strip_comments(input)?;
    Ok(strip_trailing_commas(&without_comments))
}

/// Parse JSON-with-comments text into a value
pub fn parse(input: &str, path: &Path) -> Result<Value, MergeError> {
    let standard = standardize(input).map_err(|message| MergeError::json_parse(path, message))?;
    serde_json::from_str(&standard).map_err(|e| MergeError::json_parse(path, e.to_string()))
}

fn strip_comments(input: &str) -> Result<String, &'static str> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                chars.next();
                out.push_str("  ");
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                    out.push(blank(next));
                }
            }
            ('/', Some('*')) => {
                chars.next();
                out.push_str("  ");
                let mut closed = false;
                while let Some(next) = chars.next() {
                    if next == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        out.push_str("  ");
                        closed = true;
                        break;
                    }
                    out.push(blank(next));
                }
                if !closed {
                    return Err("unterminated block comment");
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Keep newlines so error positions survive, blank everything else
fn blank(c: char) -> char {
    if c == '\n' || c == '\r' {
        c
    } else {
        ' '
    }
}

/// Blank out commas whose next significant character closes a container
fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    let mut in_string = false;
    // Byte offset in `out` of the last comma not yet followed by a value
    let mut pending_comma: Option<usize> = None;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        if c.is_whitespace() {
            out.push(c);
            continue;
        }

        if let Some(at) = pending_comma.take() {
            if c == '}' || c == ']' {
                out.replace_range(at..at + 1, " ");
            }
        }
        match c {
            '"' => in_string = true,
            ',' => pending_comma = Some(out.len()),
            _ => {}
        }
        out.push(c);
    }

    out
}
