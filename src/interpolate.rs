//! Placeholder interpolation
//!
//! Templates reference other keys as `{name}`. `{{` and `}}` stand for literal braces,
//! and the older `%(name)s` form is still understood. Anything that does not parse
//! as a placeholder is kept as literal text, so strftime patterns and brace-heavy
//! server configs pass through untouched.

use crate::error::ResolveError;
use crate::value::Value;
use tracing::debug;

/// What to do when a placeholder names a key that cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnMissing {
    /// Return the raw template unchanged
    #[default]
    Leave,
    /// Raise `InterpolationFailure`
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Length of a placeholder name starting at `s`, if one ends with `terminator`.
fn name_len(s: &str, terminator: &str) -> Option<usize> {
    let len = s.find(|c: char| !is_name_char(c)).unwrap_or(s.len());
    if len > 0 && s[len..].starts_with(terminator) {
        Some(len)
    } else {
        None
    }
}

fn flush<'a>(tokens: &mut Vec<Token<'a>>, template: &'a str, from: usize, to: usize) {
    if to > from {
        tokens.push(Token::Text(&template[from..to]));
    }
}

/// Split a template into literal text and placeholder names.
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < template.len() {
        let rest = &template[i..];
        if rest.starts_with("{{") || rest.starts_with("}}") {
            flush(&mut tokens, template, literal_start, i);
            tokens.push(Token::Text(&template[i..i + 1]));
            i += 2;
            literal_start = i;
        } else if rest.starts_with('{') {
            match name_len(&rest[1..], "}") {
                Some(len) => {
                    flush(&mut tokens, template, literal_start, i);
                    tokens.push(Token::Placeholder(&rest[1..1 + len]));
                    i += len + 2;
                    literal_start = i;
                }
                None => i += 1,
            }
        } else if rest.starts_with("%(") {
            match name_len(&rest[2..], ")s") {
                Some(len) => {
                    flush(&mut tokens, template, literal_start, i);
                    tokens.push(Token::Placeholder(&rest[2..2 + len]));
                    i += len + 4;
                    literal_start = i;
                }
                None => i += 1,
            }
        } else {
            i += rest.chars().next().map(char::len_utf8).unwrap_or(1);
        }
    }
    flush(&mut tokens, template, literal_start, template.len());
    tokens
}

/// Substitute every placeholder in `template` using `lookup`.
///
/// `key` only labels errors and trace output. A `MissingKey` from `lookup` is handled
/// per `on_missing`; every other error propagates.
pub fn render<F>(
    key: &str,
    template: &str,
    on_missing: OnMissing,
    mut lookup: F,
) -> Result<String, ResolveError>
where
    F: FnMut(&str) -> Result<Value, ResolveError>,
{
    let mut out = String::with_capacity(template.len());
    for token in tokenize(template) {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Placeholder(name) => match lookup(name) {
                Ok(value) => out.push_str(&value.to_string()),
                Err(ResolveError::MissingKey(_)) => match on_missing {
                    OnMissing::Leave => {
                        debug!(key, placeholder = name, "Leaving template unsubstituted");
                        return Ok(template.to_string());
                    }
                    OnMissing::Fail => {
                        return Err(ResolveError::InterpolationFailure {
                            key: key.to_string(),
                            placeholder: name.to_string(),
                        })
                    }
                },
                Err(e) => return Err(e),
            },
        }
    }
    Ok(out)
}
