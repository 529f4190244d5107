//! `{name}` substitution in dialogue text.

use crate::env::VariableStore;

/// Replace each `{identifier}` with the variable's display text.
///
/// An identifier starts with a letter and continues with letters, digits or
/// `_`. Tokens naming a missing or null variable, and braces that do not
/// hold an identifier, are copied through unchanged.
pub fn interpolate(text: &str, vars: &VariableStore) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match token_name(after) {
            Some(name) => {
                let token_len = name.len() + 2;
                match vars.get(name).filter(|v| !v.is_null()) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => out.push_str(&rest[open..open + token_len]),
                }
                rest = &rest[open + token_len..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// The identifier at the start of `text` if it is followed by `}`.
fn token_name(text: &str) -> Option<&str> {
    let mut chars = text.char_indices();
    let (_, first) = chars.next()?;
    if !first.is_alphabetic() {
        return None;
    }
    for (i, c) in chars {
        if c == '}' {
            return Some(&text[..i]);
        }
        if !(c.is_alphanumeric() || c == '_') {
            return None;
        }
    }
    None
}
