//! Normalised rendering and shape matching for type and expression text.
//!
//! The compiler never sees a syntax tree: every type and default value is a
//! string. Token printers insert spaces freely (`Vec < ChainNode < T > >`),
//! so all text is normalised before it is compared.
//!
//! # Examples
//!
//! ```
//! use cmdbind_core::normalize_type_text;
//!
//! assert_eq!(normalize_type_text("Vec < ChainNode < Widget > >"), "Vec<ChainNode<Widget>>");
//! assert_eq!(normalize_type_text("& 'a str"), "&'a str");
//! assert_eq!(normalize_type_text("MetaFlag :: text (\"v 0.1\")"), "MetaFlag::text(\"v 0.1\")");
//! ```

use std::sync::LazyLock;

use regex::Regex;

static GENERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]*::)*([A-Za-z_][A-Za-z0-9_]*)<(.+)>$")
        .expect("static regex must compile")
});

/// Collapses whitespace in type or expression text.
///
/// A run of whitespace survives as a single space only when it separates two
/// word characters (`dyn Trait`, `&'a str`). String and character literals
/// are copied untouched.
pub fn normalize_type_text(raw: &str) -> String {
    let chars: Vec<char> = raw.trim().chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '"' {
            i = copy_string_literal(&chars, i, &mut out);
            continue;
        }

        if c == '\'' && is_char_literal(&chars, i) {
            i = copy_char_literal(&chars, i, &mut out);
            continue;
        }

        if c.is_whitespace() {
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            let prev_is_word = out.chars().last().is_some_and(is_word_char);
            let next_is_word = chars.get(i).copied().is_some_and(is_word_char);
            if prev_is_word && next_is_word {
                out.push(' ');
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Splits `Head<Inner>` into the last path segment of `Head` and `Inner`.
///
/// Returns `None` unless the outermost angle brackets enclose the whole
/// remainder of the text and hold exactly one type argument.
pub(crate) fn split_generic(text: &str) -> Option<(&str, &str)> {
    let captures = GENERIC_RE.captures(text)?;
    let head = captures.get(1)?.as_str();
    let inner = captures.get(2)?.as_str();

    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => return None,
            _ => {}
        }
    }

    (depth == 0).then_some((head, inner))
}

/// Returns `T` when `text` has the shape `Vec<T>`.
pub(crate) fn sequence_element(text: &str) -> Option<&str> {
    match split_generic(text)? {
        ("Vec", inner) => Some(inner),
        _ => None,
    }
}

/// Renders `Vec<element>`.
pub(crate) fn sequence_of(element: &str) -> String {
    format!("Vec<{element}>")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_char_literal(chars: &[char], start: usize) -> bool {
    match chars.get(start + 1) {
        Some('\\') => true,
        Some(_) => chars.get(start + 2) == Some(&'\''),
        None => false,
    }
}

fn copy_string_literal(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == '\\' {
            if let Some(&escaped) = chars.get(i) {
                out.push(escaped);
                i += 1;
            }
        } else if c == '"' {
            break;
        }
    }
    i
}

fn copy_char_literal(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('\'');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == '\\' {
            if let Some(&escaped) = chars.get(i) {
                out.push(escaped);
                i += 1;
            }
        } else if c == '\'' {
            break;
        }
    }
    i
}
