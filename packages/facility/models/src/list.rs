//! Decoding of free-text attribute lists.
//!
//! Facility exports store list-valued columns as text: sometimes a JSON
//! array, more often a Python-style list literal with single quotes
//! (`['Cardiology', 'Internal Medicine']`), occasionally a bare string.
//! Decoding happens once, at ingestion, and never fails: anything that
//! looks like a list but cannot be decoded becomes an empty list.

/// Textual values that mean "no list at all".
const EMPTY_MARKERS: &[&str] = &["", "[]", "None", "null", "nan", "NaN"];

/// Decodes a raw attribute list.
///
/// Returns `None` when the input is bracketed but malformed, so that the
/// caller can log it. Use [`parse_string_list`] when the distinction does
/// not matter.
#[must_use]
pub fn decode_string_list(raw: &str) -> Option<Vec<String>> {
    let trimmed = raw.trim();
    if EMPTY_MARKERS.contains(&trimmed) {
        return Some(Vec::new());
    }

    if !trimmed.starts_with('[') {
        return Some(vec![trimmed.to_string()]);
    }

    if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
        return Some(values.iter().filter_map(json_item).collect());
    }

    parse_literal_list(trimmed)
}

/// Decodes a raw attribute list, treating malformed input as empty.
#[must_use]
pub fn parse_string_list(raw: &str) -> Vec<String> {
    decode_string_list(raw).unwrap_or_default()
}

fn json_item(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => non_empty(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses a Python-style list literal. Items may be single- or
/// double-quoted strings with backslash escapes, or bare tokens such as
/// numbers and `None` (which is dropped).
fn parse_literal_list(input: &str) -> Option<Vec<String>> {
    let inner = input.strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let Some(&first) = chars.peek() else {
            break;
        };

        let item = if first == '\'' || first == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => value.push(chars.next()?),
                    c if c == first => {
                        closed = true;
                        break;
                    }
                    c => value.push(c),
                }
            }
            if !closed {
                return None;
            }
            non_empty(&value)
        } else {
            let mut token = String::new();
            while let Some(c) = chars.next_if(|c| *c != ',') {
                token.push(c);
            }
            let token = token.trim();
            if token.is_empty() {
                return None;
            }
            match token {
                "None" | "False" => None,
                t if t.parse::<f64>().is_ok() || t == "True" => Some(t.to_string()),
                _ => return None,
            }
        };
        items.extend(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') | None => {}
            Some(_) => return None,
        }
    }

    Some(items)
}
