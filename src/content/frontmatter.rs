//! Frontmatter parsing and deterministic serialization.
//!
//! A document is a YAML header between `---` delimiters followed by a raw
//! Markdown body. Parsed headers are normalized into a restricted JSON value
//! model: string, number, bool, list, map. Nulls are dropped at the boundary.
//!
//! Serialization emits YAML by hand with lexicographic key order so that the
//! same metadata always produces byte-identical files.

use serde_json::{Map, Value};

// ============================================================================
// Parsing
// ============================================================================

/// Split a raw document into its YAML header and Markdown body.
///
/// Returns `None` when the leading delimiter pair is missing.
pub fn split_document(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    // Closing delimiter on its own line
    for (idx, _) in rest.match_indices("---") {
        let at_line_start = idx == 0 || rest.as_bytes()[idx - 1] == b'\n';
        if !at_line_start {
            continue;
        }
        let after = &rest[idx + 3..];
        let line_end = after.trim_start_matches('\r');
        if line_end.is_empty() || line_end.starts_with('\n') {
            let header = &rest[..idx];
            let body = line_end.strip_prefix('\n').unwrap_or(line_end);
            return Some((header, body));
        }
    }
    None
}

/// Parse a YAML header into the restricted value model.
pub fn parse_header(header: &str) -> Result<Map<String, Value>, String> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(header).map_err(|e| e.to_string())?;

    match yaml_to_json(yaml) {
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err("frontmatter is not a mapping".into()),
        None => Ok(Map::new()),
    }
}

/// Parse a whole document. Errors carry a human-readable reason.
pub fn parse_document(raw: &str) -> Result<(Map<String, Value>, String), String> {
    let (header, body) = split_document(raw).ok_or("missing frontmatter delimiters")?;
    let metadata = parse_header(header)?;
    Ok((metadata, body.to_string()))
}

/// Convert a YAML value into the restricted JSON model. Nulls become `None`.
fn yaml_to_json(yaml: serde_yaml::Value) -> Option<Value> {
    use serde_yaml::Value as Y;
    match yaml {
        Y::Null => None,
        Y::Bool(b) => Some(Value::Bool(b)),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::from(i))
            } else {
                n.as_f64().map(Value::from)
            }
        }
        Y::String(s) => Some(Value::String(s)),
        Y::Sequence(seq) => Some(Value::Array(
            seq.into_iter().filter_map(yaml_to_json).collect(),
        )),
        Y::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                let Some(key) = scalar_key(key) else {
                    continue;
                };
                if let Some(value) = yaml_to_json(value) {
                    map.insert(key, value);
                }
            }
            Some(Value::Object(map))
        }
        Y::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Stringify a scalar mapping key; complex keys are dropped.
fn scalar_key(key: serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value as Y;
    match key {
        Y::String(s) => Some(s),
        Y::Number(n) => Some(n.to_string()),
        Y::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ============================================================================
// Serialization
// ============================================================================

/// Serialize metadata and body back into document form.
///
/// Key order is lexicographic (`serde_json::Map` is a BTreeMap), so output
/// is deterministic for equal metadata.
pub fn serialize_document(metadata: &Map<String, Value>, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 256);
    out.push_str("---\n");
    emit_map(metadata, 0, &mut out);
    out.push_str("---\n\n");
    out.push_str(body.trim_start_matches('\n'));
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn emit_map(map: &Map<String, Value>, indent: usize, out: &mut String) {
    let pad = " ".repeat(indent);
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Object(inner) if inner.is_empty() => {
                out.push_str(&format!("{pad}{key}: {{}}\n"));
            }
            Value::Object(inner) => {
                out.push_str(&format!("{pad}{key}:\n"));
                emit_map(inner, indent + 2, out);
            }
            Value::Array(items) if items.is_empty() => {
                out.push_str(&format!("{pad}{key}: []\n"));
            }
            Value::Array(items) => {
                out.push_str(&format!("{pad}{key}:\n"));
                emit_list(items, indent + 2, out);
            }
            scalar => {
                out.push_str(&format!("{pad}{key}: {}\n", emit_scalar(scalar)));
            }
        }
    }
}

fn emit_list(items: &[Value], indent: usize, out: &mut String) {
    let pad = " ".repeat(indent);
    for item in items {
        match item {
            Value::Null => {}
            Value::Object(inner) => {
                out.push_str(&format!("{pad}-\n"));
                emit_map(inner, indent + 2, out);
            }
            Value::Array(inner) => {
                out.push_str(&format!("{pad}-\n"));
                emit_list(inner, indent + 2, out);
            }
            scalar => {
                out.push_str(&format!("{pad}- {}\n", emit_scalar(scalar)));
            }
        }
    }
}

/// Emit a scalar. Strings are always double-quoted so that values which look
/// like numbers, booleans, or YAML syntax survive a round trip.
fn emit_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n")
                .replace('\t', "\\t");
            format!("\"{escaped}\"")
        }
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
