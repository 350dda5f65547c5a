//! `{{ name }}` substitution.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::view::{Assigns, ViewError};

/// Read `path` and substitute assigns into it.
pub fn render_file(path: &Path, assigns: &Assigns) -> Result<String, ViewError> {
    let source = fs::read_to_string(path).map_err(|source| ViewError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(render_str(&source, assigns))
}

/// Replace every `{{ name }}` with its assign. Unknown names render empty,
/// an unterminated `{{` is left as text.
pub fn render_str(source: &str, assigns: &Assigns) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                if let Some(value) = assigns.get(name) {
                    match value {
                        Value::String(s) => out.push_str(s),
                        Value::Null => {}
                        other => out.push_str(&other.to_string()),
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
