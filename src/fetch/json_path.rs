//! Dot-separated JSON path resolution
//!
//! `"data.price"` resolves `body["data"]["price"]`. A segment that is a
//! non-negative integer also indexes into an array, so `"items.0.value"`
//! reads the first element's `value` field.

use serde_json::Value;

/// Parsed path: a non-empty sequence of non-empty segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<String>,
}

impl JsonPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = trimmed.split('.').map(|s| s.trim().to_string()).collect();
        if let Some(position) = segments.iter().position(|s| s.is_empty()) {
            return Err(PathError::EmptySegment {
                path: trimmed.to_string(),
                position,
            });
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Walk the path through `root`
    pub fn resolve<'a>(&self, root: &'a Value) -> Result<&'a Value, PathError> {
        let mut current = root;

        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(|| PathError::NotFound {
                path: self.raw.clone(),
                segment: segment.clone(),
            })?;
        }

        Ok(current)
    }

    /// Resolve and require a finite JSON number
    pub fn resolve_f64(&self, root: &Value) -> Result<Option<f64>, PathError> {
        Ok(self.resolve(root)?.as_f64().filter(|v| v.is_finite()))
    }
}

impl std::fmt::Display for JsonPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("Path is empty")]
    Empty,

    #[error("Path '{path}' has an empty segment at position {position}")]
    EmptySegment { path: String, position: usize },

    #[error("Path '{path}' does not resolve at '{segment}'")]
    NotFound { path: String, segment: String },
}
