//! Form field descriptions and parsing helpers for editable resources.

use std::collections::BTreeMap;

/// Field values keyed by `FormField::key`
pub type FormValues = BTreeMap<String, String>;

/// Messages keyed by `FormField::key`
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
  Text,
  Multiline,
  /// Comma-separated list
  List,
  Number,
  /// One of a fixed set of values, cycled with left/right
  Select(&'static [&'static str]),
  /// Local file path to upload, or an existing URL to keep
  File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
  /// Payload field name; validation errors are reported under the same key
  pub key: &'static str,
  pub label: &'static str,
  pub kind: FieldKind,
  pub required: bool,
}

impl FormField {
  pub const fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
    Self {
      key,
      label,
      kind,
      required: true,
    }
  }

  pub const fn optional(mut self) -> Self {
    self.required = false;
    self
  }
}

/// Trimmed value of `key`, empty when absent
pub fn text(values: &FormValues, key: &str) -> String {
  values
    .get(key)
    .map(|v| v.trim().to_string())
    .unwrap_or_default()
}

/// `None` for blank values
pub fn optional_text(values: &FormValues, key: &str) -> Option<String> {
  Some(text(values, key)).filter(|v| !v.is_empty())
}

/// Comma-separated list with blanks dropped
pub fn list(values: &FormValues, key: &str) -> Vec<String> {
  text(values, key)
    .split(',')
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .collect()
}

/// Parse a number, recording an error under `key` on failure
pub fn number(values: &FormValues, key: &str, errors: &mut FieldErrors) -> f64 {
  let raw = text(values, key);
  match raw.parse::<f64>() {
    Ok(n) if n.is_finite() => n,
    _ => {
      errors.insert(key.to_string(), format!("'{}' is not a number", raw));
      0.0
    }
  }
}

/// Whether a file field holds a URL already on the server rather than a local path
pub fn is_remote_url(value: &str) -> bool {
  value.starts_with("http://") || value.starts_with("https://")
}

/// Flatten validator output into one message per field
pub fn from_validation(errors: &validator::ValidationErrors) -> FieldErrors {
  errors
    .field_errors()
    .into_iter()
    .map(|(field, errs)| {
      let message = errs
        .first()
        .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| format!("{} is invalid", field.to_string().replace('_', " ")));
      (field.to_string(), message)
    })
    .collect()
}
