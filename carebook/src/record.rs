//! Rows, field values, and the typed [`Record`] trait.
//!
//! A [`Row`] is the untyped form of one stored line: an ordered list of
//! `(field name, value)` pairs. Entity types implement [`Record`] to convert
//! to and from rows, so the store itself never needs to know about users,
//! thresholds or alerts.
//!
//! # Values
//!
//! Every stored value is text. On read, a value that begins with `{` or `[`
//! is decoded as JSON into [`Field::Structured`]; anything else (and any
//! JSON-looking text that fails to parse) stays [`Field::Text`]. Numbers and
//! booleans are interpreted by the typed layer, not the store.

use std::borrow::Cow;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RecordError;

/// One stored value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A scalar stored as plain text.
    Text(String),
    /// A nested list or mapping.
    Structured(Value),
}

impl Field {
    /// Decodes a raw stored value, falling back to text on malformed JSON.
    ///
    /// `name` is only used to label the warning emitted for the fallback.
    pub fn decode(name: &str, raw: String) -> Self {
        if !Self::looks_structured(&raw) {
            return Self::Text(raw);
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Self::Structured(value),
            Err(e) => {
                tracing::warn!(field = name, error = %e, "keeping malformed structured value as text");
                Self::Text(raw)
            }
        }
    }

    /// Returns `true` if the raw text opens a list or mapping.
    pub fn looks_structured(raw: &str) -> bool {
        raw.starts_with('{') || raw.starts_with('[')
    }

    /// Encodes the value back to its flat stored text.
    pub fn encode(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Structured(value) => Cow::Owned(value.to_string()),
        }
    }
}

impl From<&str> for Field {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Field {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// An ordered mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Field)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Sets a field, replacing an existing value in place.
    pub fn set(&mut self, name: &str, value: impl Into<Field>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of fields in the row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builder form of [`Row::set`].
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Field>) -> Self {
        self.set(name, value);
        self
    }

    /// Adds an optional text field; `None` is stored as an empty value.
    #[must_use]
    pub fn with_opt(self, name: &str, value: Option<&str>) -> Self {
        self.with(name, value.unwrap_or_default())
    }

    /// Adds a numeric field.
    #[must_use]
    pub fn with_number(self, name: &str, value: f64) -> Self {
        self.with(name, value.to_string())
    }

    /// Adds an unsigned integer field.
    #[must_use]
    pub fn with_count(self, name: &str, value: u64) -> Self {
        self.with(name, value.to_string())
    }

    /// Adds a boolean field.
    #[must_use]
    pub fn with_bool(self, name: &str, value: bool) -> Self {
        self.with(name, value.to_string())
    }

    /// Adds a nested structure serialized through serde.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Structure`] if `value` cannot be represented
    /// as JSON (for example a map with non-string keys).
    pub fn with_structured<T: Serialize>(self, name: &str, value: &T) -> Result<Self, RecordError> {
        let value = serde_json::to_value(value).map_err(|source| RecordError::Structure {
            field: name.to_string(),
            source,
        })?;
        Ok(self.with(name, Field::Structured(value)))
    }

    /// Returns a field as text; absent fields read as empty.
    pub fn text(&self, name: &str) -> Cow<'_, str> {
        self.get(name)
            .map_or(Cow::Borrowed(""), Field::encode)
    }

    /// Returns a field as text, or `None` if absent or empty.
    pub fn opt_text(&self, name: &str) -> Option<String> {
        let text = self.text(name);
        if text.trim().is_empty() {
            None
        } else {
            Some(text.into_owned())
        }
    }

    /// Returns a non-empty text field.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingField`] if the field is absent or empty.
    pub fn required(&self, name: &str) -> Result<String, RecordError> {
        self.opt_text(name).ok_or_else(|| RecordError::MissingField {
            field: name.to_string(),
        })
    }

    /// Returns a numeric field.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingField`] if absent, or
    /// [`RecordError::NotANumber`] if the text is not a number.
    pub fn number(&self, name: &str) -> Result<f64, RecordError> {
        let text = self.required(name)?;
        text.trim().parse().map_err(|_| RecordError::NotANumber {
            field: name.to_string(),
            value: text,
        })
    }

    /// Returns an unsigned integer field; absent or empty reads as zero.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotANumber`] if the text is not an integer.
    pub fn count(&self, name: &str) -> Result<u64, RecordError> {
        let Some(text) = self.opt_text(name) else {
            return Ok(0);
        };
        text.trim().parse().map_err(|_| RecordError::NotANumber {
            field: name.to_string(),
            value: text,
        })
    }

    /// Returns a boolean field; absent or empty reads as `false`.
    ///
    /// Accepts `true`/`false` in any letter case.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotABoolean`] for any other text.
    pub fn boolean(&self, name: &str) -> Result<bool, RecordError> {
        let Some(text) = self.opt_text(name) else {
            return Ok(false);
        };
        match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(RecordError::NotABoolean {
                field: name.to_string(),
                value: text,
            }),
        }
    }

    /// Decodes a nested structure; absent or empty reads as `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Structure`] if the value does not have the
    /// shape of `T`.
    pub fn structured<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, RecordError> {
        let into_error = |source| RecordError::Structure {
            field: name.to_string(),
            source,
        };
        match self.get(name) {
            Some(Field::Structured(value)) => T::deserialize(value).map_err(into_error),
            Some(Field::Text(text)) if !text.trim().is_empty() => {
                serde_json::from_str(text).map_err(into_error)
            }
            _ => Ok(T::default()),
        }
    }

    /// Flattens the row into encoded values in `schema` order.
    ///
    /// Fields outside `schema` are dropped; missing fields become empty.
    pub(crate) fn flatten(&self, schema: &[&str]) -> Vec<String> {
        schema
            .iter()
            .map(|name| self.text(name).into_owned())
            .collect()
    }
}

/// A typed entity that can be stored as a [`Row`].
///
/// Implementations declare the ordered field list written as the file
/// header, and optionally a key field used by [`crate::store::Table::update`]
/// to replace a stale row instead of appending beside it.
pub trait Record: Sized {
    /// Ordered field names written as the header line.
    const SCHEMA: &'static [&'static str];

    /// Field that identifies a record for replace-by-identifier updates.
    const KEY: Option<&'static str> = None;

    /// Converts the record into a row.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if a nested field cannot be serialized.
    fn to_row(&self) -> Result<Row, RecordError>;

    /// Builds the record from a stored row.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if a required field is missing or a value
    /// cannot be interpreted.
    fn from_row(row: &Row) -> Result<Self, RecordError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_structured_values() {
        assert_eq!(
            Field::decode("info", r#"{"instructions":"call"}"#.to_string()),
            Field::Structured(json!({"instructions": "call"}))
        );
        assert_eq!(
            Field::decode("constants", r#"["heart_rate","spo2"]"#.to_string()),
            Field::Structured(json!(["heart_rate", "spo2"]))
        );
    }

    #[test]
    fn test_decode_malformed_structure_keeps_text() {
        let field = Field::decode("info", "{not json".to_string());
        assert_eq!(field, Field::Text("{not json".to_string()));
    }

    #[test]
    fn test_decode_plain_text() {
        assert_eq!(Field::decode("value", "75".to_string()), Field::Text("75".to_string()));
    }

    #[test]
    fn test_encode_structured_is_compact_json() {
        let field = Field::Structured(json!({"access_key": "k", "message": "m"}));
        assert_eq!(field.encode(), r#"{"access_key":"k","message":"m"}"#);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut row = Row::new().with("a", "1").with("b", "2");
        row.set("a", "9");
        let names: Vec<_> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(row.text("a"), "9");
    }

    #[test]
    fn test_typed_accessors() {
        let row = Row::new()
            .with_number("value", 36.6)
            .with_bool("flag", true)
            .with("legacy_flag", "False")
            .with_count("members", 3)
            .with("empty", "");

        assert!((row.number("value").unwrap() - 36.6).abs() < f64::EPSILON);
        assert!(row.boolean("flag").unwrap());
        assert!(!row.boolean("legacy_flag").unwrap());
        assert_eq!(row.count("members").unwrap(), 3);
        assert_eq!(row.count("empty").unwrap(), 0);
        assert_eq!(row.opt_text("empty"), None);
        assert_eq!(row.text("absent"), "");
    }

    #[test]
    fn test_number_errors() {
        let row = Row::new().with("value", "high").with("blank", "");
        assert!(matches!(row.number("value"), Err(RecordError::NotANumber { .. })));
        assert!(matches!(row.number("blank"), Err(RecordError::MissingField { .. })));
    }

    #[test]
    fn test_structured_accepts_text_and_defaults() {
        let row = Row::new()
            .with("list", r#"["a","b"]"#)
            .with("none", "");
        let list: Vec<String> = row.structured("list").unwrap();
        let none: Vec<String> = row.structured("none").unwrap();
        assert_eq!(list, vec!["a", "b"]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_flatten_follows_schema_order() {
        let row = Row::new()
            .with("b", "2")
            .with("a", "1")
            .with("extra", "x");
        assert_eq!(row.flatten(&["a", "b", "c"]), vec!["1", "2", ""]);
    }
}
