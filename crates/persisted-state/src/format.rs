//! Text formats for the persisted state file.
//!
//! Both formats render keys in sorted order (serde_json's `Map` is a
//! `BTreeMap`), so re-saving unchanged state produces identical bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StateError, StateResult};

/// Converts the untyped state to and from text.
pub trait TextFormat: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn to_text(&self, value: &Value) -> StateResult<String>;

    /// Parse text into an untyped value. The error is the parser's message;
    /// the store attaches the file path.
    fn from_text(&self, text: &str) -> Result<Value, String>;
}

/// Pretty-printed JSON, two-space indent, trailing newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl TextFormat for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn to_text(&self, value: &Value) -> StateResult<String> {
        let mut text =
            serde_json::to_string_pretty(value).map_err(|e| StateError::Serialize(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }

    fn from_text(&self, text: &str) -> Result<Value, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }
}

/// TOML document. The state must be a table.
///
/// TOML has no `null`, so `null` object members are left out of the file;
/// they read back as absent, which `#[serde(default)]` options decode as
/// `None`. A `null` inside an array is still an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl TextFormat for TomlFormat {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn to_text(&self, value: &Value) -> StateResult<String> {
        toml::to_string_pretty(&without_null_members(value))
            .map_err(|e| StateError::Serialize(e.to_string()))
    }

    fn from_text(&self, text: &str) -> Result<Value, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}

fn without_null_members(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_null_members(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_null_members).collect()),
        other => other.clone(),
    }
}

/// Format selector used by [`StoreOptions`](crate::config::StoreOptions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    #[default]
    Json,
    Toml,
}

impl FormatKind {
    pub fn text_format(self) -> Box<dyn TextFormat> {
        match self {
            FormatKind::Json => Box::new(JsonFormat),
            FormatKind::Toml => Box::new(TomlFormat),
        }
    }
}
