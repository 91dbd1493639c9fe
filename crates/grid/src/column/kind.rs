use crate::error::GridError;
use chrono::{
    DateTime, NaiveDate, NaiveDateTime,
    format::{Item, StrftimeItems},
};
use model::core::value::Value;
use query::builder::predicate::Operator;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::{collections::BTreeMap, fmt::Write};
use tracing::warn;

/// The closed set of column variants. Each variant carries its own typed
/// options and decides how raw cell values are normalized for the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    Text(TextOptions),
    Html(HtmlOptions),
    #[serde(rename = "datetime", alias = "date_time")]
    DateTime(DateTimeOptions),
    Bool(BoolOptions),
    Map(MapOptions),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextOptions {
    /// Skip HTML escaping.
    pub raw: bool,
    /// Editor textarea rows; a single line renders a plain input.
    pub lines: u32,
    pub max_length: Option<u32>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            raw: false,
            lines: 1,
            max_length: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HtmlOptions {
    pub rendered_length: u32,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            rendered_length: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DateTimeOptions {
    /// `strftime`-style output format.
    pub format: String,
    pub null_value: String,
}

impl Default for DateTimeOptions {
    fn default() -> Self {
        Self {
            format: "%Y-%m-%d".to_string(),
            null_value: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoolOptions {
    pub true_value: String,
    pub false_value: String,
    pub null_value: String,
    /// Display labels keyed by `0`/`1`; defaults to the false/true values.
    pub map: Option<BTreeMap<String, String>>,
}

impl Default for BoolOptions {
    fn default() -> Self {
        Self {
            true_value: "true".to_string(),
            false_value: "false".to_string(),
            null_value: String::new(),
            map: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    pub map: BTreeMap<String, String>,
    #[serde(default)]
    pub default: Option<String>,
}

impl ColumnKind {
    pub fn text() -> Self {
        ColumnKind::Text(TextOptions::default())
    }

    pub fn html() -> Self {
        ColumnKind::Html(HtmlOptions::default())
    }

    pub fn datetime(format: &str) -> Self {
        ColumnKind::DateTime(DateTimeOptions {
            format: format.to_string(),
            ..Default::default()
        })
    }

    pub fn boolean() -> Self {
        ColumnKind::Bool(BoolOptions::default())
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ColumnKind::Map(MapOptions {
            map: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            default: None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Text(_) => "text",
            ColumnKind::Html(_) => "html",
            ColumnKind::DateTime(_) => "datetime",
            ColumnKind::Bool(_) => "bool",
            ColumnKind::Map(_) => "map",
        }
    }

    /// Checks options that cannot be expressed in the type alone.
    pub fn validate(&self) -> Result<(), GridError> {
        if let ColumnKind::DateTime(opts) = self {
            if StrftimeItems::new(&opts.format).any(|item| matches!(item, Item::Error)) {
                return Err(GridError::Configuration(format!(
                    "Invalid date format '{}'",
                    opts.format
                )));
            }
        }
        Ok(())
    }

    /// Operator used when a filter does not name one.
    pub fn default_operator(&self) -> Operator {
        match self {
            ColumnKind::Text(_) | ColumnKind::Html(_) => Operator::Like,
            _ => Operator::Eq,
        }
    }

    pub fn normalize(&self, value: &JsonValue) -> JsonValue {
        match self {
            ColumnKind::Text(opts) => {
                let text = stringify(value);
                if opts.raw {
                    JsonValue::String(text)
                } else {
                    JsonValue::String(escape_html(&text))
                }
            }
            ColumnKind::Html(_) => JsonValue::String(stringify(value)),
            ColumnKind::DateTime(opts) => format_datetime(value, opts),
            ColumnKind::Bool(_) => JsonValue::from(u8::from(truthy(value))),
            ColumnKind::Map(_) => value.clone(),
        }
    }

    pub fn is_valid_for_search(&self, term: &str) -> bool {
        match self {
            ColumnKind::Bool(opts) => {
                let term = term.trim().to_lowercase();
                term == opts.true_value || term == opts.false_value
            }
            _ => true,
        }
    }

    /// The comparison operand for a per-column search term.
    pub fn search_value(&self, term: &str) -> Value {
        match self {
            ColumnKind::Bool(opts) => Value::Boolean(term.trim().to_lowercase() == opts.true_value),
            _ => Value::String(term.to_string()),
        }
    }

    /// Display labels sent to the grid.
    pub fn labels(&self) -> Option<BTreeMap<String, String>> {
        match self {
            ColumnKind::Bool(opts) => Some(
                opts.map
                    .clone()
                    .unwrap_or_else(|| bool_map(&opts.false_value, &opts.true_value)),
            ),
            ColumnKind::Map(opts) => Some(opts.map.clone()),
            _ => None,
        }
    }

    /// Options offered by the editor's select input.
    pub fn normalized_map(&self) -> Option<BTreeMap<String, String>> {
        match self {
            ColumnKind::Bool(opts) => Some(bool_map(&opts.false_value, &opts.true_value)),
            ColumnKind::Map(opts) => Some(opts.map.clone()),
            _ => None,
        }
    }

    pub fn rendered_length(&self) -> Option<u32> {
        match self {
            ColumnKind::Html(opts) => Some(opts.rendered_length),
            _ => None,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, ColumnKind::DateTime(_))
    }

    pub fn date_format(&self) -> Option<&str> {
        match self {
            ColumnKind::DateTime(opts) => Some(&opts.format),
            _ => None,
        }
    }

    pub fn lines(&self) -> Option<u32> {
        match self {
            ColumnKind::Text(opts) => Some(opts.lines),
            _ => None,
        }
    }

    pub fn max_length(&self) -> Option<u32> {
        match self {
            ColumnKind::Text(opts) => opts.max_length,
            _ => None,
        }
    }
}

fn bool_map(false_value: &str, true_value: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("0".to_string(), false_value.to_string()),
        ("1".to_string(), true_value.to_string()),
    ])
}

fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(true) => "1".to_string(),
        JsonValue::Bool(false) => String::new(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !(s.is_empty() || s == "0"),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(_) => true,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn format_datetime(value: &JsonValue, opts: &DateTimeOptions) -> JsonValue {
    let parsed = match value {
        JsonValue::Null => return JsonValue::String(opts.null_value.clone()),
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc()),
        JsonValue::String(s) => parse_datetime(s),
        _ => None,
    };

    let Some(datetime) = parsed else {
        warn!("Cannot interpret {value} as a date, passing it through");
        return value.clone();
    };

    let mut out = String::new();
    match write!(out, "{}", datetime.format(&opts.format)) {
        Ok(()) => JsonValue::String(out),
        Err(_) => {
            warn!("Date format '{}' could not be applied", opts.format);
            value.clone()
        }
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
