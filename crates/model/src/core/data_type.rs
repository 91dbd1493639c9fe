use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Declared type of a scalar entity attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Integer,
    BigInt,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Json,
    Uuid,
}

impl FieldType {
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Text | FieldType::Uuid)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::BigInt)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::DateTime)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::BigInt => "bigint",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Json => "json",
            FieldType::Uuid => "uuid",
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "varchar" | "char" => Ok(FieldType::String),
            "text" => Ok(FieldType::Text),
            "integer" | "int" | "smallint" => Ok(FieldType::Integer),
            "bigint" => Ok(FieldType::BigInt),
            "float" | "double" | "real" => Ok(FieldType::Float),
            "decimal" | "numeric" => Ok(FieldType::Decimal),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "date" => Ok(FieldType::Date),
            "datetime" | "timestamp" => Ok(FieldType::DateTime),
            "json" => Ok(FieldType::Json),
            "uuid" | "guid" => Ok(FieldType::Uuid),
            other => Err(format!("Unknown field type: {other}")),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
