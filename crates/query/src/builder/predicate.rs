//! Entity-level predicate trees. Fields are alias-qualified (`alias.field`),
//! operands are always values and are bound as parameters when lowered.

use model::core::value::Value;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>", alias = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "LIKE", alias = "like")]
    Like,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
            Operator::Like => "LIKE",
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "=" | "==" => Ok(Operator::Eq),
            "<>" | "!=" => Ok(Operator::NotEq),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::LtEq),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::GtEq),
            "LIKE" => Ok(Operator::Like),
            other => Err(format!("Unsupported comparison operator '{other}'")),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        field: String,
        op: Operator,
        value: Value,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(field: impl Into<String>, op: Operator, value: Value) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op: Operator::Like,
            value: Value::String(pattern.into()),
        }
    }

    /// Builds a substring pattern matching `term` literally: LIKE wildcards
    /// and the escape character inside the term are escaped.
    pub fn contains(field: impl Into<String>, term: &str) -> Self {
        Self::like(field, format!("%{}%", escape_like(term)))
    }

    /// ANDs `other` into this predicate, flattening nested conjunctions.
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    /// Visits every comparison leaf in evaluation order.
    pub fn comparisons(&self) -> Vec<(&str, Operator, &Value)> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<(&'a str, Operator, &'a Value)>) {
        match self {
            Predicate::Compare { field, op, value } => out.push((field, *op, value)),
            Predicate::And(parts) | Predicate::Or(parts) => {
                parts.iter().for_each(|p| p.collect(out));
            }
        }
    }
}

/// Escapes `\`, `%` and `_` so the term matches only its literal content.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
