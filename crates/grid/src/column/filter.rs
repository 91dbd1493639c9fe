use crate::error::GridError;
use query::builder::predicate::Operator;
use serde::{Deserialize, Serialize};

/// Per-column search filter. Without an explicit operator the column kind
/// decides (`LIKE` for text, `=` otherwise).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub operator: Option<Operator>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operator(operator: Operator) -> Self {
        Self {
            operator: Some(operator),
        }
    }

    /// Parses an operator such as `LIKE`, `>=` or `!=`.
    pub fn parse(operator: &str) -> Result<Self, GridError> {
        operator
            .parse::<Operator>()
            .map(Self::with_operator)
            .map_err(GridError::Configuration)
    }
}
