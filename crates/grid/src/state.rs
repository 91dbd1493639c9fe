//! Per-request grid state: paging, ordering and search terms.

use crate::{error::GridError, table::DataTable};
use query::ast::common::OrderDir;
use serde_json::Value as JsonValue;
use tracing::debug;

/// View state for one draw of the grid. Column references are positions in
/// [`DataTable::columns`], hidden columns included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridState {
    draw: u64,
    start: u64,
    length: i64,
    order_by: Vec<(usize, OrderDir)>,
    search_columns: Vec<(usize, String)>,
    global_search: Option<String>,
    initial: bool,
}

impl GridState {
    /// Starts from the table's configured paging, ordering and search.
    pub fn from_defaults(table: &DataTable) -> Result<Self, GridError> {
        let options = table.options();
        let order_by = options
            .order
            .iter()
            .map(|(index, dir)| Ok((table.column_position(*index)?, *dir)))
            .collect::<Result<Vec<_>, GridError>>()?;

        Ok(Self {
            draw: 0,
            start: options.display_start,
            length: options.page_length,
            order_by,
            search_columns: Vec::new(),
            global_search: options.search.clone().filter(|s| !s.is_empty()),
            initial: false,
        })
    }

    /// Applies the request parameters of a grid draw. Column indices in
    /// `order` and `columns` count non-hidden columns only.
    pub fn apply_parameters(
        &mut self,
        params: &JsonValue,
        table: &DataTable,
    ) -> Result<(), GridError> {
        self.initial = params.get("_init").is_some_and(truthy);
        if let Some(draw) = params.get("draw") {
            self.draw = int_param("draw", draw)?.max(0) as u64;
        }
        if let Some(start) = params.get("start") {
            self.start = int_param("start", start)?.max(0) as u64;
        }
        if let Some(length) = params.get("length") {
            self.length = int_param("length", length)?;
        }

        if let Some(search) = params.get("search") {
            self.global_search = search
                .get("value")
                .and_then(JsonValue::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }

        if let Some(order) = params.get("order") {
            self.order_by.clear();
            for (_, entry) in entries(order) {
                let index = entry
                    .get("column")
                    .ok_or_else(|| {
                        GridError::InvalidArgument("Order entry without a column".to_string())
                    })
                    .and_then(|c| int_param("order column", c))?;
                let position = table.column_position(to_index(index)?)?;
                let direction = match entry.get("dir").and_then(JsonValue::as_str) {
                    Some(dir) => dir.parse().map_err(GridError::InvalidArgument)?,
                    None => OrderDir::Asc,
                };
                self.order_by.push((position, direction));
            }
        }

        if let Some(columns) = params.get("columns") {
            for (key, entry) in entries(columns) {
                let index = key.parse::<i64>().map_err(|_| {
                    GridError::InvalidArgument(format!("Invalid column index '{key}'"))
                })?;
                let position = table.column_position(to_index(index)?)?;
                let term = if self.initial {
                    entry.as_str()
                } else {
                    entry
                        .get("search")
                        .and_then(|s| s.get("value"))
                        .and_then(JsonValue::as_str)
                };
                let Some(term) = term else {
                    continue;
                };

                let column = &table.columns()[position];
                if !column.is_searchable() || term.trim().is_empty() {
                    continue;
                }
                if !column.is_valid_for_search(term) {
                    debug!(column = column.name(), term, "Ignoring search value invalid for column");
                    continue;
                }
                self.set_column_search(position, term);
            }
        }

        Ok(())
    }

    pub fn set_column_search(&mut self, position: usize, term: &str) {
        self.search_columns.retain(|(p, _)| *p != position);
        self.search_columns.push((position, term.to_string()));
    }

    pub fn add_order_by(&mut self, position: usize, direction: OrderDir) {
        self.order_by.push((position, direction));
    }

    pub fn set_global_search(&mut self, term: Option<String>) {
        self.global_search = term.filter(|t| !t.is_empty());
    }

    pub fn set_paging(&mut self, start: u64, length: i64) {
        self.start = start;
        self.length = length;
    }

    pub fn draw(&self) -> u64 {
        self.draw
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    /// Page size; `-1` (or any value below 1) means unlimited.
    pub fn length(&self) -> i64 {
        self.length
    }

    pub fn order_by(&self) -> &[(usize, OrderDir)] {
        &self.order_by
    }

    pub fn search_columns(&self) -> &[(usize, String)] {
        &self.search_columns
    }

    pub fn global_search(&self) -> Option<&str> {
        self.global_search.as_deref()
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }
}

fn to_index(index: i64) -> Result<usize, GridError> {
    usize::try_from(index)
        .map_err(|_| GridError::InvalidArgument(format!("There is no column with index {index}")))
}

fn int_param(name: &str, value: &JsonValue) -> Result<i64, GridError> {
    let parsed = match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        GridError::InvalidArgument(format!("Parameter '{name}' must be an integer, got {value}"))
    })
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        JsonValue::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes"),
        _ => false,
    }
}

/// Entries of an indexed parameter, accepting both JSON arrays and the
/// `{"0": .., "1": ..}` objects produced by form nesting.
fn entries(value: &JsonValue) -> Vec<(String, &JsonValue)> {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        JsonValue::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        _ => Vec::new(),
    }
}
