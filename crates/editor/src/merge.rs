//! Merges one submitted editor row into an entity instance.

use crate::{
    binding::{BindingKind, EntityBinding, FieldBinding},
    response::{
        ENTITY_NOT_FOUND, ENTITY_REQUIRED, FIELD_REQUIRED, FieldError, INTEGER_REQUIRED,
        INVALID_VALUE,
    },
    storage::UnitOfWork,
};
use chrono::{DateTime, NaiveDate, Utc};
use grid::{column::Column, editor_state::FieldMap, table::DataTable};
use model::core::value::Value;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

/// Assigns every submitted value that has a binding, then the derived
/// fields. Required columns are checked whether bound or not. Returns the
/// field errors found on the way; the instance may be partially updated
/// when there are any.
pub async fn merge<E: Send>(
    instance: &mut E,
    table: &DataTable,
    binding: &EntityBinding<E>,
    uow: &mut dyn UnitOfWork<E>,
    submitted: &FieldMap,
    derived: &FieldMap,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let error = |column: &Column, key: &str| FieldError {
        name: column.name().to_string(),
        status: table.trans(key),
    };

    for column in table.columns() {
        let submitted_value = submitted.get(column.name()).filter(|v| !v.is_null());
        let Some(field) = binding.field(column.name()) else {
            if column.is_required() && submitted_value.is_none_or(is_blank) {
                errors.push(error(column, FIELD_REQUIRED));
            }
            continue;
        };
        let Some(raw) = submitted_value else {
            if column.is_required() {
                errors.push(error(column, FIELD_REQUIRED));
            }
            continue;
        };

        let raw = match column.data_handler() {
            Some(handler) => handler(submitted, raw.clone()),
            None => raw.clone(),
        };

        let assigned = match &raw {
            JsonValue::Array(items) => assign_collection(instance, field, uow, items).await,
            scalar => assign_scalar(instance, column, field, uow, scalar).await,
        };
        if let Err(key) = assigned {
            errors.push(error(column, key));
            continue;
        }

        if column.is_required() && is_blank(&raw) {
            errors.push(error(column, FIELD_REQUIRED));
        }
    }

    for (name, value) in derived {
        match binding.field(name) {
            Some(field) => {
                field.set(instance, Value::from_json(value));
            }
            None => debug!(field = %name, "Derived field has no binding, skipping"),
        }
    }

    errors
}

async fn assign_collection<E: Send>(
    instance: &mut E,
    field: &FieldBinding<E>,
    uow: &mut dyn UnitOfWork<E>,
    items: &[JsonValue],
) -> Result<(), &'static str> {
    let BindingKind::Collection { target } = &field.kind else {
        return Ok(());
    };

    let mut members = Vec::with_capacity(items.len());
    for item in items {
        let id = Value::from_json(item);
        match uow.reference(target, &id).await {
            Ok(reference) => members.push(Value::Reference(reference)),
            Err(e) => {
                warn!(entity = %target, id = %id, error = %e, "Cannot resolve collection member");
                return Err(ENTITY_NOT_FOUND);
            }
        }
    }
    field.set(instance, Value::List(members));
    Ok(())
}

async fn assign_scalar<E: Send>(
    instance: &mut E,
    column: &Column,
    field: &FieldBinding<E>,
    uow: &mut dyn UnitOfWork<E>,
    raw: &JsonValue,
) -> Result<(), &'static str> {
    let value = match &field.kind {
        BindingKind::String => Value::String(stringify(raw)),
        BindingKind::Integer { nullable } => {
            if *nullable && is_empty_string(raw) {
                Value::Null
            } else {
                Value::Int(parse_integer(raw).ok_or(INTEGER_REQUIRED)?)
            }
        }
        BindingKind::Float => {
            if is_empty_string(raw) {
                Value::Null
            } else {
                Value::Float(Value::from_json(raw).as_f64().ok_or(INVALID_VALUE)?)
            }
        }
        BindingKind::Boolean => Value::Boolean(Value::from_json(raw).as_bool().ok_or(INVALID_VALUE)?),
        BindingKind::Date => {
            if is_empty_string(raw) {
                Value::Null
            } else {
                parse_date(raw).ok_or(INVALID_VALUE)?
            }
        }
        BindingKind::Relation { target, nullable } => {
            if is_empty_string(raw) {
                if !column.is_hidden() {
                    return Err(ENTITY_REQUIRED);
                }
                if !*nullable {
                    return Ok(());
                }
                Value::Null
            } else {
                let id = Value::from_json(raw);
                match uow.reference(target, &id).await {
                    Ok(reference) => Value::Reference(reference),
                    Err(e) => {
                        warn!(entity = %target, id = %id, error = %e, "Cannot resolve reference");
                        return Err(ENTITY_NOT_FOUND);
                    }
                }
            }
        }
        BindingKind::Collection { .. } => return Ok(()),
    };
    field.set(instance, value);
    Ok(())
}

/// Reads a submitted row back from the instance, one entry per column with
/// a getter.
pub fn project<E>(instance: &E, table: &DataTable, binding: &EntityBinding<E>) -> Map<String, JsonValue> {
    table
        .columns()
        .iter()
        .filter_map(|column| {
            let value = binding.field(column.name())?.get(instance)?;
            Some((column.name().to_string(), value))
        })
        .collect()
}

fn stringify(raw: &JsonValue) -> String {
    match raw {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty_string(raw: &JsonValue) -> bool {
    matches!(raw, JsonValue::String(s) if s.is_empty())
}

/// Strict: the canonical decimal form only, so `"12"` passes and `" 12"`,
/// `"12.0"` or `"1e3"` do not.
fn parse_integer(raw: &JsonValue) -> Option<i64> {
    match raw {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.parse::<i64>().ok().filter(|i| i.to_string() == *s),
        _ => None,
    }
}

fn parse_date(raw: &JsonValue) -> Option<Value> {
    let s = raw.as_str()?.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Value::Date(date));
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
}

fn is_blank(raw: &JsonValue) -> bool {
    match raw {
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Null => true,
        _ => false,
    }
}
