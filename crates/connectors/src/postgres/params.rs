//! Binds grid values to the parameter types Postgres inferred for a statement.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use grid::error::StorageError;
use model::core::value::Value;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::str::FromStr;
use tokio_postgres::types::{Json as PgJson, ToSql, Type};
use uuid::Uuid;

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    /// Converts `value` into the Rust type the driver accepts for `ty`.
    /// Search terms arrive as strings, so numeric and temporal parameters are
    /// parsed from text as well.
    pub fn for_type(value: &Value, ty: &Type) -> Result<Self, StorageError> {
        let value = match value {
            Value::Reference(r) => &*r.id,
            other => other,
        };
        let mismatch = || {
            StorageError::Query(format!(
                "Cannot bind {value} as a parameter of type {}",
                ty.name()
            ))
        };

        let param: Box<dyn ToSql + Sync + Send> = match *ty {
            Type::BOOL => Box::new(nullable(value, |v| v.as_bool()).ok_or_else(mismatch)?),
            Type::INT2 => Box::new(
                nullable(value, |v| v.as_i64().and_then(|i| i16::try_from(i).ok()))
                    .ok_or_else(mismatch)?,
            ),
            Type::INT4 => Box::new(
                nullable(value, |v| v.as_i64().and_then(|i| i32::try_from(i).ok()))
                    .ok_or_else(mismatch)?,
            ),
            Type::INT8 => Box::new(nullable(value, Value::as_i64).ok_or_else(mismatch)?),
            Type::FLOAT4 => Box::new(nullable(value, |v| v.as_f64().map(|f| f as f32)).ok_or_else(mismatch)?),
            Type::FLOAT8 => Box::new(nullable(value, Value::as_f64).ok_or_else(mismatch)?),
            Type::NUMERIC => Box::new(nullable(value, to_decimal).ok_or_else(mismatch)?),
            Type::JSON | Type::JSONB => Box::new(PgJson(value.to_json())),
            Type::UUID => Box::new(nullable(value, to_uuid).ok_or_else(mismatch)?),
            Type::DATE => Box::new(nullable(value, to_date).ok_or_else(mismatch)?),
            Type::TIMESTAMP => Box::new(
                nullable(value, |v| to_timestamp(v).map(|t| t.naive_utc())).ok_or_else(mismatch)?,
            ),
            Type::TIMESTAMPTZ => Box::new(nullable(value, to_timestamp).ok_or_else(mismatch)?),
            _ => Box::new(match value {
                Value::Null => None,
                Value::Json(json) => Some(json.to_string()),
                other => other.as_string(),
            }),
        };
        Ok(PgParam(param))
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    pub fn bind(values: &[Value], types: &[Type]) -> Result<Self, StorageError> {
        if values.len() != types.len() {
            return Err(StorageError::Query(format!(
                "Statement expects {} parameters, got {}",
                types.len(),
                values.len()
            )));
        }
        let params = values
            .iter()
            .zip(types)
            .map(|(value, ty)| PgParam::for_type(value, ty))
            .collect::<Result<_, _>>()?;
        Ok(Self { params })
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|param| param.as_ref()).collect()
    }
}

/// `Some(None)` for null, `Some(Some(_))` when `convert` succeeds.
fn nullable<T>(value: &Value, convert: impl Fn(&Value) -> Option<T>) -> Option<Option<T>> {
    match value {
        Value::Null => Some(None),
        other => convert(other).map(Some),
    }
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::Float(f) => Decimal::from_f64(*f),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn to_uuid(value: &Value) -> Option<Uuid> {
    match value {
        Value::Uuid(u) => Some(*u),
        Value::String(s) => Uuid::parse_str(s.trim()).ok(),
        _ => None,
    }
}

fn to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Timestamp(t) => Some(t.date_naive()),
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    }
}

fn to_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(t) => Some(*t),
        Value::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                        .ok()
                        .map(|dt| dt.and_utc())
                })
        }
        _ => None,
    }
}
