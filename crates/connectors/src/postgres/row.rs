use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{core::value::Value, records::row::RowData};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use tokio_postgres::{Row, types::Type};
use tracing::warn;
use uuid::Uuid;

/// Converts a driver row into a [`RowData`]. Fields are named after
/// `labels` by position, falling back to the column name.
pub(crate) fn to_row_data(row: &Row, labels: &[String]) -> RowData {
    RowData::from_pairs(row.columns().iter().enumerate().map(|(idx, column)| {
        let name = labels
            .get(idx)
            .cloned()
            .unwrap_or_else(|| column.name().to_string());
        (name, read_value(row, idx, column.type_()))
    }))
}

fn read_value(row: &Row, idx: usize, ty: &Type) -> Value {
    let value = match *ty {
        Type::BOOL => get::<bool>(row, idx).map(|v| v.map(Value::Boolean)),
        Type::INT2 => get::<i16>(row, idx).map(|v| v.map(|i| Value::Int(i64::from(i)))),
        Type::INT4 => get::<i32>(row, idx).map(|v| v.map(|i| Value::Int(i64::from(i)))),
        Type::INT8 => get::<i64>(row, idx).map(|v| v.map(Value::Int)),
        Type::FLOAT4 => get::<f32>(row, idx).map(|v| v.map(|f| Value::Float(f64::from(f)))),
        Type::FLOAT8 => get::<f64>(row, idx).map(|v| v.map(Value::Float)),
        Type::NUMERIC => {
            get::<Decimal>(row, idx).map(|v| v.and_then(|d| d.to_f64()).map(Value::Float))
        }
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx).map(|v| v.map(Value::Json)),
        Type::UUID => get::<Uuid>(row, idx).map(|v| v.map(Value::Uuid)),
        Type::DATE => get::<NaiveDate>(row, idx).map(|v| v.map(Value::Date)),
        Type::TIMESTAMP => {
            get::<NaiveDateTime>(row, idx).map(|v| v.map(|t| Value::Timestamp(t.and_utc())))
        }
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx).map(|v| v.map(Value::Timestamp)),
        _ => get::<String>(row, idx).map(|v| v.map(Value::String)),
    };

    match value {
        Ok(value) => value.unwrap_or(Value::Null),
        Err(e) => {
            warn!(column = idx, pg_type = %ty, error = %e, "Cannot decode column, reading it as null");
            Value::Null
        }
    }
}

fn get<'a, T>(row: &'a Row, idx: usize) -> Result<Option<T>, tokio_postgres::Error>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
}
