use crate::db::session::{ErrorMode, Session};
use crate::error::{GatewayError, GatewayResult};
use crate::query::QuerySpec;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// One row, keyed by column name in the store's column order.
pub type Record = Map<String, Value>;

pub fn row_to_assoc(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        record.insert(column.name().to_string(), decode_column(row, idx)?);
    }
    Ok(record)
}

/// Each column appears twice: under its position, then under its name.
pub fn row_to_indexed(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::with_capacity(row.len() * 2);
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx)?;
        record.insert(idx.to_string(), value.clone());
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

/// SQLite is dynamically typed, so decode by the value's storage class
/// rather than the declared column type.
fn decode_column(row: &SqliteRow, idx: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_owned();

    let value = match storage.as_str() {
        "INTEGER" => Value::from(row.try_get::<i64, _>(idx)?),
        "REAL" => Number::from_f64(row.try_get::<f64, _>(idx)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(idx)?;
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::String(row.try_get::<String, _>(idx)?),
    };
    Ok(value)
}

impl Session {
    /// Every row matched by `spec`. An empty result is an empty vector.
    pub async fn get_all(&mut self, spec: &QuerySpec) -> GatewayResult<Vec<Record>> {
        let stmt = spec.prepare()?;
        let handle = self
            .execute(&stmt, ErrorMode::Surface)
            .await?
            .ok_or_else(|| GatewayError::query("Response is empty."))?;

        let mut data = Vec::new();
        while let Some(row) = self.fetch_assoc(handle)? {
            data.push(row);
        }
        Ok(data)
    }

    /// First row matched by `spec`, queried with `LIMIT 1`.
    pub async fn get_one(&mut self, spec: &QuerySpec) -> GatewayResult<Option<Record>> {
        let stmt = spec.clone().limit(1).prepare()?;
        let handle = self
            .execute(&stmt, ErrorMode::Surface)
            .await?
            .ok_or_else(|| GatewayError::query("Response is empty."))?;
        self.fetch_assoc(handle)
    }

    /// `get_one`, decoded into a typed row.
    pub async fn get_one_as<T: DeserializeOwned>(
        &mut self,
        spec: &QuerySpec,
    ) -> GatewayResult<Option<T>> {
        self.get_one(spec)
            .await?
            .map(|record| {
                serde_json::from_value(Value::Object(record))
                    .map_err(|e| GatewayError::query(format!("Failed to decode row: {e}")))
            })
            .transpose()
    }
}
