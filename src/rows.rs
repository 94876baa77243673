//! Bind-parameter and row conversion between JSON and driver values.
//!
//! Backs the convenience query interface on [`crate::pool::Oracle`]:
//! JSON bind values go in, JSON rows shaped per
//! [`OutFormat`](crate::config::OutFormat) come out. Shaping and bind
//! mapping are pure and unit-tested; column extraction touches the
//! driver and is exercised by the live-database tests.

use oracle::sql_type::{OracleType, ToSql};
use oracle::{Row, SqlValue};
use serde_json::{Map, Value};

use crate::config::{FetchAsString, OutFormat};
use crate::error::OracleError;

static NULL_BIND: Option<String> = None;

/// A JSON bind value narrowed to the Oracle scalars the driver accepts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BindValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl BindValue {
    fn from_json(value: &Value) -> Result<Self, OracleError> {
        match value {
            Value::Null => Ok(Self::Null),
            // Oracle SQL has no boolean type; follow the driver's 0/1 convention.
            Value::Bool(b) => Ok(Self::Int(i64::from(*b))),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if n.is_u64() {
                    // Would silently lose precision through the f64 path.
                    Err(OracleError::InvalidBind(format!(
                        "integer {n} exceeds the supported bind range"
                    )))
                } else {
                    n.as_f64().map(Self::Float).ok_or_else(|| {
                        OracleError::InvalidBind(format!("number {n} is not representable"))
                    })
                }
            }
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(OracleError::InvalidBind(
                "arrays and objects cannot be bound; bind scalars only".to_string(),
            )),
        }
    }

    pub(crate) fn to_sql_ref(&self) -> &dyn ToSql {
        match self {
            Self::Null => &NULL_BIND,
            Self::Int(v) => v,
            Self::Float(v) => v,
            Self::Text(v) => v,
        }
    }
}

/// Converts JSON positional binds, rejecting non-scalar values up front.
pub(crate) fn bind_values(binds: &[Value]) -> Result<Vec<BindValue>, OracleError> {
    binds.iter().map(BindValue::from_json).collect()
}

/// Shapes one row of converted values per the configured out format.
pub(crate) fn shape_row(names: &[String], values: Vec<Value>, out_format: OutFormat) -> Value {
    match out_format {
        OutFormat::Array => Value::Array(values),
        OutFormat::Object => {
            let mut object = Map::with_capacity(names.len());
            // Duplicate column names: the later column wins.
            for (name, value) in names.iter().zip(values) {
                object.insert(name.clone(), value);
            }
            Value::Object(object)
        }
    }
}

/// Converts a driver row into JSON using pre-collected column metadata.
pub(crate) fn row_to_json(
    row: &Row,
    column_types: &[OracleType],
    names: &[String],
    out_format: OutFormat,
    fetch_as_string: &[FetchAsString],
) -> Result<Value, oracle::Error> {
    let mut values = Vec::with_capacity(column_types.len());
    for (oracle_type, sql_value) in column_types.iter().zip(row.sql_values()) {
        values.push(json_value(oracle_type, sql_value, fetch_as_string)?);
    }
    Ok(shape_row(names, values, out_format))
}

/// Converts one column value by its Oracle type.
///
/// Numbers become JSON numbers unless coerced to strings; dates,
/// timestamps and LOBs render through the driver's string conversion.
fn json_value(
    oracle_type: &OracleType,
    value: &SqlValue,
    fetch_as_string: &[FetchAsString],
) -> Result<Value, oracle::Error> {
    if value.is_null()? {
        return Ok(Value::Null);
    }
    match oracle_type {
        OracleType::Number(_, _)
        | OracleType::Float(_)
        | OracleType::BinaryFloat
        | OracleType::BinaryDouble
        | OracleType::Int64
        | OracleType::UInt64 => {
            if fetch_as_string.contains(&FetchAsString::Number) {
                Ok(Value::String(value.get::<String>()?))
            } else {
                number_value(oracle_type, value)
            }
        }
        OracleType::Boolean => Ok(Value::Bool(value.get::<bool>()?)),
        // Dates, timestamps, LOBs, RAW and everything else go through the
        // driver's string rendering.
        _ => Ok(Value::String(value.get::<String>()?)),
    }
}

fn number_value(oracle_type: &OracleType, value: &SqlValue) -> Result<Value, oracle::Error> {
    match oracle_type {
        OracleType::Int64 | OracleType::Number(_, 0) => match value.get::<i64>() {
            Ok(i) => Ok(Value::Number(i.into())),
            // Integral NUMBER wider than i64: keep full precision as text.
            Err(_) => Ok(Value::String(value.get::<String>()?)),
        },
        OracleType::UInt64 => Ok(Value::Number(value.get::<u64>()?.into())),
        _ => {
            let f = value.get::<f64>()?;
            Ok(serde_json::Number::from_f64(f)
                .map_or_else(|| Value::String(f.to_string()), Value::Number))
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn shapes_rows_as_objects() {
        let row = shape_row(
            &names(&["ID", "NAME"]),
            vec![json!(1), json!("alice")],
            OutFormat::Object,
        );
        assert_eq!(row, json!({"ID": 1, "NAME": "alice"}));
    }

    #[test]
    fn shapes_rows_as_arrays() {
        let row = shape_row(
            &names(&["ID", "NAME"]),
            vec![json!(1), json!("alice")],
            OutFormat::Array,
        );
        assert_eq!(row, json!([1, "alice"]));
    }

    #[test]
    fn duplicate_column_names_keep_the_last_value() {
        let row = shape_row(
            &names(&["N", "N"]),
            vec![json!(1), json!(2)],
            OutFormat::Object,
        );
        assert_eq!(row, json!({"N": 2}));
    }

    #[test]
    fn binds_map_scalars() {
        let Ok(binds) = bind_values(&[json!(null), json!(true), json!(42), json!(1.5), json!("x")])
        else {
            panic!("scalar binds should convert");
        };
        assert_eq!(
            binds,
            vec![
                BindValue::Null,
                BindValue::Int(1),
                BindValue::Int(42),
                BindValue::Float(1.5),
                BindValue::Text("x".to_string()),
            ]
        );
    }

    #[test]
    fn binds_reject_arrays_and_objects() {
        assert!(matches!(
            bind_values(&[json!([1, 2])]),
            Err(OracleError::InvalidBind(_))
        ));
        assert!(matches!(
            bind_values(&[json!({"a": 1})]),
            Err(OracleError::InvalidBind(_))
        ));
    }

    #[test]
    fn binds_reject_integers_beyond_i64() {
        assert!(matches!(
            bind_values(&[json!(u64::MAX)]),
            Err(OracleError::InvalidBind(_))
        ));
        // The i64 boundary itself still binds exactly.
        let Ok(binds) = bind_values(&[json!(i64::MAX)]) else {
            panic!("i64::MAX should bind");
        };
        assert_eq!(binds, vec![BindValue::Int(i64::MAX)]);
    }

    #[test]
    fn empty_binds_are_fine() {
        let Ok(binds) = bind_values(&[]) else {
            panic!("empty binds should convert");
        };
        assert!(binds.is_empty());
    }
}
