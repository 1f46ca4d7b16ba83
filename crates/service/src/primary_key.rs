//! Human-readable rendering of primary keys for error messages.
//!
//! Keys are lowered to a sea-query [`ValueTuple`]: a single value renders as
//! is, composite keys are joined with `|`, and named keys render as
//! `column:value` pairs joined with `|`. Only integer, string and UUID
//! components are accepted.

use std::fmt::Display;

use sea_orm::sea_query::{IntoValueTuple, ValueTuple};
use sea_orm::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyFormatError {
    #[error("unrecognized primary key value: {0:?}")]
    Unsupported(Value),
    #[error("primary key has no components")]
    Empty,
}

const SEPARATOR: &str = "|";

/// Formats an atomic or composite primary key.
pub fn format_primary_key<K: IntoValueTuple>(pk: K) -> Result<String, KeyFormatError> {
    match pk.into_value_tuple() {
        ValueTuple::One(value) => atomic(&value),
        ValueTuple::Two(a, b) => ordered(&[a, b]),
        ValueTuple::Three(a, b, c) => ordered(&[a, b, c]),
        ValueTuple::Many(values) => ordered(&values),
    }
}

/// Formats a key given as `(name, value)` pairs, e.g. read off a loaded model.
pub fn format_named_key<N, I>(pairs: I) -> Result<String, KeyFormatError>
where
    N: Display,
    I: IntoIterator<Item = (N, Value)>,
{
    let parts = pairs
        .into_iter()
        .map(|(name, value)| atomic(&value).map(|v| format!("{name}:{v}")))
        .collect::<Result<Vec<_>, _>>()?;
    if parts.is_empty() {
        return Err(KeyFormatError::Empty);
    }
    Ok(parts.join(SEPARATOR))
}

fn ordered(values: &[Value]) -> Result<String, KeyFormatError> {
    if values.is_empty() {
        return Err(KeyFormatError::Empty);
    }
    let parts = values.iter().map(atomic).collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(SEPARATOR))
}

fn atomic(value: &Value) -> Result<String, KeyFormatError> {
    let formatted = match value {
        Value::TinyInt(Some(v)) => v.to_string(),
        Value::SmallInt(Some(v)) => v.to_string(),
        Value::Int(Some(v)) => v.to_string(),
        Value::BigInt(Some(v)) => v.to_string(),
        Value::TinyUnsigned(Some(v)) => v.to_string(),
        Value::SmallUnsigned(Some(v)) => v.to_string(),
        Value::Unsigned(Some(v)) => v.to_string(),
        Value::BigUnsigned(Some(v)) => v.to_string(),
        Value::Char(Some(v)) => v.to_string(),
        Value::String(Some(v)) => v.to_string(),
        Value::Uuid(Some(v)) => v.to_string(),
        other => return Err(KeyFormatError::Unsupported(other.clone())),
    };
    Ok(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_keys_render_directly() {
        assert_eq!(format_primary_key(42i32).unwrap(), "42");
        assert_eq!(format_primary_key(7u64).unwrap(), "7");
        assert_eq!(format_primary_key("abc".to_string()).unwrap(), "abc");
    }

    #[test]
    fn composite_keys_are_pipe_joined() {
        assert_eq!(format_primary_key((1i32, "a".to_string())).unwrap(), "1|a");
        assert_eq!(format_primary_key((1i32, 2i64, "x".to_string())).unwrap(), "1|2|x");
        let many: Vec<Value> = vec![1i32.into(), 2i32.into(), 3i32.into(), 4i32.into()];
        assert_eq!(ordered(&many).unwrap(), "1|2|3|4");
    }

    #[test]
    fn named_keys_render_pairs() {
        let key = format_named_key([("tenant", Value::from(3i32)), ("slug", Value::from("main"))]).unwrap();
        assert_eq!(key, "tenant:3|slug:main");
    }

    #[test]
    fn rejects_non_atomic_components() {
        assert!(matches!(format_primary_key(1.5f64), Err(KeyFormatError::Unsupported(_))));
        assert!(matches!(format_primary_key(Value::Int(None)), Err(KeyFormatError::Unsupported(_))));
        assert!(matches!(format_primary_key((1i32, true)), Err(KeyFormatError::Unsupported(_))));
    }

    #[test]
    fn rejects_empty_keys() {
        let none: [(&str, Value); 0] = [];
        assert!(matches!(format_named_key(none), Err(KeyFormatError::Empty)));
        assert!(matches!(ordered(&[]), Err(KeyFormatError::Empty)));
    }
}
