//! Loosely typed filter maps → [`FilterSet`].

use keyset_core::cursor::parse_value;
use keyset_core::{Error, Filter, FilterSet, Value, ValueKind};
use keyset_db::KeysetEntity;
use serde_json::{Map, Value as JsonValue};

/// Convert a wire filter map for entity `E`.
///
/// Keys must be in `E`'s filter allow-list. Arrays become set membership (an
/// empty array is kept and later dropped by the compiler), scalars become
/// equality. Values are coerced to the column's kind.
pub fn filter_set<E: KeysetEntity>(raw: &Map<String, JsonValue>) -> Result<FilterSet, Error> {
    let mut out = FilterSet::new();

    for (field, value) in raw {
        let column = E::filter_column(field)
            .ok_or_else(|| Error::invalid_filter(field, "not a filterable column"))?;

        let filter = match value {
            JsonValue::Array(items) => Filter::OneOf(
                items
                    .iter()
                    .map(|v| coerce(field, column.kind, v))
                    .collect::<Result<_, _>>()?,
            ),
            scalar => Filter::Equals(coerce(field, column.kind, scalar)?),
        };
        out.insert(column.name, filter);
    }

    Ok(out)
}

fn coerce(field: &str, kind: ValueKind, v: &JsonValue) -> Result<Value, Error> {
    match (kind, v) {
        (ValueKind::Integer, JsonValue::Number(n)) => n
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| Error::invalid_filter(field, format!("{n} is not an integer"))),
        (_, JsonValue::String(s)) => parse_value(kind, s)
            .map_err(|_| Error::invalid_filter(field, format!("{s:?} is not a {kind}"))),
        (_, other) => Err(Error::invalid_filter(
            field,
            format!("unsupported value {other} for {kind} column"),
        )),
    }
}
