use serde_json::{Number, Value};

/// A per-field value transformation applied after the key has been renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    /// Numbers and numeric strings become JSON floats. Anything that cannot be
    /// parsed (including results that are not finite) becomes `0`.
    Float,
    /// Numbers and numeric strings become JSON integers, truncating fractions.
    /// Anything that cannot be parsed becomes `0`.
    Int,
    /// Strings are upper-cased to match GraphQL enum value casing. Whitespace
    /// and `-` are replaced with `_`.
    EnumCase,
    /// A plain nested object (or list of objects) is key-transformed with the
    /// mapping registered for the named GraphQL type.
    Nested(&'static str),
}

/// Apply a scalar coercion. Lists are coerced element-wise and `null` stays `null`.
/// `Nested` is handled by the mapping table, which owns the other type mappings.
pub(crate) fn coerce_scalar(coercion: &Coercion, value: Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| coerce_scalar(coercion, item))
                .collect(),
        ),
        value => match coercion {
            Coercion::Float => Value::Number(to_float(&value)),
            Coercion::Int => Value::Number(to_int(&value)),
            Coercion::EnumCase => to_enum_case(value),
            Coercion::Nested(_) => value,
        },
    }
}

fn to_float(value: &Value) -> Number {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(string) => string.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .unwrap_or_else(|| Number::from(0))
}

fn to_int(value: &Value) -> Number {
    let parsed = match value {
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().and_then(truncate)),
        Value::String(string) => {
            let string = string.trim();
            string
                .parse::<i64>()
                .ok()
                .or_else(|| string.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    };
    Number::from(parsed.unwrap_or(0))
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(float: f64) -> Option<i64> {
    (float.is_finite() && float.abs() < 9.0e18).then(|| float.trunc() as i64)
}

fn to_enum_case(value: Value) -> Value {
    match value {
        Value::String(string) => Value::String(
            string
                .trim()
                .chars()
                .map(|ch| {
                    if ch.is_whitespace() || ch == '-' {
                        '_'
                    } else {
                        ch
                    }
                })
                .collect::<String>()
                .to_uppercase(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_float_coercion() {
        assert_eq!(coerce_scalar(&Coercion::Float, json!("12.50")), json!(12.5));
        assert_eq!(coerce_scalar(&Coercion::Float, json!(" 3 ")), json!(3.0));
        assert_eq!(coerce_scalar(&Coercion::Float, json!(7)), json!(7.0));
        assert_eq!(coerce_scalar(&Coercion::Float, json!("abc")), json!(0));
        assert_eq!(coerce_scalar(&Coercion::Float, json!("")), json!(0));
        assert_eq!(coerce_scalar(&Coercion::Float, json!("NaN")), json!(0));
        assert_eq!(coerce_scalar(&Coercion::Float, json!("1e400")), json!(0));
        assert_eq!(coerce_scalar(&Coercion::Float, json!(true)), json!(0));
        assert_eq!(coerce_scalar(&Coercion::Float, json!(null)), json!(null));
        assert_eq!(
            coerce_scalar(&Coercion::Float, json!(["1.5", "x"])),
            json!([1.5, 0])
        );
    }

    #[test]
    fn test_int_coercion() {
        assert_eq!(coerce_scalar(&Coercion::Int, json!("42")), json!(42));
        assert_eq!(coerce_scalar(&Coercion::Int, json!("4.9")), json!(4));
        assert_eq!(coerce_scalar(&Coercion::Int, json!(2.5)), json!(2));
        assert_eq!(coerce_scalar(&Coercion::Int, json!("many")), json!(0));
    }

    #[test]
    fn test_enum_case_coercion() {
        assert_eq!(
            coerce_scalar(&Coercion::EnumCase, json!("appointment")),
            json!("APPOINTMENT")
        );
        assert_eq!(
            coerce_scalar(&Coercion::EnumCase, json!(["Facebook Message", "pre-call"])),
            json!(["FACEBOOK_MESSAGE", "PRE_CALL"])
        );
        assert_eq!(coerce_scalar(&Coercion::EnumCase, json!(3)), json!(3));
    }
}
