use serde_json::{Number, Value};

// Largest integer an f64 represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// `current + delta` for a stored amount; absent or null counts as zero.
///
/// Integer amounts stay integers (exactly, up to the u64/i64 range) when the
/// delta is whole, so `500 + 100` is written back as `600`, not `600.0`.
pub fn add_amount(current: Option<&Value>, delta: f64) -> Result<Value, &'static str> {
    let current = match current {
        None | Some(Value::Null) => return amount_value(delta),
        Some(Value::Number(n)) => n,
        Some(_) => return Err("not a number"),
    };

    let integer = current
        .as_i64()
        .map(i128::from)
        .or_else(|| current.as_u64().map(i128::from));

    if let Some(integer) = integer {
        if is_exact_integer(delta) {
            let sum = integer + delta as i128;
            if let Ok(sum) = i64::try_from(sum) {
                return Ok(Value::from(sum));
            }
            if let Ok(sum) = u64::try_from(sum) {
                return Ok(Value::from(sum));
            }
        }
    }

    let current = current.as_f64().ok_or("not a number")?;
    amount_value(current + delta)
}

/// Whole amounts become JSON integers.
fn amount_value(value: f64) -> Result<Value, &'static str> {
    if is_exact_integer(value) {
        return Ok(Value::from(value as i64));
    }
    Number::from_f64(value).map(Value::Number).ok_or("not a finite number")
}

fn is_exact_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER
}
