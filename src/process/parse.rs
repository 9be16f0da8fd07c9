use crate::schema::{Value, ValueType};

/// Cell contents meters use for "no value".
const SENTINELS: &[&str] = &["[error]", "null"];

/// Trim whitespace and drop empty or sentinel cells.
pub fn clean_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || SENTINELS.contains(&trimmed) {
        None
    } else {
        Some(trimmed)
    }
}

/// Parse one cell as `ty`. `None` leaves the field at its zero value.
pub fn parse_value(raw: &str, ty: ValueType) -> Option<Value> {
    if ty == ValueType::Text {
        return Some(Value::Text(raw.to_string()));
    }
    let s = clean_cell(raw)?;
    match ty {
        ValueType::Text => None,
        ValueType::Decimal => s.parse::<f64>().ok().map(Value::Decimal),
        ValueType::SmallUnsigned => parse_unsigned(s).map(Value::SmallUnsigned),
        ValueType::U16 => parse_unsigned(s).map(Value::U16),
        ValueType::U32 => parse_unsigned(s).map(Value::U32),
        ValueType::Integer => s.parse::<i64>().ok().map(Value::Integer),
    }
}

/// Plain decimal digits only; `str::parse` would also take a leading `+`.
fn parse_unsigned<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.starts_with('+') {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_verbatim() {
        assert_eq!(
            parse_value("  2025-06-14 12:00 ", ValueType::Text),
            Some(Value::Text("  2025-06-14 12:00 ".into()))
        );
        assert_eq!(
            parse_value("[error]", ValueType::Text),
            Some(Value::Text("[error]".into()))
        );
    }

    #[test]
    fn decimals() {
        assert_eq!(parse_value(" 230.5 ", ValueType::Decimal), Some(Value::Decimal(230.5)));
        assert_eq!(parse_value("-1e3", ValueType::Decimal), Some(Value::Decimal(-1000.0)));
        for bad in ["", "   ", "[error]", "null", " null ", "12,5", "abc"] {
            assert_eq!(parse_value(bad, ValueType::Decimal), None, "{:?}", bad);
        }
    }

    #[test]
    fn small_unsigned_range() {
        assert_eq!(parse_value("0", ValueType::SmallUnsigned), Some(Value::SmallUnsigned(0)));
        assert_eq!(parse_value(" 255", ValueType::SmallUnsigned), Some(Value::SmallUnsigned(255)));
        for bad in ["256", "-1", "1.5", "+4", "[error]", ""] {
            assert_eq!(parse_value(bad, ValueType::SmallUnsigned), None, "{:?}", bad);
        }
    }

    #[test]
    fn wider_integers() {
        assert_eq!(parse_value("65535", ValueType::U16), Some(Value::U16(65_535)));
        assert_eq!(parse_value("65536", ValueType::U16), None);
        assert_eq!(parse_value("4294967295", ValueType::U32), Some(Value::U32(u32::MAX)));
        assert_eq!(parse_value("4294967296", ValueType::U32), None);
        assert_eq!(parse_value("-42", ValueType::Integer), Some(Value::Integer(-42)));
        assert_eq!(parse_value("null", ValueType::Integer), None);
    }
}
