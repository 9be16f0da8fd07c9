// src/schema/types.rs

use serde::{Deserialize, Serialize};

/// Native type a field is parsed into.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Text,
    /// f64
    Decimal,
    /// u8
    SmallUnsigned,
    U16,
    U32,
    /// i64
    Integer,
}

/// One declared field of a data class: which register it comes from and how to read it.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub struct FieldSpec {
    /// Field name; also used as a fallback when matching column labels.
    pub name: &'static str,
    /// Serialized (snake_case) key.
    pub key: &'static str,
    pub register_code: &'static str,
    pub value_type: ValueType,
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        key: &'static str,
        register_code: &'static str,
        value_type: ValueType,
    ) -> Self {
        Self {
            name,
            key,
            register_code,
            value_type,
        }
    }

    /// Whether the field name reads as a timestamp, enabling the clock-column fallback.
    pub fn is_temporal(&self) -> bool {
        let lower = self.name.to_ascii_lowercase();
        lower.contains("time") || lower.contains("date")
    }
}

/// A parsed field value. Serializes as the bare scalar; reading one back needs the
/// field's [`ValueType`], so there is no `Deserialize`.
#[derive(Debug, Serialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Decimal(f64),
    SmallUnsigned(u8),
    U16(u16),
    U32(u32),
    Integer(i64),
}

impl Value {
    /// The value an unmatched or unparseable field keeps.
    pub fn zero(ty: ValueType) -> Self {
        match ty {
            ValueType::Text => Value::Text(String::new()),
            ValueType::Decimal => Value::Decimal(0.0),
            ValueType::SmallUnsigned => Value::SmallUnsigned(0),
            ValueType::U16 => Value::U16(0),
            ValueType::U32 => Value::U32(0),
            ValueType::Integer => Value::Integer(0),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Text(_) => ValueType::Text,
            Value::Decimal(_) => ValueType::Decimal,
            Value::SmallUnsigned(_) => ValueType::SmallUnsigned,
            Value::U16(_) => ValueType::U16,
            Value::U32(_) => ValueType::U32,
            Value::Integer(_) => ValueType::Integer,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Text(_) => None,
            Value::Decimal(v) => Some(*v),
            Value::SmallUnsigned(v) => Some(f64::from(*v)),
            Value::U16(v) => Some(f64::from(*v)),
            Value::U32(v) => Some(f64::from(*v)),
            Value::Integer(v) => Some(*v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_serialize_as_integers() {
        assert_eq!(serde_json::to_value(Value::U16(5)).unwrap(), json!(5));
        assert_eq!(serde_json::to_value(Value::SmallUnsigned(7)).unwrap(), json!(7));
        assert_eq!(serde_json::to_value(Value::Integer(-3)).unwrap(), json!(-3));
        assert_eq!(serde_json::to_value(Value::Decimal(5.0)).unwrap(), json!(5.0));
        assert_eq!(serde_json::to_value(Value::Text("x".into())).unwrap(), json!("x"));
    }

    #[test]
    fn zero_keeps_the_declared_type() {
        for ty in [
            ValueType::Text,
            ValueType::Decimal,
            ValueType::SmallUnsigned,
            ValueType::U16,
            ValueType::U32,
            ValueType::Integer,
        ] {
            assert_eq!(Value::zero(ty).value_type(), ty);
        }
        assert_eq!(Value::U32(9).as_f64(), Some(9.0));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
    }
}
