use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::schema::{DataType, Field};

/// A single element of a paged column.
///
/// `Struct` keeps the field order received from the remote sheet; field
/// names are unique within one struct. Scalars map one-to-one onto the
/// remote schema's primitive types.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Struct(Vec<(String, Value)>),
    List(Vec<Value>),
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => state.write_u8(0),
            Value::Boolean(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Struct(fields) => fields.hash(state),
            Value::List(items) => items.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Struct field access by exact name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Struct field access tolerating case differences between the caller's
    /// spelling and the remote record's spelling. Exact matches win.
    pub fn field_ignore_case(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields
                .iter()
                .find(|(n, _)| n == name)
                .or_else(|| fields.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Infer the schema of this value. `Null` infers as `DataType::Null`,
    /// which is compatible with every column type.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Boolean(_) => DataType::Boolean,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Text(_) => DataType::Text,
            Value::Bytes(_) => DataType::Bytes,
            Value::Struct(fields) => DataType::Struct(
                fields
                    .iter()
                    .map(|(name, value)| Field::new(name.clone(), value.data_type()))
                    .collect(),
            ),
            Value::List(items) => {
                let element = items
                    .iter()
                    .find(|v| !v.is_null())
                    .map(Value::data_type)
                    .unwrap_or(DataType::Null);
                DataType::List(Box::new(element))
            }
        }
    }
}

/// Local conversion trait so tests and callers can pass primitives directly.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self as i64)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl<'a> IntoValue for &'a str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_field_lookup() {
        let value = Value::Struct(vec![
            ("Path".into(), Value::Text("a.jpg".into())),
            ("size".into(), Value::Int(42)),
        ]);

        assert_eq!(value.field("size"), Some(&Value::Int(42)));
        assert_eq!(value.field("SIZE"), None);
        assert_eq!(value.field_ignore_case("SIZE"), Some(&Value::Int(42)));
        // Exact match wins over a case-insensitive one.
        assert_eq!(
            value.field_ignore_case("Path"),
            Some(&Value::Text("a.jpg".into()))
        );
    }

    #[test]
    fn data_type_inference() {
        let value = Value::Struct(vec![
            ("v".into(), Value::Int(1)),
            ("tags".into(), Value::List(vec![Value::Text("x".into())])),
        ]);

        match value.data_type() {
            DataType::Struct(fields) => {
                assert_eq!(fields[0].name, "v");
                assert_eq!(fields[0].dtype, DataType::Int);
                assert_eq!(fields[1].dtype, DataType::List(Box::new(DataType::Text)));
            }
            other => panic!("expected struct, got {other}"),
        }
    }

    #[test]
    fn into_value_conversions() {
        assert_eq!(7.into_value(), Value::Int(7));
        assert_eq!("x".into_value(), Value::Text("x".into()));
        assert_eq!(None::<i64>.into_value(), Value::Null);
    }
}
