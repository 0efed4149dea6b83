use std::fmt::{self, Display};

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One named field of a struct column.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub dtype: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: DataType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

/// The element type of a paged column.
///
/// `Null` is the type of an all-null column (e.g. one produced by
/// `extend_nulls` on a fresh list); a `Null` value is a member of every
/// type, which is how nullable columns are modelled.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Null,
    Boolean,
    Int,
    Float,
    Text,
    Bytes,
    Struct(Vec<Field>),
    List(Box<DataType>),
}

impl DataType {
    /// Struct field lookup by exact name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            DataType::Struct(fields) => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    /// Struct field lookup ignoring ASCII case. Exact matches win.
    pub fn field_ignore_case(&self, name: &str) -> Option<&Field> {
        match self {
            DataType::Struct(fields) => fields
                .iter()
                .find(|f| f.name == name)
                .or_else(|| fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))),
            _ => None,
        }
    }

    /// Whether a value may be stored in a column of this type.
    pub fn is_compatible(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match (self, value) {
            (DataType::Boolean, Value::Boolean(_)) => true,
            (DataType::Int, Value::Int(_)) => true,
            (DataType::Float, Value::Float(_)) => true,
            (DataType::Text, Value::Text(_)) => true,
            (DataType::Bytes, Value::Bytes(_)) => true,
            (DataType::Struct(fields), Value::Struct(entries)) => {
                entries.iter().all(|(name, v)| {
                    fields
                        .iter()
                        .find(|f| &f.name == name)
                        .is_some_and(|f| f.dtype.is_compatible(v))
                })
            }
            (DataType::List(element), Value::List(items)) => {
                items.iter().all(|v| element.is_compatible(v))
            }
            _ => false,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "null"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::Text => write!(f, "text"),
            DataType::Bytes => write!(f, "bytes"),
            DataType::Struct(fields) => {
                write!(f, "struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.dtype)?;
                }
                write!(f, ">")
            }
            DataType::List(element) => write!(f, "list<{element}>"),
        }
    }
}

/// An ordered sequence of field names navigating into nested structured
/// records; the empty path addresses the whole record.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath(SmallVec<[String; 2]>);

impl FieldPath {
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    pub fn new<I>(segments: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "<root>");
        }
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(name: &str) -> Self {
        Self::new([name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_schema() -> DataType {
        DataType::Struct(vec![
            Field::new("remotePath", DataType::Text),
            Field::new(
                "label",
                DataType::Struct(vec![Field::new("category", DataType::Text)]),
            ),
        ])
    }

    #[test]
    fn field_lookup() {
        let schema = label_schema();
        assert!(schema.field("remotePath").is_some());
        assert!(schema.field("REMOTEPATH").is_none());
        assert!(schema.field_ignore_case("REMOTEPATH").is_some());
        assert!(schema.field_ignore_case("missing").is_none());
    }

    #[test]
    fn compatibility() {
        let schema = label_schema();
        let record = Value::Struct(vec![
            ("remotePath".into(), Value::Text("a.jpg".into())),
            (
                "label".into(),
                Value::Struct(vec![("category".into(), Value::Text("cat".into()))]),
            ),
        ]);
        assert!(schema.is_compatible(&record));
        assert!(schema.is_compatible(&Value::Null));
        assert!(!schema.is_compatible(&Value::Int(1)));

        assert!(DataType::Int.is_compatible(&Value::Null));
        assert!(!DataType::Int.is_compatible(&Value::Text("1".into())));
    }

    #[test]
    fn paths() {
        let path = FieldPath::new(["label", "category"]);
        assert_eq!(path.to_string(), "label.category");
        assert_eq!(path.child("id").segments().len(), 3);
        assert!(FieldPath::root().is_root());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn schema_serialization_shape() {
        let json = serde_json::to_value(label_schema()).unwrap();
        assert_eq!(json["Struct"][0]["name"], "remotePath");
        assert_eq!(json["Struct"][0]["dtype"], "Text");

        let back: DataType = serde_json::from_value(json).unwrap();
        assert_eq!(back, label_schema());
    }
}
