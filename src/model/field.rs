use serde::{Serialize, Serializer};

use crate::model::Value;

/// Tri-state slot for a projected field.
///
/// `Absent` means the field was not requested or the record had no data for
/// it. `Null` means it was requested and the record holds an explicit null.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }
}

impl<T: FromValue> Field<T> {
    /// Read a typed slot out of a raw value. A value of the wrong shape
    /// resolves to `Absent`, the same as a missing one.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Field::Null,
            other => match T::from_value(other) {
                Some(v) => Field::Value(v),
                None => {
                    log::debug!("dropping value {} of unexpected shape", other);
                    Field::Absent
                }
            },
        }
    }
}

// Owners skip Absent slots with `skip_serializing_if = "Field::is_absent"`.
// If one reaches the serializer anyway it encodes like Null.
impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Value(v) => v.serialize(serializer),
            Field::Absent | Field::Null => serializer.serialize_none(),
        }
    }
}

/// Conversion from an untyped [`Value`] into a typed field payload
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}
