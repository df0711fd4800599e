// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Leaf conversions between field types and JSON nodes.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde_json::{Map, Number, Value};

use crate::error::CodecError;

/// Conversion between a field type and a JSON node.
///
/// Implemented for scalars, strings, and the standard containers. Record types
/// declared with [`JsonRecord`](crate::JsonRecord) are nested through
/// [`FieldSetBuilder::record`](crate::FieldSetBuilder::record) instead.
///
/// Reads are strict about kind (a string never becomes a number) but follow
/// JSON's single number type: any integer node reads as a float, and integer
/// reads are range-checked against the target width.
pub trait JsonValue: Sized {
    /// Converts `self` into a node.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidValue`] if the value has no JSON form
    /// (for example a non-finite float).
    fn to_json(&self) -> Result<Value, CodecError>;

    /// Reads a value from `node`.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidValue`] if `node` has the wrong kind or is
    /// out of range.
    fn from_json(node: &Value) -> Result<Self, CodecError>;
}

fn kind_of(node: &Value) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(expected: &str, node: &Value) -> CodecError {
    CodecError::InvalidValue(format!("expected {expected}, found {}", kind_of(node)))
}

impl JsonValue for bool {
    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::Bool(*self))
    }

    fn from_json(node: &Value) -> Result<Self, CodecError> {
        node.as_bool().ok_or_else(|| mismatch("bool", node))
    }
}

macro_rules! signed_json_value {
    ($($ty:ty),* $(,)?) => {$(
        impl JsonValue for $ty {
            fn to_json(&self) -> Result<Value, CodecError> {
                Ok(Value::Number(Number::from(*self)))
            }

            fn from_json(node: &Value) -> Result<Self, CodecError> {
                let wide = node.as_i64().ok_or_else(|| mismatch("integer", node))?;
                <$ty>::try_from(wide).map_err(|_| {
                    CodecError::InvalidValue(format!(
                        "{wide} is out of range for {}",
                        stringify!($ty)
                    ))
                })
            }
        }
    )*};
}

macro_rules! unsigned_json_value {
    ($($ty:ty),* $(,)?) => {$(
        impl JsonValue for $ty {
            fn to_json(&self) -> Result<Value, CodecError> {
                Ok(Value::Number(Number::from(*self)))
            }

            fn from_json(node: &Value) -> Result<Self, CodecError> {
                let wide = node
                    .as_u64()
                    .ok_or_else(|| mismatch("non-negative integer", node))?;
                <$ty>::try_from(wide).map_err(|_| {
                    CodecError::InvalidValue(format!(
                        "{wide} is out of range for {}",
                        stringify!($ty)
                    ))
                })
            }
        }
    )*};
}

signed_json_value!(i8, i16, i32, i64);
unsigned_json_value!(u8, u16, u32, u64);

impl JsonValue for f64 {
    fn to_json(&self) -> Result<Value, CodecError> {
        Number::from_f64(*self)
            .map(Value::Number)
            .ok_or_else(|| CodecError::InvalidValue(format!("{self} has no JSON representation")))
    }

    fn from_json(node: &Value) -> Result<Self, CodecError> {
        node.as_f64().ok_or_else(|| mismatch("number", node))
    }
}

impl JsonValue for f32 {
    fn to_json(&self) -> Result<Value, CodecError> {
        f64::from(*self).to_json()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_json(node: &Value) -> Result<Self, CodecError> {
        let wide = f64::from_json(node)?;
        let narrow = wide as f32;
        if narrow.is_infinite() {
            return Err(CodecError::InvalidValue(format!(
                "{wide} out of range for f32"
            )));
        }
        Ok(narrow)
    }
}

impl JsonValue for String {
    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(Value::String(self.clone()))
    }

    fn from_json(node: &Value) -> Result<Self, CodecError> {
        node.as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch("string", node))
    }
}

impl JsonValue for Value {
    fn to_json(&self) -> Result<Value, CodecError> {
        Ok(self.clone())
    }

    fn from_json(node: &Value) -> Result<Self, CodecError> {
        Ok(node.clone())
    }
}

impl<V: JsonValue> JsonValue for Option<V> {
    fn to_json(&self) -> Result<Value, CodecError> {
        self.as_ref().map_or(Ok(Value::Null), JsonValue::to_json)
    }

    fn from_json(node: &Value) -> Result<Self, CodecError> {
        if node.is_null() {
            Ok(None)
        } else {
            V::from_json(node).map(Some)
        }
    }
}

impl<V: JsonValue> JsonValue for Vec<V> {
    fn to_json(&self) -> Result<Value, CodecError> {
        self.iter()
            .map(JsonValue::to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn from_json(node: &Value) -> Result<Self, CodecError> {
        node.as_array()
            .ok_or_else(|| mismatch("array", node))?
            .iter()
            .map(V::from_json)
            .collect()
    }
}

impl<V: JsonValue> JsonValue for BTreeMap<String, V> {
    fn to_json(&self) -> Result<Value, CodecError> {
        let mut out = Map::new();
        for (key, value) in self {
            out.insert(key.clone(), value.to_json()?);
        }
        Ok(Value::Object(out))
    }

    fn from_json(node: &Value) -> Result<Self, CodecError> {
        node.as_object()
            .ok_or_else(|| mismatch("object", node))?
            .iter()
            .map(|(key, value)| Ok::<_, CodecError>((key.clone(), V::from_json(value)?)))
            .collect()
    }
}

impl<V, S> JsonValue for HashMap<String, V, S>
where
    V: JsonValue,
    S: BuildHasher + Default,
{
    fn to_json(&self) -> Result<Value, CodecError> {
        let mut out = Map::new();
        for (key, value) in self {
            out.insert(key.clone(), value.to_json()?);
        }
        Ok(Value::Object(out))
    }

    fn from_json(node: &Value) -> Result<Self, CodecError> {
        node.as_object()
            .ok_or_else(|| mismatch("object", node))?
            .iter()
            .map(|(key, value)| Ok::<_, CodecError>((key.clone(), V::from_json(value)?)))
            .collect()
    }
}
