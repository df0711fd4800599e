// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-type field declarations.
//!
//! A record type lists its fields once, in [`JsonRecord::describe`], as
//! `(name, getter, setter)` triples. The resulting [`FieldDescriptorSet`] drives
//! both directions: encode walks the getters into an object node, decode
//! default-constructs the type and walks the setters from the node. Keeping a
//! single list means the two directions cannot drift apart.
//!
//! ```rust
//! use echo_json_codec::{FieldSetBuilder, JsonRecord};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Point2D {
//!     x: f64,
//!     y: f64,
//! }
//!
//! impl JsonRecord for Point2D {
//!     const TYPE_NAME: &'static str = "Point2D";
//!
//!     fn describe(fields: &mut FieldSetBuilder<Self>) {
//!         fields
//!             .field("x", |p| &p.x, |p| &mut p.x)
//!             .field("y", |p| &p.y, |p| &mut p.y);
//!     }
//! }
//! ```

use core::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CodecError, RegistryError};
use crate::value::JsonValue;

/// Reserved object key carrying the type tag.
pub const TYPE_TAG_KEY: &str = "__type";

/// A type whose JSON codec is derived from a field declaration.
///
/// Decode builds a blank value with [`Default`] and then populates every
/// declared field, so every declared field is required on input.
pub trait JsonRecord: Default + Clone + Send + Sync + 'static {
    /// Canonical, explicitly assigned name. Always registered in the name
    /// table; must stay stable across builds for stored blobs to decode.
    const TYPE_NAME: &'static str;

    /// Tag stamped into encoded objects under `"__type"`, or `None` to
    /// encode untagged objects. Registered as a second name when it differs
    /// from [`TYPE_NAME`](Self::TYPE_NAME).
    const TYPE_TAG: Option<&'static str> = Some(Self::TYPE_NAME);

    /// Declares the fields of `Self`, in encode order.
    fn describe(fields: &mut FieldSetBuilder<Self>);
}

/// Type-erased accessor for one declared field of `T`.
trait FieldAccess<T>: Send + Sync {
    fn name(&self) -> &'static str;
    fn encode(&self, owner: &T, tagged: bool) -> Result<Value, CodecError>;
    fn decode(&self, owner: &mut T, node: &Value) -> Result<(), CodecError>;
}

struct ValueField<T, V> {
    name: &'static str,
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

impl<T: JsonRecord, V: JsonValue + 'static> FieldAccess<T> for ValueField<T, V> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn encode(&self, owner: &T, _tagged: bool) -> Result<Value, CodecError> {
        (self.get)(owner)
            .to_json()
            .map_err(|err| err.in_field(T::TYPE_NAME, self.name))
    }

    fn decode(&self, owner: &mut T, node: &Value) -> Result<(), CodecError> {
        *(self.get_mut)(owner) =
            V::from_json(node).map_err(|err| err.in_field(T::TYPE_NAME, self.name))?;
        Ok(())
    }
}

struct RecordField<T, V: JsonRecord> {
    name: &'static str,
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
    fields: FieldDescriptorSet<V>,
}

impl<T: JsonRecord, V: JsonRecord> FieldAccess<T> for RecordField<T, V> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn encode(&self, owner: &T, tagged: bool) -> Result<Value, CodecError> {
        self.fields.encode((self.get)(owner), tagged)
    }

    fn decode(&self, owner: &mut T, node: &Value) -> Result<(), CodecError> {
        *(self.get_mut)(owner) = self.fields.decode(node)?;
        Ok(())
    }
}

struct SerdeField<T, V> {
    name: &'static str,
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

impl<T, V> FieldAccess<T> for SerdeField<T, V>
where
    T: JsonRecord,
    V: Serialize + DeserializeOwned + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn encode(&self, owner: &T, _tagged: bool) -> Result<Value, CodecError> {
        serde_json::to_value((self.get)(owner))
            .map_err(|err| CodecError::from(err).in_field(T::TYPE_NAME, self.name))
    }

    fn decode(&self, owner: &mut T, node: &Value) -> Result<(), CodecError> {
        *(self.get_mut)(owner) = V::deserialize(node)
            .map_err(|err| CodecError::from(err).in_field(T::TYPE_NAME, self.name))?;
        Ok(())
    }
}

/// Collects the field declaration of `T`.
///
/// Handed to [`JsonRecord::describe`]; registration calls `describe` once and
/// keeps the finished [`FieldDescriptorSet`]. Misdeclarations (a repeated
/// name, or the reserved `"__type"` key) are recorded and surface as a
/// [`RegistryError`] when the type is registered.
pub struct FieldSetBuilder<T> {
    fields: Vec<Box<dyn FieldAccess<T>>>,
    error: Option<RegistryError>,
}

impl<T: JsonRecord> FieldSetBuilder<T> {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            error: None,
        }
    }

    /// Declares a leaf field converted through [`JsonValue`].
    pub fn field<V>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self
    where
        V: JsonValue + 'static,
    {
        self.push(Box::new(ValueField { name, get, get_mut }))
    }

    /// Declares a nested record field.
    ///
    /// The nested type's own declaration is resolved here, once; the nested
    /// object carries its own `"__type"` tag when encoded.
    pub fn record<V>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self
    where
        V: JsonRecord,
    {
        match FieldDescriptorSet::<V>::declare() {
            Ok(fields) => self.push(Box::new(RecordField {
                name,
                get,
                get_mut,
                fields,
            })),
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
                self
            }
        }
    }

    /// Declares a field converted through its `serde` implementation.
    pub fn serde<V>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self
    where
        V: Serialize + DeserializeOwned + 'static,
    {
        self.push(Box::new(SerdeField { name, get, get_mut }))
    }

    fn push(&mut self, entry: Box<dyn FieldAccess<T>>) -> &mut Self {
        let name = entry.name();
        if self.error.is_none() {
            if name == TYPE_TAG_KEY {
                self.error = Some(RegistryError::ReservedField {
                    type_name: T::TYPE_NAME,
                });
            } else if self.fields.iter().any(|f| f.name() == name) {
                self.error = Some(RegistryError::DuplicateField {
                    type_name: T::TYPE_NAME,
                    field: name,
                });
            }
        }
        self.fields.push(entry);
        self
    }

    fn build(self) -> Result<FieldDescriptorSet<T>, RegistryError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(FieldDescriptorSet {
                fields: self.fields,
            }),
        }
    }
}

/// The finished, immutable field declaration of `T`.
pub struct FieldDescriptorSet<T> {
    fields: Vec<Box<dyn FieldAccess<T>>>,
}

impl<T: JsonRecord> FieldDescriptorSet<T> {
    /// Runs [`JsonRecord::describe`] and validates the result.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateField`] or
    /// [`RegistryError::ReservedField`] for a malformed declaration.
    pub fn declare() -> Result<Self, RegistryError> {
        let mut builder = FieldSetBuilder::new();
        T::describe(&mut builder);
        builder.build()
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name())
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the type declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encodes `value` into an object node.
    ///
    /// When `tagged` is set and `T` declares a [`JsonRecord::TYPE_TAG`], the
    /// node gains a `"__type"` entry. `tagged` also applies to nested records.
    ///
    /// # Errors
    /// Forwards the first field conversion failure.
    pub fn encode(&self, value: &T, tagged: bool) -> Result<Value, CodecError> {
        let mut node = Map::new();
        for field in &self.fields {
            node.insert(field.name().to_owned(), field.encode(value, tagged)?);
        }
        if let (true, Some(tag)) = (tagged, T::TYPE_TAG) {
            node.insert(TYPE_TAG_KEY.to_owned(), Value::String(tag.to_owned()));
        }
        Ok(Value::Object(node))
    }

    /// Decodes an object node into a fresh `T`.
    ///
    /// Extra keys (including `"__type"`) are ignored; every declared field is
    /// required.
    ///
    /// # Errors
    /// Returns [`CodecError::NotAnObject`] for a non-object node,
    /// [`CodecError::MissingField`] for an absent field, or the first field
    /// conversion failure.
    pub fn decode(&self, node: &Value) -> Result<T, CodecError> {
        let object = node.as_object().ok_or(CodecError::NotAnObject {
            type_name: T::TYPE_NAME,
        })?;
        let mut value = T::default();
        for field in &self.fields {
            let child = object.get(field.name()).ok_or(CodecError::MissingField {
                type_name: T::TYPE_NAME,
                field: field.name(),
            })?;
            field.decode(&mut value, child)?;
        }
        Ok(value)
    }
}

impl<T: JsonRecord> fmt::Debug for FieldDescriptorSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptorSet")
            .field("type_name", &T::TYPE_NAME)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .finish()
    }
}
