// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed codecs and their object-safe, type-erased form.

use core::any::Any;
use core::marker::PhantomData;

use serde_json::Value;

use crate::erased::ErasedValue;
use crate::error::CodecError;
use crate::fields::{FieldDescriptorSet, JsonRecord, TYPE_TAG_KEY};
use crate::ident::TypeId;
use crate::value::JsonValue;

/// Hand-written codec for a type that does not use a field declaration.
///
/// Contract:
/// - `decode(encode(v))` must reconstruct a value equal to `v`.
/// - `encode` should produce an object node if the type is to be decoded by
///   name; the registry stamps the `"__type"` tag into object nodes only.
pub trait JsonCodec<T> {
    /// Canonical, explicitly assigned name for `T`.
    const TYPE_NAME: &'static str;

    /// Tag stamped into encoded objects, or `None` for untagged output.
    const TYPE_TAG: Option<&'static str> = Some(Self::TYPE_NAME);

    /// Encodes `value` into a node.
    ///
    /// # Errors
    /// Returns an error if `value` has no JSON form.
    fn encode(value: &T) -> Result<Value, CodecError>;

    /// Decodes a node into a fresh `T`.
    ///
    /// # Errors
    /// Returns an error if `node` is not a valid encoding of `T`.
    fn decode(node: &Value) -> Result<T, CodecError>;
}

/// Object-safe codec for exactly one concrete type.
///
/// The registry stores one of these per [`TypeId`] and dispatches to it after
/// resolving a value's runtime type or a node's `"__type"` tag.
pub trait ErasedCodec: Send + Sync {
    /// Type handled by this codec.
    fn codec_type_id(&self) -> TypeId;

    /// Canonical name registered for the type.
    fn type_name(&self) -> &'static str;

    /// Tag stamped into encoded objects, if any.
    fn type_tag(&self) -> Option<&'static str>;

    /// Declared field names in order (empty for hand-written and scalar codecs).
    fn field_names(&self) -> Vec<&'static str>;

    /// Encodes an erased value.
    ///
    /// # Errors
    /// Returns [`CodecError::TypeMismatch`] if `value` does not hold this
    /// codec's type, or forwards the typed encode failure.
    fn encode_any(&self, value: &ErasedValue, tagged: bool) -> Result<Value, CodecError>;

    /// Decodes a node into a fresh erased value of this codec's type.
    ///
    /// # Errors
    /// Forwards the typed decode failure.
    fn decode_any(&self, node: &Value) -> Result<ErasedValue, CodecError>;
}

pub(crate) struct RecordCodec<T: JsonRecord> {
    fields: FieldDescriptorSet<T>,
}

impl<T: JsonRecord> RecordCodec<T> {
    pub(crate) fn new(fields: FieldDescriptorSet<T>) -> Self {
        Self { fields }
    }
}

impl<T: JsonRecord> ErasedCodec for RecordCodec<T> {
    fn codec_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn type_tag(&self) -> Option<&'static str> {
        T::TYPE_TAG
    }

    fn field_names(&self) -> Vec<&'static str> {
        self.fields.field_names().collect()
    }

    fn encode_any(&self, value: &ErasedValue, tagged: bool) -> Result<Value, CodecError> {
        self.fields.encode(value.try_ref::<T>()?, tagged)
    }

    fn decode_any(&self, node: &Value) -> Result<ErasedValue, CodecError> {
        self.fields.decode(node).map(ErasedValue::new)
    }
}

pub(crate) struct ManualCodec<T, C> {
    _marker: PhantomData<fn() -> (T, C)>,
}

impl<T, C> ManualCodec<T, C> {
    pub(crate) const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T, C> ErasedCodec for ManualCodec<T, C>
where
    T: Any + Clone + Send + Sync,
    C: JsonCodec<T> + 'static,
{
    fn codec_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        C::TYPE_NAME
    }

    fn type_tag(&self) -> Option<&'static str> {
        C::TYPE_TAG
    }

    fn field_names(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn encode_any(&self, value: &ErasedValue, tagged: bool) -> Result<Value, CodecError> {
        let mut node = C::encode(value.try_ref::<T>()?)?;
        if let (true, Some(tag), Value::Object(object)) = (tagged, C::TYPE_TAG, &mut node) {
            object.insert(TYPE_TAG_KEY.to_owned(), Value::String(tag.to_owned()));
        }
        Ok(node)
    }

    fn decode_any(&self, node: &Value) -> Result<ErasedValue, CodecError> {
        C::decode(node).map(ErasedValue::new)
    }
}

/// Untagged codec for a [`JsonValue`] leaf type (numbers, strings, ...).
pub(crate) struct ScalarCodec<V> {
    name: &'static str,
    _marker: PhantomData<fn() -> V>,
}

impl<V> ScalarCodec<V> {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }
}

impl<V> ErasedCodec for ScalarCodec<V>
where
    V: JsonValue + Any + Clone + Send + Sync,
{
    fn codec_type_id(&self) -> TypeId {
        TypeId::of::<V>()
    }

    fn type_name(&self) -> &'static str {
        self.name
    }

    fn type_tag(&self) -> Option<&'static str> {
        None
    }

    fn field_names(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn encode_any(&self, value: &ErasedValue, _tagged: bool) -> Result<Value, CodecError> {
        value.try_ref::<V>()?.to_json()
    }

    fn decode_any(&self, node: &Value) -> Result<ErasedValue, CodecError> {
        V::from_json(node).map(ErasedValue::new)
    }
}
