// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Codec registry: dispatch by runtime type and by serialized type name.
//!
//! The registry keeps two tables:
//! - `TypeId -> codec`, used when the caller holds a value (encode) or knows
//!   the type it wants back (direct decode);
//! - `name -> TypeId`, used to resolve the `"__type"` tag of a node whose type
//!   the caller does not know.
//!
//! Names are explicit strings chosen by the type author, so they are stable
//! across builds; `TypeId`s are not, and never appear in encoded output.

use core::any::Any;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::codec::{ErasedCodec, JsonCodec, ManualCodec, RecordCodec, ScalarCodec};
use crate::config::{NameConflict, RegistryConfig};
use crate::erased::ErasedValue;
use crate::error::{CodecError, RegistryError};
use crate::fields::{FieldDescriptorSet, JsonRecord, TYPE_TAG_KEY};
use crate::ident::TypeId;
use crate::value::JsonValue;

/// Registry of JSON codecs keyed by runtime type.
///
/// Build one at startup, register every type, then share it (by reference or
/// behind [`SharedCodecRegistry`](crate::SharedCodecRegistry)). Encode and
/// decode only read the tables.
///
/// ```rust
/// use echo_json_codec::{CodecRegistry, ErasedValue, FieldSetBuilder, JsonRecord};
/// use serde_json::json;
///
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct Point2D {
///     x: f64,
///     y: f64,
/// }
///
/// impl JsonRecord for Point2D {
///     const TYPE_NAME: &'static str = "Point2D";
///
///     fn describe(fields: &mut FieldSetBuilder<Self>) {
///         fields
///             .field("x", |p| &p.x, |p| &mut p.x)
///             .field("y", |p| &p.y, |p| &mut p.y);
///     }
/// }
///
/// let mut registry = CodecRegistry::new();
/// registry.register::<Point2D>().unwrap();
///
/// let node = registry.encode(&ErasedValue::new(Point2D { x: 1.0, y: 2.0 })).unwrap();
/// assert_eq!(node, json!({"x": 1.0, "y": 2.0, "__type": "Point2D"}));
///
/// let back = registry.decode(&node).unwrap();
/// assert_eq!(back.downcast::<Point2D>().unwrap(), Point2D { x: 1.0, y: 2.0 });
/// ```
#[derive(Default)]
pub struct CodecRegistry {
    config: RegistryConfig,
    codecs: FxHashMap<TypeId, Box<dyn ErasedCodec>>,
    names: FxHashMap<String, TypeId>,
}

impl CodecRegistry {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with `config`.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates a registry with the builtin scalar codecs already registered.
    ///
    /// # Errors
    /// See [`register_builtins`](Self::register_builtins).
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register_builtins()?;
        Ok(registry)
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers the record type `T` from its field declaration.
    ///
    /// Binds `T::TYPE_NAME` and, when present and different, `T::TYPE_TAG` in
    /// the name table. Registering the same type again replaces its codec;
    /// no duplicate entries accumulate.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateField`] or
    /// [`RegistryError::ReservedField`] for a malformed declaration, or
    /// [`RegistryError::NameConflict`] under [`NameConflict::Reject`]. A failed
    /// registration leaves the registry unchanged.
    pub fn register<T: JsonRecord>(&mut self) -> Result<(), RegistryError> {
        let fields = FieldDescriptorSet::<T>::declare()?;
        self.insert(Box::new(RecordCodec::new(fields)))
    }

    /// Registers the hand-written codec `C` for `T`.
    ///
    /// # Errors
    /// Returns [`RegistryError::NameConflict`] under [`NameConflict::Reject`].
    pub fn register_codec<T, C>(&mut self) -> Result<(), RegistryError>
    where
        T: Any + Clone + Send + Sync,
        C: JsonCodec<T> + 'static,
    {
        self.insert(Box::new(ManualCodec::<T, C>::new()))
    }

    /// Registers an untagged codec for the leaf type `V` under `name`.
    ///
    /// Leaf nodes cannot carry a `"__type"` tag, so such values only decode
    /// through [`decode_as`](Self::decode_as) or
    /// [`decode_typed`](Self::decode_typed).
    ///
    /// # Errors
    /// Returns [`RegistryError::NameConflict`] under [`NameConflict::Reject`].
    pub fn register_scalar<V>(&mut self, name: &'static str) -> Result<(), RegistryError>
    where
        V: JsonValue + Any + Clone + Send + Sync,
    {
        self.insert(Box::new(ScalarCodec::<V>::new(name)))
    }

    /// Registers the builtin scalars: `bool`, `i64` ("int64"), `u64`
    /// ("uint64"), `f64` ("double") and `String` ("string").
    ///
    /// # Errors
    /// Returns [`RegistryError::NameConflict`] under [`NameConflict::Reject`]
    /// if one of the builtin names is already taken by another type. All five
    /// names are checked first, so a rejected call registers nothing.
    pub fn register_builtins(&mut self) -> Result<(), RegistryError> {
        if self.config.name_conflict == NameConflict::Reject {
            let builtins = [
                ("bool", TypeId::of::<bool>()),
                ("int64", TypeId::of::<i64>()),
                ("uint64", TypeId::of::<u64>()),
                ("double", TypeId::of::<f64>()),
                ("string", TypeId::of::<String>()),
            ];
            for (name, type_id) in builtins {
                self.check_name(name, type_id)?;
            }
        }
        self.register_scalar::<bool>("bool")?;
        self.register_scalar::<i64>("int64")?;
        self.register_scalar::<u64>("uint64")?;
        self.register_scalar::<f64>("double")?;
        self.register_scalar::<String>("string")
    }

    fn check_name(&self, name: &str, type_id: TypeId) -> Result<(), RegistryError> {
        match self.names.get(name) {
            Some(&existing) if existing != type_id => Err(RegistryError::NameConflict {
                name: name.to_owned(),
                existing,
                incoming: type_id,
            }),
            _ => Ok(()),
        }
    }

    fn insert(&mut self, codec: Box<dyn ErasedCodec>) -> Result<(), RegistryError> {
        let type_id = codec.codec_type_id();
        let type_name = codec.type_name();
        let tag = codec.type_tag();
        let mut names = vec![type_name];
        if let Some(tag) = tag.filter(|tag| *tag != type_name) {
            names.push(tag);
        }

        if self.config.name_conflict == NameConflict::Reject {
            for name in &names {
                self.check_name(name, type_id)?;
            }
        }

        // Names bound by a replaced codec that the new one no longer claims.
        self.names.retain(|name, bound| {
            let stale =
                *bound == type_id && !names.iter().any(|claimed| *claimed == name.as_str());
            if stale {
                debug!(name = %name, type_name, "unbinding stale type name");
            }
            !stale
        });

        for name in &names {
            if let Some(previous) = self.names.insert((*name).to_owned(), type_id) {
                if previous != type_id {
                    warn!(
                        name = %name,
                        previous = %previous,
                        incoming = %type_id,
                        "type name rebound to a different type"
                    );
                }
            }
        }

        let fields = codec.field_names().len();
        if self.codecs.insert(type_id, codec).is_some() {
            debug!(type_id = %type_id, type_name, "replacing existing codec");
        }
        debug!(type_id = %type_id, type_name, ?tag, fields, "registered codec");
        Ok(())
    }

    /// Encodes an erased value with the codec registered for its runtime type.
    ///
    /// # Errors
    /// Returns [`CodecError::UnregisteredType`] if the value's type has no
    /// codec, or forwards the codec's failure.
    pub fn encode(&self, value: &ErasedValue) -> Result<Value, CodecError> {
        let type_id = value.type_id();
        let codec = self
            .codecs
            .get(&type_id)
            .ok_or(CodecError::UnregisteredType(type_id))?;
        trace!(type_name = codec.type_name(), "encode");
        codec.encode_any(value, self.config.emit_type_tag)
    }

    /// Encodes a statically typed value.
    ///
    /// Still dispatches through the registry, so `T` must be registered. The
    /// value is cloned into an [`ErasedValue`] for the call.
    ///
    /// # Errors
    /// Same as [`encode`](Self::encode).
    pub fn encode_typed<T>(&self, value: &T) -> Result<Value, CodecError>
    where
        T: Any + Clone + Send + Sync,
    {
        self.encode(&ErasedValue::new(value.clone()))
    }

    /// Decodes `node` as the type `type_id`.
    ///
    /// The node's `"__type"` tag, if any, is ignored.
    ///
    /// # Errors
    /// Returns [`CodecError::UnregisteredType`] if `type_id` has no codec, or
    /// forwards the codec's failure (for example [`CodecError::MissingField`]).
    pub fn decode_as(&self, node: &Value, type_id: TypeId) -> Result<ErasedValue, CodecError> {
        let codec = self
            .codecs
            .get(&type_id)
            .ok_or(CodecError::UnregisteredType(type_id))?;
        trace!(type_name = codec.type_name(), "decode");
        codec.decode_any(node)
    }

    /// Decodes `node` as `T` and unwraps the result.
    ///
    /// # Errors
    /// Same as [`decode_as`](Self::decode_as).
    pub fn decode_typed<T: Any>(&self, node: &Value) -> Result<T, CodecError> {
        self.decode_as(node, TypeId::of::<T>())?.downcast::<T>()
    }

    /// Decodes `node` as the type named by its `"__type"` tag.
    ///
    /// # Errors
    /// Returns [`CodecError::MissingTypeTag`] if `node` is not an object with a
    /// `"__type"` entry, [`CodecError::InvalidTypeTag`] if the entry is not a
    /// string, [`CodecError::UnknownTypeName`] if the name was never
    /// registered, or forwards the codec's failure.
    pub fn decode(&self, node: &Value) -> Result<ErasedValue, CodecError> {
        let tag = node
            .as_object()
            .and_then(|object| object.get(TYPE_TAG_KEY))
            .ok_or(CodecError::MissingTypeTag)?;
        let name = tag.as_str().ok_or(CodecError::InvalidTypeTag)?;
        let type_id = self
            .type_id_by_name(name)
            .ok_or_else(|| CodecError::UnknownTypeName(name.to_owned()))?;
        self.decode_as(node, type_id)
    }

    /// Encodes `value` and prints it as compact JSON text.
    ///
    /// # Errors
    /// Same as [`encode`](Self::encode).
    pub fn to_json_string(&self, value: &ErasedValue) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.encode(value)?)?)
    }

    /// Parses JSON text and decodes it through its `"__type"` tag.
    ///
    /// # Errors
    /// Returns [`CodecError::Json`] for malformed text, otherwise the same as
    /// [`decode`](Self::decode).
    pub fn from_json_str(&self, text: &str) -> Result<ErasedValue, CodecError> {
        let node: Value = serde_json::from_str(text)?;
        self.decode(&node)
    }

    /// Number of registered codecs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Returns `true` if `T` has a codec.
    #[must_use]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.codecs.contains_key(&TypeId::of::<T>())
    }

    /// Resolves a registered type name.
    #[must_use]
    pub fn type_id_by_name(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Returns the codec registered for `type_id`.
    #[must_use]
    pub fn codec(&self, type_id: TypeId) -> Option<&dyn ErasedCodec> {
        self.codecs.get(&type_id).map(AsRef::as_ref)
    }

    /// Returns every `(name, type)` binding, sorted by name.
    #[must_use]
    pub fn names(&self) -> Vec<(&str, TypeId)> {
        let mut out: Vec<_> = self
            .names
            .iter()
            .map(|(name, type_id)| (name.as_str(), *type_id))
            .collect();
        out.sort_unstable_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// Lowercase hex BLAKE3 digest of the registered schema.
    ///
    /// Covers each codec's canonical name, tag and declared field names, in
    /// canonical-name order. Two processes that declared the same types the
    /// same way produce the same digest, regardless of registration order.
    #[must_use]
    pub fn schema_digest(&self) -> String {
        let mut entries: Vec<_> = self
            .codecs
            .values()
            .map(|codec| (codec.type_name(), codec.type_tag(), codec.field_names()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut hasher = blake3::Hasher::new();
        hasher.update(b"schema:");
        for (type_name, tag, fields) in entries {
            hasher.update(type_name.as_bytes());
            hasher.update(&[0]);
            if let Some(tag) = tag {
                hasher.update(&[1]);
                hasher.update(tag.as_bytes());
            }
            hasher.update(&[0]);
            for field in fields {
                hasher.update(field.as_bytes());
                hasher.update(&[0]);
            }
            hasher.update(&[0xff]);
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

impl core::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("config", &self.config)
            .field("codecs", &self.codecs.len())
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fields::FieldSetBuilder;
    use serde_json::json;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Gripper {
        open: bool,
        force: f64,
    }

    impl JsonRecord for Gripper {
        const TYPE_NAME: &'static str = "arm/Gripper";
        const TYPE_TAG: Option<&'static str> = Some("Gripper");

        fn describe(fields: &mut FieldSetBuilder<Self>) {
            fields
                .field("open", |g| &g.open, |g| &mut g.open)
                .field("force", |g| &g.force, |g| &mut g.force);
        }
    }

    #[test]
    fn canonical_name_and_tag_both_resolve() {
        let mut registry = CodecRegistry::new();
        registry.register::<Gripper>().unwrap();
        let id = TypeId::of::<Gripper>();
        assert_eq!(registry.type_id_by_name("arm/Gripper"), Some(id));
        assert_eq!(registry.type_id_by_name("Gripper"), Some(id));
        assert_eq!(registry.names().len(), 2);
    }

    #[test]
    fn builtins_encode_untagged_and_decode_by_type() {
        let registry = CodecRegistry::with_builtins().unwrap();
        assert_eq!(registry.len(), 5);

        let node = registry.encode(&ErasedValue::new(-4_i64)).unwrap();
        assert_eq!(node, json!(-4));
        assert_eq!(registry.decode_typed::<i64>(&node).unwrap(), -4);
        assert!(matches!(
            registry.decode(&node),
            Err(CodecError::MissingTypeTag)
        ));
    }

    #[test]
    fn non_string_tag_is_rejected() {
        let mut registry = CodecRegistry::new();
        registry.register::<Gripper>().unwrap();
        let err = registry
            .decode(&json!({"open": true, "force": 1.0, "__type": 7}))
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidTypeTag));
    }

    #[test]
    fn untagged_config_omits_tag() {
        let mut registry = CodecRegistry::with_config(RegistryConfig {
            emit_type_tag: false,
            ..RegistryConfig::default()
        });
        registry.register::<Gripper>().unwrap();
        let node = registry
            .encode_typed(&Gripper {
                open: false,
                force: 3.0,
            })
            .unwrap();
        assert_eq!(node, json!({"open": false, "force": 3.0}));
        assert_eq!(
            registry.decode_typed::<Gripper>(&node).unwrap(),
            Gripper {
                open: false,
                force: 3.0
            }
        );
    }

    #[test]
    fn text_helpers_round_trip() {
        let mut registry = CodecRegistry::new();
        registry.register::<Gripper>().unwrap();
        let value = ErasedValue::new(Gripper {
            open: true,
            force: 0.25,
        });
        let text = registry.to_json_string(&value).unwrap();
        let back = registry.from_json_str(&text).unwrap();
        assert_eq!(
            back.downcast::<Gripper>().unwrap(),
            Gripper {
                open: true,
                force: 0.25
            }
        );
        assert!(matches!(
            registry.from_json_str("{not json"),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn schema_digest_ignores_registration_order() {
        let mut a = CodecRegistry::with_builtins().unwrap();
        a.register::<Gripper>().unwrap();

        let mut b = CodecRegistry::new();
        b.register::<Gripper>().unwrap();
        b.register_builtins().unwrap();

        assert_eq!(a.schema_digest(), b.schema_digest());
        assert_eq!(a.schema_digest().len(), 64);
        assert_ne!(a.schema_digest(), CodecRegistry::new().schema_digest());
    }
}
