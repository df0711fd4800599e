// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for registration and encode/decode dispatch.

use thiserror::Error;

use crate::ident::TypeId;

/// Error returned by encode and decode operations.
///
/// Every variant is terminal: retrying the same call against the same registry
/// yields the same error. A failed call never mutates the registry.
#[derive(Debug, Error)]
pub enum CodecError {
    /// No codec is registered for the requested type.
    #[error("no codec registered for {0}; register the type first")]
    UnregisteredType(TypeId),
    /// The `"__type"` tag did not resolve to any registered type.
    #[error("unknown type name {0:?}")]
    UnknownTypeName(String),
    /// Inference-based decode was asked to read a node without a `"__type"` tag.
    #[error("node has no \"__type\" tag; decode with an explicit type instead")]
    MissingTypeTag,
    /// The `"__type"` tag is present but is not a string.
    #[error("\"__type\" tag must be a string")]
    InvalidTypeTag,
    /// A declared field is absent from the input node.
    #[error("{type_name}: missing field {field:?}")]
    MissingField {
        /// Canonical name of the type being decoded.
        type_name: &'static str,
        /// Declared field name.
        field: &'static str,
    },
    /// A declared field is present but its node cannot be read as the field type.
    #[error("{type_name}: invalid field {field:?}: {reason}")]
    InvalidField {
        /// Canonical name of the type being decoded.
        type_name: &'static str,
        /// Declared field name.
        field: &'static str,
        /// Human-readable description of the mismatch.
        reason: String,
    },
    /// A record decode was attempted on a node that is not an object.
    #[error("{type_name}: expected an object node")]
    NotAnObject {
        /// Canonical name of the type being decoded.
        type_name: &'static str,
    },
    /// A scalar node had the wrong kind or was out of range.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// An erased value did not hold the type the selected codec expects.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type the codec was built for.
        expected: TypeId,
        /// Type actually held by the erased value.
        found: TypeId,
    },
    /// The external text form could not be parsed or printed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The shared registry lock was poisoned by a panicking writer.
    #[error("codec registry lock poisoned")]
    Poisoned,
}

impl CodecError {
    /// Attaches field context to a scalar read failure.
    ///
    /// Errors that already carry their own context (for example a
    /// [`CodecError::MissingField`] from a nested record) pass through unchanged.
    #[must_use]
    pub fn in_field(self, type_name: &'static str, field: &'static str) -> Self {
        match self {
            Self::InvalidValue(reason) => Self::InvalidField {
                type_name,
                field,
                reason,
            },
            Self::Json(err) => Self::InvalidField {
                type_name,
                field,
                reason: err.to_string(),
            },
            other => other,
        }
    }
}

/// Error returned when registering a codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A field name was declared twice for the same type.
    #[error("{type_name}: field {field:?} declared more than once")]
    DuplicateField {
        /// Canonical name of the declaring type.
        type_name: &'static str,
        /// Repeated field name.
        field: &'static str,
    },
    /// A field was declared under the reserved `"__type"` key.
    #[error("{type_name}: field name \"__type\" is reserved for the type tag")]
    ReservedField {
        /// Canonical name of the declaring type.
        type_name: &'static str,
    },
    /// A type name is already bound to a different type and the registry is
    /// configured to reject conflicts.
    #[error("type name {name:?} already maps to {existing}; refusing to rebind to {incoming}")]
    NameConflict {
        /// The contested name.
        name: String,
        /// Type currently bound to `name`.
        existing: TypeId,
        /// Type that attempted to claim `name`.
        incoming: TypeId,
    },
    /// The shared registry lock was poisoned by a panicking writer.
    #[error("codec registry lock poisoned")]
    Poisoned,
}
