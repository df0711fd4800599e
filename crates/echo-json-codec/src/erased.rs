// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type-erased value container.
//!
//! [`ErasedValue`] is the carrier the registry encodes from and decodes into.
//! It owns a value of any `Clone + Send + Sync + 'static` type and exposes only
//! its [`TypeId`] plus a checked cast back to the concrete type.

use core::any::Any;
use core::fmt;

use crate::error::CodecError;
use crate::ident::TypeId;

/// A value of some concrete type, known only at runtime.
///
/// ```rust
/// use echo_json_codec::{ErasedValue, TypeId};
///
/// let value = ErasedValue::new(42_i64);
/// assert_eq!(value.type_id(), TypeId::of::<i64>());
/// assert_eq!(value.downcast_ref::<i64>(), Some(&42));
/// assert!(value.downcast_ref::<u64>().is_none());
/// ```
pub struct ErasedValue {
    inner: Box<dyn Slot>,
    type_id: TypeId,
}

impl ErasedValue {
    /// Stores `value` behind type erasure.
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Clone + Send + Sync,
    {
        Self {
            inner: Box::new(value),
            type_id: TypeId::of::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the held value.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns `true` if the held value is a `T`.
    #[must_use]
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Borrows the held value as `T`, or `None` on a type mismatch.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref()
    }

    /// Borrows the held value as `T`.
    ///
    /// # Errors
    /// Returns [`CodecError::TypeMismatch`] if the held value is not a `T`.
    pub fn try_ref<T: Any>(&self) -> Result<&T, CodecError> {
        self.downcast_ref().ok_or(CodecError::TypeMismatch {
            expected: TypeId::of::<T>(),
            found: self.type_id,
        })
    }

    /// Consumes the container and returns the held value as `T`.
    ///
    /// # Errors
    /// Returns [`CodecError::TypeMismatch`] if the held value is not a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, CodecError> {
        let found = self.type_id;
        self.inner
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| CodecError::TypeMismatch {
                expected: TypeId::of::<T>(),
                found,
            })
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
            type_id: self.type_id,
        }
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedValue")
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

trait Slot: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn Slot>;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + Clone + Send + Sync> Slot for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn Slot> {
        Box::new(self.clone())
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}
