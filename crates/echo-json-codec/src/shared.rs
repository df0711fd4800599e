// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Thread-shared registry handle for late registration.
//!
//! A plain [`CodecRegistry`] is enough when every type is registered before
//! the registry is shared. When registrations can arrive while other threads
//! encode and decode, wrap it here: registration takes the write lock, encode
//! and decode take the read lock.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use core::any::Any;
use serde_json::Value;

use crate::codec::JsonCodec;
use crate::erased::ErasedValue;
use crate::error::{CodecError, RegistryError};
use crate::fields::JsonRecord;
use crate::ident::TypeId;
use crate::registry::CodecRegistry;

/// Cloneable, lock-protected handle to a [`CodecRegistry`].
#[derive(Clone, Debug, Default)]
pub struct SharedCodecRegistry {
    inner: Arc<RwLock<CodecRegistry>>,
}

impl SharedCodecRegistry {
    /// Wraps an existing registry.
    #[must_use]
    pub fn new(registry: CodecRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CodecRegistry>, CodecError> {
        self.inner.read().map_err(|_| CodecError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CodecRegistry>, RegistryError> {
        self.inner.write().map_err(|_| RegistryError::Poisoned)
    }

    /// See [`CodecRegistry::register`].
    ///
    /// # Errors
    /// Returns [`RegistryError::Poisoned`] if a writer panicked, otherwise the
    /// registration error.
    pub fn register<T: JsonRecord>(&self) -> Result<(), RegistryError> {
        self.write()?.register::<T>()
    }

    /// See [`CodecRegistry::register_codec`].
    ///
    /// # Errors
    /// Returns [`RegistryError::Poisoned`] if a writer panicked, otherwise the
    /// registration error.
    pub fn register_codec<T, C>(&self) -> Result<(), RegistryError>
    where
        T: Any + Clone + Send + Sync,
        C: JsonCodec<T> + 'static,
    {
        self.write()?.register_codec::<T, C>()
    }

    /// See [`CodecRegistry::encode`].
    ///
    /// # Errors
    /// Returns [`CodecError::Poisoned`] if a writer panicked, otherwise the
    /// encode error.
    pub fn encode(&self, value: &ErasedValue) -> Result<Value, CodecError> {
        self.read()?.encode(value)
    }

    /// See [`CodecRegistry::decode`].
    ///
    /// # Errors
    /// Returns [`CodecError::Poisoned`] if a writer panicked, otherwise the
    /// decode error.
    pub fn decode(&self, node: &Value) -> Result<ErasedValue, CodecError> {
        self.read()?.decode(node)
    }

    /// See [`CodecRegistry::decode_as`].
    ///
    /// # Errors
    /// Returns [`CodecError::Poisoned`] if a writer panicked, otherwise the
    /// decode error.
    pub fn decode_as(&self, node: &Value, type_id: TypeId) -> Result<ErasedValue, CodecError> {
        self.read()?.decode_as(node, type_id)
    }

    /// Runs `f` with shared access to the registry.
    ///
    /// # Errors
    /// Returns [`CodecError::Poisoned`] if a writer panicked.
    pub fn with_read<R>(&self, f: impl FnOnce(&CodecRegistry) -> R) -> Result<R, CodecError> {
        Ok(f(&*self.read()?))
    }
}

impl From<CodecRegistry> for SharedCodecRegistry {
    fn from(registry: CodecRegistry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fields::FieldSetBuilder;
    use std::thread;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Tick {
        seq: u64,
    }

    impl JsonRecord for Tick {
        const TYPE_NAME: &'static str = "Tick";

        fn describe(fields: &mut FieldSetBuilder<Self>) {
            fields.field("seq", |t| &t.seq, |t| &mut t.seq);
        }
    }

    #[test]
    fn readers_see_codecs_registered_on_another_thread() {
        let shared = SharedCodecRegistry::default();
        let writer = shared.clone();
        thread::spawn(move || writer.register::<Tick>())
            .join()
            .unwrap()
            .unwrap();

        let handles: Vec<_> = (0..4_u64)
            .map(|seq| {
                let reader = shared.clone();
                thread::spawn(move || {
                    let node = reader.encode(&ErasedValue::new(Tick { seq })).unwrap();
                    reader.decode(&node).unwrap().downcast::<Tick>().unwrap()
                })
            })
            .collect();
        for (seq, handle) in (0..4_u64).zip(handles) {
            assert_eq!(handle.join().unwrap(), Tick { seq });
        }
        assert_eq!(shared.with_read(CodecRegistry::len).unwrap(), 1);
    }
}
