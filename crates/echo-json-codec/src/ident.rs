// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime type identity used as the primary registry key.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Process-stable identifier for a concrete Rust type.
///
/// Two `TypeId`s compare equal iff they were produced from the same concrete
/// type. The Rust type path is carried along for diagnostics only and never
/// participates in equality, ordering, or hashing.
///
/// `TypeId` is not stable across builds; use the registered type names (or
/// [`CodecRegistry::schema_digest`](crate::CodecRegistry::schema_digest)) for
/// anything that crosses a process boundary.
#[derive(Clone, Copy)]
pub struct TypeId {
    id: core::any::TypeId,
    path: &'static str,
}

impl TypeId {
    /// Returns the identifier for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: core::any::TypeId::of::<T>(),
            path: core::any::type_name::<T>(),
        }
    }

    /// Returns the compiler-provided type path (for diagnostics only).
    ///
    /// The format of this string is unspecified and may change between
    /// compiler versions.
    #[must_use]
    pub fn type_path(&self) -> &'static str {
        self.path
    }
}

impl PartialEq for TypeId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeId {}

impl PartialOrd for TypeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.path)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_follows_the_concrete_type() {
        assert_eq!(TypeId::of::<u8>(), TypeId::of::<u8>());
        assert_ne!(TypeId::of::<u8>(), TypeId::of::<i8>());
        assert_ne!(TypeId::of::<Vec<u8>>(), TypeId::of::<Vec<u16>>());
    }

    #[test]
    fn hashing_ignores_the_diagnostic_path() {
        let mut set = HashSet::new();
        set.insert(TypeId::of::<String>());
        set.insert(TypeId::of::<String>());
        set.insert(TypeId::of::<f64>());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn debug_names_the_type() {
        let dbg = format!("{:?}", TypeId::of::<f64>());
        assert_eq!(dbg, "TypeId(f64)");
    }
}
