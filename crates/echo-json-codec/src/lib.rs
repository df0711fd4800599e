// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! echo-json-codec: type-erased JSON codecs for blackboard and tooling values.
//!
//! Values whose concrete type is only known at runtime travel as
//! [`ErasedValue`]s. A [`CodecRegistry`] maps each concrete type to a codec
//! and each registered type name to its type, so that:
//!
//! - [`CodecRegistry::encode`] picks the codec from the value's runtime type;
//! - [`CodecRegistry::decode_as`] decodes into a type the caller names;
//! - [`CodecRegistry::decode`] recovers the type from the node's `"__type"`
//!   tag when the caller does not know it.
//!
//! Record types describe their fields once through [`JsonRecord`]; the same
//! declaration drives both directions. Types with a bespoke layout implement
//! [`JsonCodec`] instead.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod codec;
mod config;
mod erased;
mod error;
mod fields;
mod ident;
mod registry;
mod shared;
mod value;

pub use codec::{ErasedCodec, JsonCodec};
pub use config::{NameConflict, RegistryConfig};
pub use erased::ErasedValue;
pub use error::{CodecError, RegistryError};
pub use fields::{FieldDescriptorSet, FieldSetBuilder, JsonRecord, TYPE_TAG_KEY};
pub use ident::TypeId;
pub use registry::CodecRegistry;
pub use shared::SharedCodecRegistry;
pub use value::JsonValue;
