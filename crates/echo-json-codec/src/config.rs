// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Registry configuration.

use serde::{Deserialize, Serialize};

/// What to do when a type name is already bound to a different type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameConflict {
    /// Rebind the name to the newly registered type (logged at `warn`).
    #[default]
    Overwrite,
    /// Fail the registration with [`RegistryError::NameConflict`](crate::RegistryError::NameConflict).
    Reject,
}

/// Tunables for a [`CodecRegistry`](crate::CodecRegistry).
///
/// Missing keys fall back to their defaults when deserialized:
///
/// ```rust
/// use echo_json_codec::{NameConflict, RegistryConfig};
///
/// let config = RegistryConfig::from_json_str(r#"{ "name_conflict": "reject" }"#).unwrap();
/// assert_eq!(config.name_conflict, NameConflict::Reject);
/// assert!(config.emit_type_tag);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Policy for names already bound to another type.
    pub name_conflict: NameConflict,
    /// Stamp `"__type"` into encoded objects. Untagged output only decodes
    /// through the explicit-type path.
    pub emit_type_tag: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name_conflict: NameConflict::Overwrite,
            emit_type_tag: true,
        }
    }
}

impl RegistryConfig {
    /// Parses a config from its JSON form.
    ///
    /// # Errors
    /// Returns the parser error for malformed JSON or unknown enum values.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(
            RegistryConfig::from_json_str("{}").unwrap(),
            RegistryConfig::default()
        );
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = RegistryConfig {
            name_conflict: NameConflict::Reject,
            emit_type_tag: false,
        };
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(text, r#"{"name_conflict":"reject","emit_type_tag":false}"#);
        assert_eq!(RegistryConfig::from_json_str(&text).unwrap(), config);
    }

    #[test]
    fn unknown_policy_is_an_error() {
        assert!(RegistryConfig::from_json_str(r#"{"name_conflict":"merge"}"#).is_err());
    }
}
