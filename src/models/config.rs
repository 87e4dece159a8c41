use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Build configuration from `build_config.json`
///
/// Immutable value loaded once per build invocation. Field names match the
/// JSON file exactly (camelCase).
///
/// A config is only considered valid when `key_alias` and `keystore_password`
/// are both non-empty after trimming; [`validate`](Self::validate) runs
/// exactly once at load time, before anything downstream consumes the value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Output directory for artifacts. Empty or missing means the default
    /// `<project_root>/Builds` is used.
    #[serde(default)]
    pub parent_folder: Option<String>,

    pub key_alias: String,

    pub keystore_password: String,

    /// Password for the signing key itself. Empty or missing falls back to
    /// `keystore_password`.
    #[serde(default)]
    pub key_password: Option<String>,
}

impl BuildConfig {
    /// Check that the required signing fields are present and non-blank.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.key_alias.trim().is_empty() {
            return Err(BuildError::ConfigInvalid {
                reason: "keyAlias is required".to_string(),
            });
        }
        if self.keystore_password.trim().is_empty() {
            return Err(BuildError::ConfigInvalid {
                reason: "keystorePassword is required".to_string(),
            });
        }
        Ok(())
    }

    /// The configured output folder, trimmed, or `None` when blank.
    pub fn parent_folder_trimmed(&self) -> Option<&str> {
        self.parent_folder
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
