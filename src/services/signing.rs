use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};

use crate::models::BuildConfig;

/// Fixed keystore file name, always anchored at the project root.
pub const KEYSTORE_FILE_NAME: &str = "build_data_keystore.keystore";

/// Concrete signing parameters derived from a validated [`BuildConfig`].
///
/// Derived, never persisted. The keystore path is a function of the project
/// root alone: configuration can relocate the output folder but never the
/// signing material, which must live in a single predictable location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningParams {
    pub keystore_path: Utf8PathBuf,
    pub alias: String,
    pub store_password: String,
    pub alias_password: String,
}

/// Resolve signing parameters from a pre-validated config.
///
/// `project_root` is expected to be absolute; the keystore path inherits
/// that. The alias is trimmed, and `alias_password` falls back to
/// `store_password` when `key_password` is empty or absent.
pub fn resolve(config: &BuildConfig, project_root: &Utf8Path) -> SigningParams {
    let keystore_path = project_root.join(KEYSTORE_FILE_NAME);

    let alias = config.key_alias.trim().to_string();
    let store_password = config.keystore_password.clone();
    let alias_password = match config.key_password.as_deref() {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => store_password.clone(),
    };

    // Passwords are never logged.
    tracing::info!("Keystore: path='{keystore_path}', alias='{alias}'");

    SigningParams {
        keystore_path,
        alias,
        store_password,
        alias_password,
    }
}

/// Best-effort mirror for hosts that still read signing passwords from
/// legacy global settings.
///
/// Selected at composition time; the default is [`NoopSettingsSink`]. A sink
/// is a compatibility shim, not a correctness dependency, so its failures
/// are swallowed by [`mirror_to_legacy`] rather than propagated.
pub trait LegacySettingsSink {
    fn apply(&mut self, store_password: &str, alias_password: &str) -> Result<()>;
}

/// Default sink for hosts without legacy settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSettingsSink;

impl LegacySettingsSink for NoopSettingsSink {
    fn apply(&mut self, _store_password: &str, _alias_password: &str) -> Result<()> {
        Ok(())
    }
}

/// Push resolved passwords into the legacy sink, logging and swallowing any
/// failure.
pub fn mirror_to_legacy(sink: &mut dyn LegacySettingsSink, params: &SigningParams) {
    if let Err(e) = sink.apply(&params.store_password, &params.alias_password) {
        tracing::warn!("Skipped legacy settings mirror: {e:#}");
    }
}
