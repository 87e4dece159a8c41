use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

use crate::error::BuildError;
use crate::models::BuildConfig;

/// Name of the build configuration file, expected at the project root.
pub const CONFIG_FILE_NAME: &str = "build_config.json";

/// Conventional location of the build config for a given project root.
pub fn default_config_path(project_root: &Utf8Path) -> Utf8PathBuf {
    project_root.join(CONFIG_FILE_NAME)
}

/// Load and validate the build configuration.
///
/// Pure read + parse + validate; no side effects. Either a fully valid
/// [`BuildConfig`] comes back or an error is raised — a partially populated
/// config is never handed downstream.
///
/// # Errors
/// - [`BuildError::ConfigNotFound`] when the file is absent
/// - [`BuildError::ConfigInvalid`] when the JSON is malformed or a required
///   field is blank after trimming
pub fn load_build_config(path: &Utf8Path) -> Result<BuildConfig> {
    if !path.exists() {
        return Err(BuildError::ConfigNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read build config: {path}"))?;

    let config: BuildConfig =
        serde_json::from_str(&raw).map_err(|e| BuildError::ConfigInvalid {
            reason: format!("malformed JSON: {e}"),
        })?;

    config.validate()?;

    tracing::info!("Loaded build config from {path}");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, json: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"keyAlias": "rel", "keystorePassword": "pw1"}"#);

        let config = load_build_config(&path).unwrap();
        assert_eq!(config.key_alias, "rel");
        assert_eq!(config.keystore_password, "pw1");
    }

    #[test]
    fn test_missing_file_is_config_not_found() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join(CONFIG_FILE_NAME)).unwrap();

        let err = load_build_config(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_config_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "{ not json");

        let err = load_build_config(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_blank_required_field_is_config_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"keyAlias": "  ", "keystorePassword": "pw1"}"#);

        let err = load_build_config(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path(Utf8Path::new("/proj"));
        assert_eq!(path, Utf8PathBuf::from("/proj/build_config.json"));
    }
}
