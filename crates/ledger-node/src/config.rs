//! Configuration loading: a TOML file on disk, with environment-variable
//! overrides for the two secrets that should never live in a config file
//! committed to a repo.

use std::path::Path;

use ledger_types::{LedgerConfig, LedgerError, Result};

/// Load `LedgerConfig` from `path`, falling back to `LedgerConfig::default`
/// if no file exists there, then layering `DATABASE_URL` /
/// `LEGACY_DATABASE_URL` on top if set.
///
/// # Errors
/// Returns a `Configuration` error if the file exists but fails to parse.
pub fn load(path: &Path) -> Result<LedgerConfig> {
    let mut config = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|err| LedgerError::Configuration(err.to_string()))?
    } else {
        tracing::warn!(path = %path.display(), "no config file found, using defaults");
        LedgerConfig::default()
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.relational.url = url;
    }
    if let Ok(url) = std::env::var("LEGACY_DATABASE_URL") {
        config.document.url = url;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load(Path::new("/nonexistent/ledger.toml")).unwrap();
        assert_eq!(config.idle_timeout_ms, 3_600_000);
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let dir = std::env::temp_dir().join(format!("ledger-node-test-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ledger.toml");
        std::fs::write(&path, "not valid toml {{{").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, LedgerError::Configuration(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn file_config_parses_relational_url() {
        let dir = std::env::temp_dir().join(format!("ledger-node-test-file-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ledger.toml");
        std::fs::write(&path, "[relational]\nurl = \"postgres://example/from-file\"\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.relational.url, "postgres://example/from-file");
        std::fs::remove_dir_all(&dir).ok();
    }
}
