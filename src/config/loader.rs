//! Settings loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for settings loading.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Parse and validate settings from TOML text.
pub fn parse_settings(content: &str) -> Result<GatewayConfig, SettingsError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(SettingsError::Validation)?;
    Ok(config)
}

/// Load and validate settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<GatewayConfig, SettingsError> {
    let content = fs::read_to_string(path)?;
    parse_settings(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_settings("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.routes.path, "data/config.json");
        assert!(config.routes.watch);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_settings(
            r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.observability.log_format, crate::config::LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.timeouts.request_secs, 10);
    }

    #[test]
    fn rejects_bad_toml() {
        assert!(matches!(parse_settings("[listener"), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn rejects_invalid_values() {
        let err = parse_settings("[timeouts]\nrequest_secs = 0\n").unwrap_err();
        assert!(matches!(err, SettingsError::Validation(ref e) if e == &[ValidationError::ZeroTimeout]));
        assert_eq!(err.to_string(), "Validation failed: timeouts.request_secs must be greater than zero");
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[routes]\npath = \"/etc/gateway/routes.json\"\nwatch = false").unwrap();

        let config = load_settings(file.path()).unwrap();
        assert_eq!(config.routes.path, "/etc/gateway/routes.json");
        assert!(!config.routes.watch);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(load_settings(Path::new("/nonexistent/gateway.toml")), Err(SettingsError::Io(_))));
    }
}
