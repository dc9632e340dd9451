use std::path::Path;
use std::sync::OnceLock;

use jsonschema::Validator;

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Reads and validates a config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&raw)
}

/// Parses a config document: JSON syntax, then the embedded schema, then
/// the checks the schema cannot express.
pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let document: serde_json::Value = serde_json::from_str(content)?;
    check_against_schema(&document)?;

    let config: Config = serde_json::from_value(document)?;
    validate_config(&config)?;
    Ok(config)
}

fn schema_validator() -> Result<&'static Validator, ConfigError> {
    static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();
    VALIDATOR
        .get_or_init(|| {
            let schema: serde_json::Value = serde_json::from_str(SCHEMA_JSON)
                .map_err(|e| format!("embedded config schema is not JSON: {}", e))?;
            jsonschema::validator_for(&schema)
                .map_err(|e| format!("embedded config schema does not compile: {}", e))
        })
        .as_ref()
        .map_err(|message| ConfigError::Validation {
            message: message.clone(),
        })
}

fn check_against_schema(document: &serde_json::Value) -> Result<(), ConfigError> {
    let problems: Vec<String> = schema_validator()?
        .iter_errors(document)
        .map(|e| e.to_string())
        .collect();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::SchemaValidation {
            errors: problems.join("; "),
        })
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("config version {} is not supported (expected {})", config.version, CONFIG_VERSION),
        });
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "retry.max_attempts must be at least 1".to_string(),
        });
    }

    if config.transaction_timeout_ms == 0 {
        return Err(ConfigError::Validation {
            message: "transaction_timeout_ms must be positive".to_string(),
        });
    }

    if config.database.busy_timeout_ms >= config.transaction_timeout_ms {
        return Err(ConfigError::Validation {
            message: format!(
                "database.busy_timeout_ms ({}) must be below transaction_timeout_ms ({})",
                config.database.busy_timeout_ms, config.transaction_timeout_ms
            ),
        });
    }

    if let Err(e) = tracing_subscriber::EnvFilter::try_new(&config.logging.level) {
        return Err(ConfigError::Validation {
            message: format!("Invalid logging level '{}': {}", config.logging.level, e),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use crate::tracking::StatusRepair;
    use std::time::Duration;

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_from_str(r#"{ "version": "1.0" }"#).unwrap();
        assert_eq!(config, Config::default());

        let options = config.database_options();
        assert_eq!(options.busy_timeout, Duration::from_millis(1000));
        assert_eq!(options.retry.max_attempts, 10);
        assert_eq!(options.retry.backoff, Duration::from_millis(200));
        assert_eq!(options.retry.deadline, Duration::from_secs(15));

        let tracker = config.tracker_options();
        assert_eq!(tracker.status_repair, StatusRepair::Persist);
        assert!(tracker.assignment.enforce_work_area);
    }

    #[test]
    fn test_load_full_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "database": { "path": "/var/lib/kanchancast/orders.db", "busy_timeout_ms": 500 },
            "retry": { "max_attempts": 3, "backoff_ms": 50 },
            "transaction_timeout_ms": 2000,
            "status_repair": "report",
            "enforce_work_area": false,
            "logging": { "level": "kanchancast=debug", "format": "json" }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(
            config.database_path().unwrap(),
            Path::new("/var/lib/kanchancast/orders.db")
        );
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.status_repair, StatusRepair::Report);
        assert!(!config.enforce_work_area);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.database_options().retry.deadline,
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_home_relative_path() {
        let config = load_config_from_str(
            r#"{ "version": "1.0", "database": { "path": "~/orders/k.db" } }"#,
        )
        .unwrap();
        let path = config.database_path().unwrap();
        assert!(path.ends_with("orders/k.db"));
        assert!(!path.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_schema_rejects_unknown_fields() {
        let result = load_config_from_str(r#"{ "version": "1.0", "workers": 4 }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_schema_rejects_bad_repair_mode() {
        let result = load_config_from_str(r#"{ "version": "1.0", "status_repair": "always" }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_schema_rejects_zero_attempts() {
        let result =
            load_config_from_str(r#"{ "version": "1.0", "retry": { "max_attempts": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_wrong_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_busy_timeout_must_fit_in_deadline() {
        let result = load_config_from_str(
            r#"{ "version": "1.0", "database": { "busy_timeout_ms": 5000 }, "transaction_timeout_ms": 5000 }"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));

        let config = load_config_from_str(
            r#"{ "version": "1.0", "database": { "busy_timeout_ms": 100 }, "transaction_timeout_ms": 5000 }"#,
        )
        .unwrap();
        assert_eq!(
            config.database_options().busy_timeout,
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_invalid_log_level() {
        let result = load_config_from_str(
            r#"{ "version": "1.0", "logging": { "level": "kanchancast=loud" } }"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kanchancast.json");
        std::fs::write(&path, r#"{ "version": "1.0", "enforce_work_area": false }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.enforce_work_area);

        let missing = load_config(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::ReadFile { .. })));
    }
}
