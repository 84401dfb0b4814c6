use std::fs;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::paths::ConfigPaths;
use super::types::AppConfig;

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub paths: ConfigPaths,
    pub config_exists: bool,
}

pub fn load_config(path_override: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let paths = ConfigPaths::resolve(path_override)?;
    let (config, config_exists) = read_config(&paths.config_file)?;
    Ok(LoadedConfig {
        config,
        paths,
        config_exists,
    })
}

/// Reads `path`; a missing file yields the defaults.
fn read_config(path: &Path) -> Result<(AppConfig, bool), ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let config = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
            Ok((config, true))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok((AppConfig::default(), false)),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizbench::Backend;
    use std::time::Duration;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (config, exists) = read_config(&dir.path().join("config.toml")).expect("read");
        assert!(!exists);
        assert_eq!(config.endpoint.backend, Backend::AzureOpenAI);
        assert_eq!(config.batch.limit, 100);
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn sections_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[endpoint]
backend = "openai"
model = "gpt-4o"
temperature = 0.2

[retry]
max_attempts = 3
margin_factor = 1.5
fallback_delay_ms = 250

[batch]
limit = 10
concurrency = 16
continue_on_error = true
"#,
        )
        .expect("write");

        let (config, exists) = read_config(&path).expect("read");
        assert!(exists);
        assert_eq!(config.endpoint.backend, Backend::OpenAI);
        assert_eq!(config.endpoint.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.endpoint.temperature, Some(0.2));
        assert_eq!(config.endpoint.timeout_seconds, 200);
        assert_eq!(config.batch.limit, 10);
        assert_eq!(config.batch.concurrency, Some(16));
        assert!(config.batch.continue_on_error);
        assert_eq!(config.batch.source_file, PathBuf::from("dbpedias.json"));

        let retry = config.retry.to_retry_config();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.margin_factor, 1.5);
        assert_eq!(retry.fallback_delay, Duration::from_millis(250));
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[batch\nlimit = ").expect("write");
        let err = read_config(&path).expect_err("malformed");
        assert!(err.to_string().contains("config.toml"));
    }
}
