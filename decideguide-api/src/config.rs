use config::{Config, ConfigError, Environment, File};
use decideguide_core::DEFAULT_MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub cors: Option<CorsConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: data_dir().join("decideguide.db"),
            },
            storage: StorageConfig {
                uploads_dir: data_dir().join("uploads"),
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            }),
        }
    }
}

impl ApiConfig {
    /// Load `path`, or the per-user config file when none is given, writing
    /// the defaults there first if it does not exist yet.
    /// `DECIDEGUIDE__SECTION__KEY` variables override the file.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::Message(format!("Failed to create config directory: {e}"))
                })?;
            }
            let default_config = toml::to_string_pretty(&ApiConfig::default()).map_err(|e| {
                ConfigError::Message(format!("Failed to render default config: {e}"))
            })?;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let defaults = ApiConfig::default();
        let builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default(
                "database.path",
                defaults.database.path.to_string_lossy().to_string(),
            )?
            .set_default(
                "storage.uploads_dir",
                defaults.storage.uploads_dir.to_string_lossy().to_string(),
            )?
            .set_default(
                "storage.max_upload_bytes",
                defaults.storage.max_upload_bytes as i64,
            )?
            .set_default("logging.level", defaults.logging.level)?
            .add_source(File::from(config_path.clone()))
            .add_source(
                Environment::with_prefix("DECIDEGUIDE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: ApiConfig = builder.try_deserialize()?;

        config.database.path = expand_tilde(&config.database.path);
        config.storage.uploads_dir = expand_tilde(&config.storage.uploads_dir);
        config.logging.file = config.logging.file.as_deref().map(expand_tilde);

        Ok((config, config_path))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = home::home_dir() {
            let path_str = path.to_string_lossy();
            let expanded = path_str.replacen('~', &home.to_string_lossy(), 1);
            return PathBuf::from(expanded);
        }
    }
    path.to_path_buf()
}

fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("decideguide/api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}

fn data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        data_dir.join("decideguide")
    } else {
        PathBuf::from(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/api.toml");

        let (config, loaded_from) = ApiConfig::load(Some(&path)).unwrap();

        assert_eq!(loaded_from, path);
        assert!(path.exists());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(
            config.cors.map(|c| c.allowed_origins),
            Some(vec!["http://localhost:3000".to_string()])
        );
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9191

[storage]
uploads_dir = "~/decideguide-uploads"
max_upload_bytes = 2048

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let (config, _) = ApiConfig::load(Some(&path)).unwrap();

        assert_eq!(config.server.port, 9191);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.max_upload_bytes, 2048);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file.is_none());
        assert!(config.cors.is_none());
        assert!(!config.storage.uploads_dir.starts_with("~"));
        assert!(config.storage.uploads_dir.ends_with("decideguide-uploads"));
    }

    #[test]
    fn test_bind_address() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }
}
