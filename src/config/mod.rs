// Configuration module entry point
// Loads the immutable process configuration and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, CorsConfig, StorageConfig};

/// Default config file, looked up without extension
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable prefix, e.g. `MODEL_DEPOT_SERVER__PORT=4000`
const ENV_PREFIX: &str = "MODEL_DEPOT";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources in increasing priority: built-in defaults, the optional file,
    /// then `MODEL_DEPOT_*` environment variables.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would leave the server unusable
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.storage.dir.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "storage.dir must not be empty".to_string(),
            ));
        }
        if self.storage.max_upload_size == 0 {
            return Err(config::ConfigError::Message(
                "storage.max_upload_size must be greater than zero".to_string(),
            ));
        }
        if self.storage.allowed_extensions.is_empty() {
            return Err(config::ConfigError::Message(
                "storage.allowed_extensions must list at least one extension".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 3001);
        assert_eq!(cfg.storage.dir, "uploads");
        assert_eq!(cfg.storage.max_upload_size, 52_428_800);
        assert_eq!(cfg.storage.allowed_extensions, vec!["gltf", "glb"]);
        assert_eq!(
            cfg.cors.allowed_origins,
            vec!["http://127.0.0.1:5500", "http://localhost:5500"]
        );
        assert!(cfg.cors.allow_credentials);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let cfg = Config::load_from("does-not-exist/model-depot").expect("defaults load");
        assert_eq!(cfg.storage.allowed_extensions.len(), 2);
        assert!(cfg.get_socket_addr().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("depot.toml");
        std::fs::write(
            &path,
            "[server]\nport = 4100\n\n[storage]\ndir = \"assets\"\nmax_upload_size = 1024\n",
        )
        .expect("write config");

        let base = dir.path().join("depot");
        let cfg = Config::load_from(base.to_str().expect("utf8 path")).expect("config loads");
        assert_eq!(cfg.server.port, 4100);
        assert_eq!(cfg.storage.dir, "assets");
        assert_eq!(cfg.storage.max_upload_size, 1024);
        // Untouched sections keep their defaults
        assert_eq!(cfg.cors.allowed_methods.len(), 4);
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("bad.toml"),
            "[storage]\nmax_upload_size = 0\n",
        )
        .expect("write config");

        let base = dir.path().join("bad");
        assert!(Config::load_from(base.to_str().expect("utf8 path")).is_err());
    }

    #[test]
    fn test_invalid_host_reported() {
        let mut cfg = Config::default();
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
