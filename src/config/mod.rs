//! Configuration management

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::probe::{
    Endpoint, ProbeSettings, RequestPayload, DEFAULT_HOST, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_PORT,
    DEFAULT_READ_COUNT, DEFAULT_REQUEST,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Wire bytes sent verbatim, terminator included
    #[serde(default = "default_payload")]
    pub payload: String,

    #[serde(default = "default_read_count")]
    pub read_count: usize,

    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_payload() -> String {
    DEFAULT_REQUEST.to_string()
}

fn default_read_count() -> usize {
    DEFAULT_READ_COUNT
}

fn default_max_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            payload: default_payload(),
            read_count: default_read_count(),
            max_chunk_size: default_max_chunk_size(),
            connect_timeout_ms: None,
            read_timeout_ms: None,
        }
    }
}

impl ProbeConfig {
    /// Validate and convert into the settings a probe runs with
    pub fn into_settings(self) -> Result<ProbeSettings> {
        let settings = ProbeSettings {
            endpoint: Endpoint::new(self.host, self.port)?,
            payload: RequestPayload::new(self.payload.into_bytes())?,
            read_count: self.read_count,
            max_chunk_size: self.max_chunk_size,
            connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            read_timeout: self.read_timeout_ms.map(Duration::from_millis),
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Platform config directory (e.g. ~/.config/ssr-control-probe)
pub fn get_config_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "soundscaperenderer", "ssr-control-probe")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load layered configuration.
///
/// Defaults, then a config file (`explicit` if given and required, else the
/// optional `config.*` in the platform config dir), then `SSR_PROBE_*`
/// environment variables.
pub fn load_config(explicit: Option<&Path>) -> Result<ProbeConfig> {
    let file = match explicit {
        Some(path) => ::config::File::from(path).required(true),
        None => ::config::File::with_name(&get_config_dir().join("config").to_string_lossy())
            .required(false),
    };

    let config = ::config::Config::builder()
        // Start with defaults
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", DEFAULT_PORT as i64)?
        .add_source(file)
        // Override with environment variables (SSR_PROBE_PORT, SSR_PROBE_READ_COUNT, etc.)
        .add_source(
            ::config::Environment::with_prefix("SSR_PROBE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to assemble probe configuration")?;

    config
        .try_deserialize()
        .context("invalid probe configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    const ENV_KEYS: [&str; 7] = [
        "SSR_PROBE_HOST",
        "SSR_PROBE_PORT",
        "SSR_PROBE_PAYLOAD",
        "SSR_PROBE_READ_COUNT",
        "SSR_PROBE_MAX_CHUNK_SIZE",
        "SSR_PROBE_CONNECT_TIMEOUT_MS",
        "SSR_PROBE_READ_TIMEOUT_MS",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_empty_file_yields_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.toml");
        fs::write(&path, "").unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 4711);
        assert_eq!(config.read_count, 10);
        assert_eq!(config.max_chunk_size, 1024);
        assert_eq!(config.payload, DEFAULT_REQUEST);
        assert_eq!(config.read_timeout_ms, None);
    }

    #[test]
    #[serial]
    fn test_file_overrides_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.toml");
        fs::write(
            &path,
            "host = \"renderer.local\"\nport = 5000\nread_count = 3\nread_timeout_ms = 250\n",
        )
        .unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.host, "renderer.local");
        assert_eq!(config.port, 5000);
        assert_eq!(config.read_count, 3);
        assert_eq!(config.read_timeout_ms, Some(250));

        let settings = config.into_settings().unwrap();
        assert_eq!(settings.endpoint.to_string(), "renderer.local:5000");
        assert_eq!(settings.read_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.toml");
        fs::write(&path, "port = 5000\nread_count = 3\n").unwrap();

        std::env::set_var("SSR_PROBE_PORT", "6000");
        std::env::set_var("SSR_PROBE_READ_COUNT", "4");
        let config = load_config(Some(path.as_path()));
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.read_count, 4);
    }

    #[test]
    #[serial]
    fn test_clear_env_covers_every_field() {
        for key in ENV_KEYS {
            std::env::set_var(key, "1");
        }
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.toml");
        fs::write(&path, "").unwrap();
        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.max_chunk_size, 1024);
        assert_eq!(config.payload, DEFAULT_REQUEST);
        assert_eq!(config.connect_timeout_ms, None);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_an_error() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("absent.toml").as_path())).is_err());
    }

    #[test]
    fn test_into_settings_rejects_bad_values() {
        let config = ProbeConfig {
            port: 0,
            ..Default::default()
        };
        assert!(config.into_settings().is_err());

        let config = ProbeConfig {
            max_chunk_size: 0,
            ..Default::default()
        };
        assert!(config.into_settings().is_err());

        let config = ProbeConfig {
            payload: String::new(),
            ..Default::default()
        };
        assert!(config.into_settings().is_err());
    }
}
