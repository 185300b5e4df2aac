use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use livecap_providers::LiveClientOptions;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use serde::{Deserialize, Serialize};

use crate::capture::CaptureOptions;
use crate::hls::KeyOrder;

const DEFAULT_CONFIG_FILE: &str = "livecap.yaml";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub live_api: LiveApiConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "compact", "pretty" or "json"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            file_path: None,
        }
    }
}

/// Per-request network settings, passed explicitly to every client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub user_agent: String,
    pub referer: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            connect_timeout_ms: 3000,
            user_agent: USER_AGENT.to_string(),
            referer: "https://live.bilibili.com".to_string(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Build the client shared by the manifest and segment fetchers
    pub fn build_client(&self) -> crate::Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(&self.referer)
            .map_err(|e| crate::Error::Config(format!("http.referer: {e}")))?;
        headers.insert(REFERER, referer);

        reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .timeout(self.timeout())
            .connect_timeout(self.connect_timeout())
            .build()
            .map_err(|e| crate::Error::Config(format!("failed to build HTTP client: {e}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveApiConfig {
    pub base_url: String,
    pub quality: u32,
    pub platform: String,
    pub ptype: u32,
}

impl Default for LiveApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.live.bilibili.com".to_string(),
            quality: 10000,
            platform: "h5".to_string(),
            ptype: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub default_output: String,
    /// Pause between manifest polls; 0 polls back to back
    pub poll_interval_ms: u64,
    pub key_order: KeyOrder,
    /// Levels of manifest-to-manifest indirection to follow
    pub max_manifest_depth: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            default_output: "out.mp4".to_string(),
            poll_interval_ms: 500,
            key_order: KeyOrder::Lexical,
            max_manifest_depth: 1,
        }
    }
}

impl CaptureConfig {
    #[must_use]
    pub const fn options(&self) -> CaptureOptions {
        CaptureOptions {
            key_order: self.key_order,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(File::with_name(path));
        }

        // LIVECAP_CAPTURE__POLL_INTERVAL_MS, LIVECAP_HTTP__TIMEOUT_MS, ...
        builder = builder.add_source(
            Environment::with_prefix("LIVECAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Check values that would otherwise fail deep inside a run.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !matches!(
            self.logging.level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "warning" | "error"
        ) {
            errors.push(format!("logging.level: unknown level {:?}", self.logging.level));
        }
        if !matches!(self.logging.format.as_str(), "compact" | "pretty" | "json") {
            errors.push(format!(
                "logging.format: expected compact, pretty or json, got {:?}",
                self.logging.format
            ));
        }
        if self.http.timeout_ms == 0 {
            errors.push("http.timeout_ms must be greater than 0".to_string());
        }
        if self.http.connect_timeout_ms == 0 {
            errors.push("http.connect_timeout_ms must be greater than 0".to_string());
        }
        if let Err(e) = url::Url::parse(&self.live_api.base_url) {
            errors.push(format!("live_api.base_url {:?}: {e}", self.live_api.base_url));
        }
        if self.capture.default_output.trim().is_empty() {
            errors.push("capture.default_output must not be empty".to_string());
        }
        if self.capture.max_manifest_depth > 4 {
            errors.push(format!(
                "capture.max_manifest_depth must be at most 4, got {}",
                self.capture.max_manifest_depth
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Options for the upstream live API client
    #[must_use]
    pub fn live_client_options(&self) -> LiveClientOptions {
        LiveClientOptions {
            base_url: self.live_api.base_url.clone(),
            quality: self.live_api.quality,
            platform: self.live_api.platform.clone(),
            ptype: self.live_api.ptype,
            timeout: self.http.timeout(),
            connect_timeout: self.http.connect_timeout(),
            user_agent: self.http.user_agent.clone(),
            referer: self.http.referer.clone(),
        }
    }
}

/// Load and validate configuration
///
/// Config file search order:
/// 1. Explicit path (`--config` or `LIVECAP_CONFIG_PATH`)
/// 2. ./livecap.yaml (current working directory)
/// 3. Defaults and environment variables only
pub fn load_config(explicit_path: Option<&str>) -> crate::Result<Config> {
    let path = explicit_path.map(ToString::to_string).or_else(|| {
        Path::new(DEFAULT_CONFIG_FILE)
            .exists()
            .then(|| DEFAULT_CONFIG_FILE.to_string())
    });

    let config = Config::load(path.as_deref()).map_err(|e| match &path {
        Some(p) => crate::Error::Config(format!("{p}: {e}")),
        None => crate::Error::Config(e.to_string()),
    })?;

    if let Err(errors) = config.validate() {
        return Err(crate::Error::Config(format!(
            "validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        )));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.capture.default_output, "out.mp4");
        assert_eq!(config.capture.key_order, KeyOrder::Lexical);
        assert_eq!(config.capture.max_manifest_depth, 1);
        assert_eq!(config.live_api.quality, 10000);
        assert_eq!(config.live_api.platform, "h5");
        assert_eq!(config.live_api.ptype, 16);
        assert_eq!(config.http.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_validate_collects_every_error() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        config.http.timeout_ms = 0;
        config.live_api.base_url = "::".to_string();
        config.capture.max_manifest_depth = 9;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("logging.format")));
        assert!(errors.iter().any(|e| e.contains("http.timeout_ms")));
        assert!(errors.iter().any(|e| e.contains("live_api.base_url")));
        assert!(errors.iter().any(|e| e.contains("max_manifest_depth")));
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "capture:\n  poll_interval_ms: 0\n  key_order: numeric\nhttp:\n  timeout_ms: 1000\n"
        )
        .unwrap();

        let config = Config::load(file.path().to_str()).unwrap();
        assert_eq!(config.capture.poll_interval_ms, 0);
        assert_eq!(config.capture.key_order, KeyOrder::Numeric);
        assert_eq!(config.http.timeout_ms, 1000);
        // untouched sections keep their defaults
        assert_eq!(config.capture.default_output, "out.mp4");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_config(Some("/nonexistent/livecap.yaml"));
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_live_client_options_carry_http_settings() {
        let mut config = Config::default();
        config.http.timeout_ms = 1500;
        config.live_api.base_url = "http://127.0.0.1:9000".to_string();

        let options = config.live_client_options();
        assert_eq!(options.timeout, Duration::from_millis(1500));
        assert_eq!(options.base_url, "http://127.0.0.1:9000");
        assert_eq!(options.quality, 10000);
    }

    #[test]
    fn test_build_client_rejects_bad_referer() {
        let mut config = Config::default();
        config.http.referer = "bad\nvalue".to_string();
        assert!(config.http.build_client().is_err());
        assert!(Config::default().http.build_client().is_ok());
    }
}
