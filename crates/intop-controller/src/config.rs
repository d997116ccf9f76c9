use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use intop_client::ApiServerProbeProxy;
use serde::{Deserialize, Serialize};
use url::Url;

/// Operator configuration.
///
/// Layered from an optional TOML file and `INTOP__SECTION__KEY` environment
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OperatorConfig {
    #[serde(default)]
    pub operator: OperatorSettings,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OperatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.operator.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err("operator.id must not be blank when set".into());
        }
        if self.probe.timeout_ms == 0 {
            return Err("probe.timeout_ms must be > 0".into());
        }
        if let Some(url) = &self.probe.api_server_url {
            Url::parse(url).map_err(|e| format!("probe.api_server_url is invalid: {e}"))?;
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OperatorSettings {
    /// Identity of this operator instance. Integrations annotated for another
    /// operator are left alone.
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeConfig {
    /// Deadline of a readiness probe that does not declare its own timeout.
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub api_server_url: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_probe_timeout_ms() -> u64 {
    1000
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout_ms(),
            api_server_url: None,
            bearer_token: None,
            accept_invalid_certs: false,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Builds the API server pod proxy. Returns `None` without `api_server_url`.
    pub fn build_proxy(&self) -> Result<Option<ApiServerProbeProxy>, String> {
        let Some(raw) = &self.api_server_url else {
            return Ok(None);
        };
        let url = Url::parse(raw).map_err(|e| format!("probe.api_server_url is invalid: {e}"))?;
        let proxy = ApiServerProbeProxy::with_tls_options(url, self.accept_invalid_certs)
            .map_err(|e| format!("probe proxy error: {e}"))?;
        Ok(Some(match &self.bearer_token {
            Some(token) => proxy.with_bearer_token(token.clone()),
            None => proxy,
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::*;

    pub fn load_config(path: Option<&str>) -> Result<OperatorConfig, String> {
        let mut builder = Config::builder();
        let file = PathBuf::from(path.unwrap_or("intop.toml"));
        if file.exists() {
            builder = builder.add_source(File::from(file));
        }
        // Environment variable overrides, e.g., INTOP__PROBE__TIMEOUT_MS=2500
        builder = builder.add_source(
            Environment::with_prefix("INTOP")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: OperatorConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

pub use loader::load_config;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OperatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.probe.timeout(), Duration::from_secs(1));
        assert_eq!(config.logging.level, "info");
        assert!(config.operator.id.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = OperatorConfig::default();
        config.probe.timeout_ms = 0;
        assert!(config.validate().unwrap_err().contains("timeout_ms"));

        let mut config = OperatorConfig::default();
        config.logging.level = "loud".into();
        assert!(config.validate().unwrap_err().contains("logging.level"));

        let mut config = OperatorConfig::default();
        config.probe.api_server_url = Some("not a url".into());
        assert!(config.validate().is_err());

        let mut config = OperatorConfig::default();
        config.operator.id = Some("  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_proxy() {
        let mut config = OperatorConfig::default();
        assert!(config.probe.build_proxy().unwrap().is_none());

        config.probe.api_server_url = Some("https://10.0.0.1:6443".into());
        config.probe.bearer_token = Some("token".into());
        let proxy = config.probe.build_proxy().unwrap().unwrap();
        let url = proxy
            .proxy_url(&intop_client::ProbeRequest {
                namespace: "default".into(),
                pod: "hello-1".into(),
                scheme: "http".into(),
                port: 8080,
                path: "/q/health/ready".into(),
                timeout: Duration::from_secs(1),
            })
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://10.0.0.1:6443/api/v1/namespaces/default/pods/hello-1:8080/proxy/q/health/ready"
        );
    }
}
