use std::path::{Path, PathBuf};
use std::time::Duration;

use adminkit_http::{HttpClientConfig, TransportSecurity};
use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// File looked up in the platform config directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "admin-console.yaml";

/// Environment overrides, e.g. `ADMIN_CONSOLE__API__BASE_URL`.
pub const ENV_PREFIX: &str = "ADMIN_CONSOLE__";

const APP_DIR: &str = "admin-console";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Admin API root, e.g. `https://api.example.com`
    pub base_url: String,
    pub timeout_secs: u64,
    /// Permit plain `http://` base URLs (local development only)
    pub allow_insecure_http: bool,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:3000".to_owned(),
            timeout_secs: 30,
            allow_insecure_http: false,
            user_agent: concat!("admin-console/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file holding the signed-in identity and token
    pub store_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: app_dir().join("session.json"),
        }
    }
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl AppConfig {
    /// Layered load: defaults, then the YAML file (explicit or the default
    /// location), then `ADMIN_CONSOLE__*` environment variables.
    ///
    /// # Errors
    /// Fails when the YAML is malformed or a value has the wrong type.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let file = config_path.map_or_else(|| app_dir().join(CONFIG_FILE_NAME), Path::to_path_buf);
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file(&file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("invalid configuration (file: {})", file.display()))
    }

    /// Apply command-line overrides; these win over every other layer.
    pub fn apply_cli_overrides(&mut self, base_url: Option<String>) {
        if let Some(base_url) = base_url {
            self.api.base_url = base_url;
        }
    }

    /// HTTP client settings derived from the `api` section.
    ///
    /// # Errors
    /// Rejects a zero timeout and a plain-http base URL unless
    /// `api.allow_insecure_http` is set.
    pub fn http_client_config(&self) -> Result<HttpClientConfig> {
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than zero");
        }
        if self.api.base_url.starts_with("http://") && !self.api.allow_insecure_http {
            anyhow::bail!(
                "api.base_url '{}' uses plain http; set api.allow_insecure_http to true to allow it",
                self.api.base_url
            );
        }

        let transport = if self.api.allow_insecure_http {
            TransportSecurity::AllowInsecureHttp
        } else {
            TransportSecurity::TlsOnly
        };
        Ok(HttpClientConfig {
            request_timeout: Duration::from_secs(self.api.timeout_secs),
            user_agent: self.api.user_agent.clone(),
            transport,
            ..HttpClientConfig::default()
        })
    }

    /// Effective configuration as YAML.
    ///
    /// # Errors
    /// Only if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("failed to render configuration as YAML")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::io::Write;

    const ENV_KEYS: [&str; 3] = [
        "ADMIN_CONSOLE__API__BASE_URL",
        "ADMIN_CONSOLE__API__TIMEOUT_SECS",
        "ADMIN_CONSOLE__SESSION__STORE_PATH",
    ];

    fn yaml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "https://localhost:3000");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(!config.api.allow_insecure_http);
        assert!(config.api.user_agent.starts_with("admin-console/"));
        assert!(config.session.store_path.ends_with("admin-console/session.json"));
    }

    #[test]
    fn yaml_overrides_defaults() {
        let file = yaml_file(
            "api:\n  base_url: https://api.example.com\n  timeout_secs: 5\nsession:\n  store_path: /tmp/admin/session.json\n",
        );
        let config = temp_env::with_vars_unset(ENV_KEYS, || AppConfig::load(Some(file.path()))).unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.session.store_path, PathBuf::from("/tmp/admin/session.json"));
        assert_eq!(config.api.user_agent, ApiConfig::default().user_agent);
    }

    #[test]
    fn env_overrides_yaml() {
        let file = yaml_file("api:\n  base_url: https://from-file.example.com\n");
        let config = temp_env::with_vars(
            [
                ("ADMIN_CONSOLE__API__BASE_URL", Some("https://from-env.example.com")),
                ("ADMIN_CONSOLE__API__TIMEOUT_SECS", Some("12")),
            ],
            || AppConfig::load(Some(file.path())),
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://from-env.example.com");
        assert_eq!(config.api.timeout_secs, 12);
    }

    #[test]
    fn cli_override_wins() {
        let file = yaml_file("api:\n  base_url: https://from-file.example.com\n");
        let mut config = temp_env::with_vars(
            [("ADMIN_CONSOLE__API__BASE_URL", Some("https://from-env.example.com"))],
            || AppConfig::load(Some(file.path())),
        )
        .unwrap();
        config.apply_cli_overrides(Some("https://from-cli.example.com".to_owned()));
        assert_eq!(config.api.base_url, "https://from-cli.example.com");

        config.apply_cli_overrides(None);
        assert_eq!(config.api.base_url, "https://from-cli.example.com");
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let file = yaml_file("api:\n  timeout_secs: soon\n");
        let err = temp_env::with_vars_unset(ENV_KEYS, || AppConfig::load(Some(file.path()))).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn plain_http_needs_opt_in() {
        let mut config = AppConfig::default();
        config.api.base_url = "http://localhost:3000".to_owned();
        let err = config.http_client_config().unwrap_err();
        assert!(err.to_string().contains("allow_insecure_http"));

        config.api.allow_insecure_http = true;
        let http = config.http_client_config().unwrap();
        assert_eq!(http.transport, TransportSecurity::AllowInsecureHttp);
    }

    #[test]
    fn http_client_config_carries_timeout_and_agent() {
        let mut config = AppConfig::default();
        config.api.timeout_secs = 7;
        config.api.user_agent = "ops-script/1".to_owned();
        let http = config.http_client_config().unwrap();
        assert_eq!(http.request_timeout, Duration::from_secs(7));
        assert_eq!(http.user_agent, "ops-script/1");
        assert_eq!(http.transport, TransportSecurity::TlsOnly);

        config.api.timeout_secs = 0;
        assert!(config.http_client_config().is_err());
    }

    #[test]
    fn yaml_dump_parses_back() {
        let config = AppConfig::default();
        let parsed: AppConfig = serde_saphyr::from_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
