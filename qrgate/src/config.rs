//! Configuration loading for the qrgate server.
//!
//! Loads configuration from a TOML file and/or environment variables using figment.
//!
//! # Configuration Sources (in order of priority, lowest to highest)
//!
//! 1. Default values (from `#[serde(default)]` attributes)
//! 2. TOML config file (if it exists)
//! 3. Environment variables (prefix: `QRGATE_`, nested with `__`)
//!
//! # Environment Variable Naming
//!
//! - `QRGATE_ADMIN__PASSWORD` → `admin.password`
//! - `QRGATE_SERVER__LISTEN_ADDR` → `server.listen_addr`
//! - `QRGATE_SESSION__TIMEOUT_SECS` → `session.timeout_secs`
//! - `QRGATE_QR__MODULE_SCALE` → `qr.module_scale`
//!
//! The admin password is compared as plain text. There is no hashing and no
//! attempt limiting; treat it as a shared kiosk secret, not an account system.

use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::qr::RenderOptions;

/// Main configuration for the qrgate server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Administrator credentials
    pub admin: AdminConfig,

    /// Session lifetime and cookie settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Rendering of generated codes
    #[serde(default)]
    pub qr: QrConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Largest accepted request body (image uploads), in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8501".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// Administrator credentials.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    /// The single admin password, compared by exact string equality
    pub password: String,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Idle time after which a session (and its admin login) is dropped
    #[serde(default = "default_session_timeout_secs")]
    pub timeout_secs: u64,

    /// How often expired sessions are swept from memory
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Name of the cookie carrying the session id
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_session_timeout_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            cookie_name: default_cookie_name(),
        }
    }
}

fn default_session_timeout_secs() -> u64 {
    3600
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_cookie_name() -> String {
    "qrgate_session".to_string()
}

/// Rendering parameters for generated codes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QrConfig {
    /// Pixels per module
    #[serde(default = "default_module_scale")]
    pub module_scale: u32,

    /// Quiet zone width in modules
    #[serde(default = "default_border")]
    pub border: u32,
}

impl QrConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            module_scale: self.module_scale,
            border: self.border,
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            module_scale: default_module_scale(),
            border: default_border(),
        }
    }
}

fn default_module_scale() -> u32 {
    RenderOptions::default().module_scale
}

fn default_border() -> u32 {
    RenderOptions::default().border
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Configuration sources are merged in order (later sources override earlier):
    /// 1. TOML config file (if it exists)
    /// 2. Environment variables (prefix: `QRGATE_`, nested with `__`)
    ///
    /// # Example
    ///
    /// ```bash
    /// # Supply the admin password without writing it to disk
    /// export QRGATE_ADMIN__PASSWORD=s3cret
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let mut figment = Figment::new();

        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("QRGATE_").split("__"));

        let config: Config = figment.extract().with_context(|| {
            format!(
                "Failed to load config from {} and environment",
                path.display()
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.admin.password.is_empty() {
            bail!("admin.password must not be empty");
        }
        if self.qr.module_scale == 0 {
            bail!("qr.module_scale must be at least 1");
        }
        if self.session.cleanup_interval_secs == 0 {
            bail!("session.cleanup_interval_secs must be at least 1");
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Parsed listen address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", self.server.listen_addr))
    }

    /// Get the default config file path
    /// - macOS: ~/Library/Application Support/qrgate/config.toml
    /// - Linux: ~/.config/qrgate/config.toml
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qrgate")
            .join("config.toml")
    }
}

/// Create a default configuration template
pub fn default_config_template() -> String {
    format!(
        r#"# qrgate configuration
#
# Every value can be overridden with an environment variable, e.g.
#   QRGATE_ADMIN__PASSWORD=...   QRGATE_SERVER__LISTEN_ADDR=0.0.0.0:8501

[server]
listen_addr = "{listen_addr}"
# Largest accepted upload, in bytes
max_upload_bytes = {max_upload_bytes}

[admin]
# Compared as plain text, with no lockout on repeated attempts.
# Change this before exposing the server.
password = "change-me"

[session]
# Idle seconds before a session (and its admin login) is forgotten
timeout_secs = {timeout_secs}
cleanup_interval_secs = {cleanup_interval_secs}
cookie_name = "{cookie_name}"

[qr]
# Pixels per module and quiet zone width (in modules) of generated codes
module_scale = {module_scale}
border = {border}
"#,
        listen_addr = default_listen_addr(),
        max_upload_bytes = default_max_upload_bytes(),
        timeout_secs = default_session_timeout_secs(),
        cleanup_interval_secs = default_cleanup_interval_secs(),
        cookie_name = default_cookie_name(),
        module_scale = default_module_scale(),
        border = default_border(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use figment::providers::Toml as TomlProvider;

    /// Helper to parse TOML config strings in tests
    fn parse_config(toml_str: &str) -> Config {
        Figment::new()
            .merge(TomlProvider::string(toml_str))
            .extract()
            .expect("Failed to parse test config")
    }

    #[test]
    fn test_parse_config() {
        let config = parse_config(
            r#"
[server]
listen_addr = "0.0.0.0:9000"
max_upload_bytes = 1024

[admin]
password = "admin123"

[session]
timeout_secs = 120

[qr]
module_scale = 8
border = 4
"#,
        );
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.server.max_upload_bytes, 1024);
        assert_eq!(config.admin.password, "admin123");
        assert_eq!(config.session.timeout(), Duration::from_secs(120));
        assert_eq!(config.session.cleanup_interval_secs, 60);
        assert_eq!(
            config.qr.render_options(),
            RenderOptions {
                module_scale: 8,
                border: 4
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = parse_config(
            r#"
[admin]
password = "admin123"
"#,
        );
        assert_eq!(config.server.listen_addr, "127.0.0.1:8501");
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.session.cookie_name, "qrgate_session");
        assert_eq!(config.session.timeout_secs, 3600);
        assert_eq!(config.qr.render_options(), RenderOptions::default());
    }

    #[test]
    fn test_missing_password_fails() {
        let result = Figment::new()
            .merge(TomlProvider::string("[server]\nlisten_addr = \"127.0.0.1:1\"\n"))
            .extract::<Config>();
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = parse_config("[admin]\npassword = \"x\"\n");
        config.admin.password.clear();
        assert!(config.validate().is_err());

        let mut config = parse_config("[admin]\npassword = \"x\"\n");
        config.qr.module_scale = 0;
        assert!(config.validate().is_err());

        let mut config = parse_config("[admin]\npassword = \"x\"\n");
        config.server.listen_addr = "not-an-address".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_password_redacted_in_debug() {
        let config = parse_config("[admin]\npassword = \"hunter2\"\n");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_template_parses() {
        let config = parse_config(&default_config_template());
        assert_eq!(config.admin.password, "change-me");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_file_with_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[server]
listen_addr = "127.0.0.1:8600"

[admin]
password = "from-file"
"#,
            )?;
            jail.set_env("QRGATE_ADMIN__PASSWORD", "from-env");

            let config = Config::load(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.admin.password, "from-env");
            assert_eq!(config.server.listen_addr, "127.0.0.1:8600");
            Ok(())
        });
    }

    #[test]
    fn test_load_env_only() {
        Jail::expect_with(|jail| {
            jail.set_env("QRGATE_ADMIN__PASSWORD", "admin123");
            jail.set_env("QRGATE_QR__BORDER", "2");

            let config =
                Config::load(Path::new("does-not-exist.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.admin.password, "admin123");
            assert_eq!(config.qr.border, 2);
            Ok(())
        });
    }
}
