//! Configuration module for environment variable parsing.
//!
//! Syntax problems (a non-numeric `PORT`, an unrecognized boolean) are logged
//! and fall back to the default. Semantic problems (a zero or negative port, an over-long key)
//! are rejected once, at startup.

use std::env;
use tracing::warn;

use crate::crypto::EncryptKey;
use crate::error::ConfigError;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8600;

/// Default route the webhook is served on.
pub const DEFAULT_WEBHOOK_PATH: &str = "/";

/// Settings owned by the validation pipeline.
///
/// Immutable once handed to [`crate::WebhookPipeline::new`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    key: Option<EncryptKey>,
    verify_token: Option<String>,
    ignore_decrypt_error: bool,
}

impl Default for PipelineConfig {
    /// No key, no verify token, decrypt errors ignored.
    fn default() -> Self {
        Self {
            key: None,
            verify_token: None,
            ignore_decrypt_error: true,
        }
    }
}

impl PipelineConfig {
    /// Decrypt every request with this key.
    pub fn with_key(mut self, key: EncryptKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Require `d.verify_token` to equal this value.
    pub fn with_verify_token(mut self, token: impl Into<String>) -> Self {
        self.verify_token = Some(token.into());
        self
    }

    /// When `false`, decrypt failures are reported to the subscriber and
    /// answered with status 500, and plaintext bodies are accepted even
    /// though a key is configured.
    pub fn with_ignore_decrypt_error(mut self, ignore: bool) -> Self {
        self.ignore_decrypt_error = ignore;
        self
    }

    pub fn key(&self) -> Option<&EncryptKey> {
        self.key.as_ref()
    }

    pub fn verify_token(&self) -> Option<&str> {
        self.verify_token.as_deref()
    }

    pub fn ignore_decrypt_error(&self) -> bool {
        self.ignore_decrypt_error
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Route the gateway posts callbacks to
    pub webhook_path: String,

    /// Decryption and verification settings
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// * `PORT` - listen port (default 8600)
    /// * `KHL_WEBHOOK_PATH` - callback route (default `/`)
    /// * `KHL_ENCRYPT_KEY` - encrypt key from the developer console
    /// * `KHL_VERIFY_TOKEN` - verify token from the developer console
    /// * `KHL_IGNORE_DECRYPT_ERROR` - ignore undecryptable requests (default true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_port(lookup("PORT"))?;

        let webhook_path = lookup("KHL_WEBHOOK_PATH")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string());
        if !webhook_path.starts_with('/') {
            return Err(ConfigError::InvalidWebhookPath(webhook_path));
        }

        let ignore_decrypt_error = parse_bool(
            "KHL_IGNORE_DECRYPT_ERROR",
            lookup("KHL_IGNORE_DECRYPT_ERROR"),
            true,
        );

        let mut pipeline =
            PipelineConfig::default().with_ignore_decrypt_error(ignore_decrypt_error);

        if let Some(secret) = lookup("KHL_ENCRYPT_KEY").filter(|v| is_configured(v)) {
            pipeline = pipeline.with_key(EncryptKey::from_secret(&secret)?);
        }

        if let Some(token) = lookup("KHL_VERIFY_TOKEN").filter(|v| is_configured(v)) {
            pipeline = pipeline.with_verify_token(token);
        }

        Ok(Config {
            port,
            webhook_path,
            pipeline,
        })
    }
}

/// Blank secrets count as unset.
fn is_configured(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Parse `PORT`. Non-numeric values fall back to the default; numbers
/// outside `1..=65535` (zero, negative, too large) are rejected.
fn parse_port(raw: Option<String>) -> Result<u16, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_PORT);
    };

    match raw.trim().parse::<i64>() {
        Ok(port) => match u16::try_from(port) {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(ConfigError::InvalidPort(port)),
        },
        Err(_) => {
            warn!(env_var = "PORT", value = %raw, "Invalid value, using default");
            Ok(DEFAULT_PORT)
        }
    }
}

/// Parse a boolean such as "true", "0" or "no".
fn parse_bool(name: &str, raw: Option<String>, default: bool) -> bool {
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8600);
        assert_eq!(config.webhook_path, "/");
        assert!(config.pipeline.key().is_none());
        assert!(config.pipeline.verify_token().is_none());
        assert!(config.pipeline.ignore_decrypt_error());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("KHL_WEBHOOK_PATH", "/khl-wh"),
            ("KHL_ENCRYPT_KEY", "abc"),
            ("KHL_VERIFY_TOKEN", "tok"),
            ("KHL_IGNORE_DECRYPT_ERROR", "false"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.webhook_path, "/khl-wh");
        assert_eq!(
            config.pipeline.key(),
            Some(&EncryptKey::from_secret("abc").unwrap())
        );
        assert_eq!(config.pipeline.verify_token(), Some("tok"));
        assert!(!config.pipeline.ignore_decrypt_error());
    }

    #[test]
    fn test_blank_secrets_are_unset() {
        let config = Config::from_lookup(lookup_from(&[
            ("KHL_ENCRYPT_KEY", ""),
            ("KHL_VERIFY_TOKEN", "   "),
        ]))
        .unwrap();
        assert!(config.pipeline.key().is_none());
        assert!(config.pipeline.verify_token().is_none());
    }

    #[test]
    fn test_zero_port_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort(0));
    }

    #[test]
    fn test_negative_port_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "-5")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort(-5));
    }

    #[test]
    fn test_out_of_range_port_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "70000")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort(70000));
    }

    #[test]
    fn test_non_numeric_port_uses_default() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "http")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_long_key_rejected() {
        let long = "k".repeat(40);
        let err = Config::from_lookup(lookup_from(&[("KHL_ENCRYPT_KEY", long.as_str())]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidKeyLength(40));
    }

    #[test]
    fn test_relative_path_rejected() {
        let err = Config::from_lookup(lookup_from(&[("KHL_WEBHOOK_PATH", "hook")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidWebhookPath("hook".to_string()));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", Some("YES".to_string()), false));
        assert!(!parse_bool("X", Some("0".to_string()), true));
        assert!(parse_bool("X", Some("maybe".to_string()), true));
        assert!(!parse_bool("X", None, false));
    }

    #[test]
    fn test_is_configured() {
        assert!(!is_configured(""));
        assert!(!is_configured("   "));
        assert!(is_configured("key123"));
    }
}
