//! Configuration management for the storage access broker
//!
//! Separates startup configuration (bridge listener) from platform
//! configuration (volumes, grants, picker behaviour).

use config::{Config, Environment, File};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::broker::{BrokerOptions, PendingPolicy};
use crate::handle::{DocumentId, document_uri};

/// Status-media directory of the chat application, the picker's preferred start.
pub const STATUS_MEDIA_DOCUMENT: &str = "primary:Android/media/com.whatsapp/WhatsApp/Media/.Statuses";

pub const DEFAULT_AUTHORITY: &str = "com.android.externalstorage.documents";
pub const DEFAULT_CHANNEL: &str = "com.statussaver.status_saver/saf";

/// Complete broker configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BrokerConfig {
    #[serde(flatten)]
    pub startup: StartupConfig,

    #[serde(flatten)]
    pub platform: PlatformConfig,
}

/// Bridge listener settings, read once at startup
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StartupConfig {
    /// IP address the method-call bridge binds to
    pub bind_address: String,

    /// Port of the method-call bridge
    pub port: u16,

    /// Channel name announced to each host connection
    pub channel: String,

    /// Longest accepted method-call line, in bytes
    pub max_message_length: usize,

    /// Concurrent host connections
    pub max_connections: usize,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 4242,
            channel: DEFAULT_CHANNEL.to_string(),
            max_message_length: 8192,
            max_connections: 4,
        }
    }
}

/// Scoped-storage platform settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PlatformConfig {
    /// Authority used in `content://` handles
    pub authority: String,

    /// Storage volumes by name, e.g. `primary = "./storage"`
    pub volumes: HashMap<String, String>,

    /// JSON file holding persisted grants
    pub grants_file: String,

    /// Document id (`volume:path`) the picker should start at, when the
    /// platform honours hints
    pub initial_hint: Option<String>,

    /// Whether the platform picker supports an initial location
    pub supports_initial_hint: bool,

    /// Behaviour when a second access request arrives while one is pending
    pub pending_policy: PendingPolicy,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        let mut volumes = HashMap::new();
        volumes.insert("primary".to_string(), "./storage".to_string());

        Self {
            authority: DEFAULT_AUTHORITY.to_string(),
            volumes,
            grants_file: "./grants.json".to_string(),
            initial_hint: Some(STATUS_MEDIA_DOCUMENT.to_string()),
            supports_initial_hint: true,
            pending_policy: PendingPolicy::Overwrite,
        }
    }
}

impl BrokerConfig {
    /// Load configuration from config.toml with environment overrides.
    ///
    /// Missing files are not an error; defaults fill whatever is not set.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_paths = [
            "saf-broker/config", // Packaged layout: ./saf-broker/config.toml
            "config",            // Local development: ./config.toml
        ];

        let mut builder = Config::builder();
        for config_path in &config_paths {
            builder = builder.add_source(File::with_name(config_path).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("SAF_BROKER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: BrokerConfig = settings.try_deserialize()?;
        config.validate()?;

        info!(
            "Configuration loaded: bridge {} on {}, {} volume(s)",
            config.startup.channel,
            config.startup.bridge_socket(),
            config.platform.volumes.len()
        );

        Ok(config)
    }

    /// Split into listener and platform parts
    pub fn split(self) -> (StartupConfig, PlatformConfig) {
        (self.startup, self.platform)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.startup.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.startup.channel.is_empty() {
            return Err(config::ConfigError::Message(
                "channel cannot be empty".into(),
            ));
        }

        if self.startup.max_message_length == 0 {
            return Err(config::ConfigError::Message(
                "max_message_length must be greater than 0".into(),
            ));
        }

        if self.startup.max_connections == 0 {
            return Err(config::ConfigError::Message(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.platform.authority.is_empty() || self.platform.authority.contains('/') {
            return Err(config::ConfigError::Message(
                "authority must be a non-empty name without '/'".into(),
            ));
        }

        if self.platform.volumes.is_empty() {
            return Err(config::ConfigError::Message(
                "at least one volume must be configured".into(),
            ));
        }

        if let Some((name, _)) = self
            .platform
            .volumes
            .iter()
            .find(|(name, root)| name.is_empty() || name.contains(':') || root.is_empty())
        {
            return Err(config::ConfigError::Message(format!(
                "invalid volume entry '{}'",
                name
            )));
        }

        if let Some(hint) = &self.platform.initial_hint {
            hint.parse::<DocumentId>().map_err(|e| {
                config::ConfigError::Message(format!("invalid initial_hint '{}': {}", hint, e))
            })?;
        }

        if self.platform.grants_file.is_empty() {
            return Err(config::ConfigError::Message(
                "grants_file cannot be empty".into(),
            ));
        }

        Ok(())
    }
}

impl StartupConfig {
    /// Bind address and port as a socket address string
    pub fn bridge_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl PlatformConfig {
    /// Volume roots as paths
    pub fn volume_paths(&self) -> HashMap<String, PathBuf> {
        self.volumes
            .iter()
            .map(|(name, root)| (name.clone(), PathBuf::from(root)))
            .collect()
    }

    pub fn grants_path(&self) -> &Path {
        Path::new(&self.grants_file)
    }

    /// Picker location hint as a document URI under this authority
    pub fn initial_location(&self) -> Option<String> {
        let id = self.initial_hint.as_deref()?.parse::<DocumentId>().ok()?;
        Some(document_uri(&self.authority, &id))
    }

    pub fn broker_options(&self) -> BrokerOptions {
        BrokerOptions {
            initial_location: self.initial_location(),
            supports_initial_hint: self.supports_initial_hint,
            pending_policy: self.pending_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BrokerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.startup.bridge_socket(), "127.0.0.1:4242");
        assert_eq!(config.platform.pending_policy, PendingPolicy::Overwrite);
        assert_eq!(
            config.platform.broker_options().initial_location.as_deref(),
            Some(
                "content://com.android.externalstorage.documents/document/primary%3AAndroid%2Fmedia%2Fcom.whatsapp%2FWhatsApp%2FMedia%2F.Statuses"
            )
        );
    }

    #[test]
    fn test_initial_hint_follows_authority() {
        let mut config = BrokerConfig::default();
        config.platform.authority = "local.documents".to_string();
        config.platform.initial_hint = Some("sdcard:DCIM/Camera".to_string());
        assert_eq!(
            config.platform.initial_location().as_deref(),
            Some("content://local.documents/document/sdcard%3ADCIM%2FCamera")
        );

        config.platform.initial_hint = None;
        assert!(config.platform.initial_location().is_none());

        config.platform.initial_hint = Some("no separator".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = BrokerConfig::default();
        config.startup.port = 0;
        assert!(config.validate().is_err());

        let mut config = BrokerConfig::default();
        config.platform.volumes.clear();
        assert!(config.validate().is_err());

        let mut config = BrokerConfig::default();
        config
            .platform
            .volumes
            .insert("bad:name".to_string(), "./x".to_string());
        assert!(config.validate().is_err());

        let mut config = BrokerConfig::default();
        config.platform.authority = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let toml = r#"
            port = 5000
            pending_policy = "reject"
            supports_initial_hint = false

            [volumes]
            primary = "/srv/primary"
            sdcard = "/srv/sdcard"
        "#;

        let config: BrokerConfig = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.startup.port, 5000);
        assert_eq!(config.startup.bind_address, "127.0.0.1");
        assert_eq!(config.platform.pending_policy, PendingPolicy::Reject);
        assert!(!config.platform.supports_initial_hint);
        assert_eq!(config.platform.volumes.len(), 2);
        assert_eq!(config.platform.authority, DEFAULT_AUTHORITY);
        assert!(config.validate().is_ok());
    }
}
