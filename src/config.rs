use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub intercom: IntercomSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Served for any path no route matches.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Sessions shown in the panel.
    #[serde(default = "default_history_display_limit")]
    pub history_display_limit: usize,
    /// Capacity of the reactor request channel.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

#[derive(Clone, Default, Deserialize)]
pub struct IntercomSettings {
    /// Webhook signatures are only checked when this is set.
    #[serde(default)]
    pub client_secret: Option<Secret<String>>,
}

impl IntercomSettings {
    pub fn secret_bytes(&self) -> Option<Vec<u8>> {
        self.client_secret
            .as_ref()
            .map(|s| s.expose_secret().as_bytes().to_vec())
            .filter(|s| !s.is_empty())
    }
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            history_display_limit: default_history_display_limit(),
            command_buffer: default_command_buffer(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_history_display_limit() -> usize {
    5
}

fn default_command_buffer() -> usize {
    256
}

/// Optional `dwell.{toml,yaml,json}` in the working directory, then `DWELL_*` env vars
/// (`DWELL_APPLICATION__PORT=8080`, `DWELL_INTERCOM__CLIENT_SECRET=...`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    Config::builder()
        .add_source(File::with_name("dwell").required(false))
        .add_source(
            Environment::with_prefix("DWELL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.application.port, 3000);
        assert_eq!(settings.application.history_display_limit, 5);
        assert!(settings.intercom.secret_bytes().is_none());
    }

    #[test]
    fn empty_secret_is_treated_as_unset() {
        let settings: Settings =
            serde_json::from_str(r#"{"intercom": {"client_secret": ""}}"#).unwrap();
        assert!(settings.intercom.secret_bytes().is_none());

        let settings: Settings =
            serde_json::from_str(r#"{"intercom": {"client_secret": "abc"}}"#).unwrap();
        assert_eq!(settings.intercom.secret_bytes(), Some(b"abc".to_vec()));
    }
}
