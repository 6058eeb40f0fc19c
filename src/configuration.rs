use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::record_store::RestStore;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub environment: Environment,
}

/// Connection details for the hosted record store.
///
/// Every field is optional: a flow whose url or key is missing runs against an
/// unconfigured store and answers "unavailable" without touching the network.
#[derive(Deserialize, Clone, Default)]
pub struct StoreSettings {
    pub url: Option<String>,
    pub service_key: Option<Secret<String>>,
    pub anon_key: Option<Secret<String>>,
    pub timeout_millis: Option<u64>,
}

/// Which of the store's keys a client authenticates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    /// Server-side key, used by the newsletter subscription flow.
    Service,
    /// Public key, used by the contact form flow.
    Anon,
}

impl StoreSettings {
    pub fn credentials(&self, key: StoreKey) -> Option<(&str, &Secret<String>)> {
        let url = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        let secret = match key {
            StoreKey::Service => self.service_key.as_ref(),
            StoreKey::Anon => self.anon_key.as_ref(),
        }
        .filter(|s| !s.expose_secret().trim().is_empty())?;
        Some((url, secret))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_millis.map(Duration::from_millis)
    }

    pub fn client(&self, key: StoreKey) -> anyhow::Result<RestStore> {
        match self.credentials(key) {
            Some((url, secret)) => RestStore::new(url, secret.clone(), self.timeout()),
            None => Ok(RestStore::unconfigured()),
        }
    }
}

/// OTLP trace export. The api key travels as gRPC metadata under
/// `api_key_header`; an empty key sends no header.
#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    pub enabled: bool,
    pub service_name: String,
    pub endpoint: String,
    pub api_key_header: String,
    pub api_key: Secret<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "development" | "local" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `development` or `production`."
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory. {e}"))
    })?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override("application.environment", environment.as_str())?
        .build()?;

    settings.try_deserialize::<Settings>()
}
