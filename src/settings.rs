use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: Url,
    pub debug: bool,
    pub enable_swagger: bool,
    pub port: u16,
    #[serde(serialize_with = "tz_name", deserialize_with = "parse_tz")]
    pub timezone: Tz,
    pub request_timeout_secs: u64,
    pub explorer_idle_secs: u64,
    pub max_explorers: u64,
    pub club_name: String,
    pub cors_origin: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // APP_API_BASE_URL, APP_EXPLORER_IDLE_SECS, ...
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("api_base_url", "http://localhost:8000/api")?
            .set_default("debug", false)?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("timezone", "Europe/Moscow")?
            .set_default("request_timeout_secs", 10)?
            .set_default("explorer_idle_secs", 1800)?
            .set_default("max_explorers", 10_000)?
            .set_default("club_name", "Gabi Club")?
            .build()?;

        config.try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn explorer_idle(&self) -> Duration {
        Duration::from_secs(self.explorer_idle_secs)
    }
}

fn tz_name<S: Serializer>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(tz.name())
}

fn parse_tz<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Tz, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse()
        .map_err(|_| serde::de::Error::custom(format!("unknown time zone `{raw}`")))
}
