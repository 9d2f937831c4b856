//! Configuration for the shipment service module

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::Deserialize;
use std::path::Path;

/// Shipment service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Survey-collection API access
    pub survey: SurveyConfig,

    /// Prefix for deterministic package codes, e.g. "/JO"
    #[serde(default = "default_code_prefix")]
    pub package_code_prefix: String,

    /// Largest quantity accepted for a single kit addition
    #[serde(default = "default_max_kit_quantity")]
    pub max_kit_quantity: i32,
}

/// Access to the external survey-collection API
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveyConfig {
    /// Base URL of the survey server, e.g. "https://forms.example.org"
    pub base_url: String,

    /// API token sent in the Authorization header
    pub api_token: String,

    /// Form holding package tracking scans
    pub package_form_id: i64,

    /// Form holding device-id verification submissions
    pub device_form_id: i64,

    /// Seconds between polling runs
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Config {
    /// Load configuration from a YAML file, overridable through
    /// `SHIPMENTS_`-prefixed environment variables
    /// (e.g. `SHIPMENTS_SURVEY__API_TOKEN`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("SHIPMENTS_").split("__"))
            .extract()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            survey: SurveyConfig::default(),
            package_code_prefix: default_code_prefix(),
            max_kit_quantity: default_max_kit_quantity(),
        }
    }
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            package_form_id: 0,
            device_form_id: 0,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_code_prefix() -> String {
    "/JO".to_string()
}

// An IntegerField can hold about 2 billion; keep far enough below that
// adding the maximum twice cannot overflow the column.
fn default_max_kit_quantity() -> i32 {
    50_000_000
}

fn default_poll_interval_secs() -> u64 {
    300
}
