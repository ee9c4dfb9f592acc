use crate::provider::{RequestParameters, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OPENAI_KEY";
/// Environment variable that switches to the offline mock provider.
pub const MOCK_VAR: &str = "AITERM_USE_MOCK";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub frequency_penalty: Option<f32>,
    #[serde(default)]
    pub presence_penalty: Option<f32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub use_mock: bool,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub url: Option<String>,
    pub model: Option<String>,
}

impl Config {
    /// Load configuration from file and environment variables.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file().unwrap_or_else(|_| {
            info!("No config file found, using defaults");
            Self::default()
        });

        // Environment variables override config file
        if let Ok(api_key) = std::env::var(API_KEY_VAR) {
            config.api_key = Some(api_key);
        }

        if std::env::var(MOCK_VAR).is_ok() {
            config.use_mock = true;
        }

        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        Self::load_from_path(&Self::get_config_path()?)
    }

    /// Load only what is saved on disk, ignoring environment overrides.
    pub fn load_saved() -> Self {
        Self::load_from_file().unwrap_or_default()
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            info!("Loaded config from: {}", path.display());
            Ok(config)
        } else {
            Err(anyhow!("Config file not found"))
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::get_config_path()?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved config to: {}", path.display());
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".aiterm").join("config.toml"))
    }

    /// Set API key and save config
    pub fn set_api_key(&mut self, api_key: String) -> Result<()> {
        self.api_key = Some(api_key);
        self.save()?;
        info!("API key saved to config file");
        Ok(())
    }

    /// Applies command-line overrides on top of file and environment values.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(api_key) = overrides.api_key {
            self.api_key = Some(api_key);
        }
        if let Some(url) = overrides.url {
            self.url = Some(url);
        }
        if let Some(model) = overrides.model {
            self.model = Some(model);
        }
    }

    /// The configured key, or an empty string when none is set.
    ///
    /// An empty key counts as missing; the resolution loop will ask for one.
    pub fn api_key(&self) -> String {
        self.api_key.clone().unwrap_or_default()
    }

    pub fn endpoint(&self) -> String {
        self.url.clone().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn request_parameters(&self) -> RequestParameters {
        let defaults = RequestParameters::default();
        RequestParameters {
            model: self.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            top_p: self.top_p.unwrap_or(defaults.top_p),
            frequency_penalty: self.frequency_penalty.unwrap_or(defaults.frequency_penalty),
            presence_penalty: self.presence_penalty.unwrap_or(defaults.presence_penalty),
        }
    }

    pub fn is_mock_mode(&self) -> bool {
        self.use_mock
    }

    pub fn show_config_info() -> Result<()> {
        let config_path = Self::get_config_path()?;
        println!("Configuration file: {}", config_path.display());

        if config_path.exists() {
            println!("Status: Found");
            let config = Self::load_from_path(&config_path)?;
            println!(
                "API Key: {}",
                if config.api_key.as_deref().is_some_and(|k| !k.is_empty()) { "Set" } else { "Not set" }
            );
            println!("Endpoint: {}", config.endpoint());
            println!("Model: {}", config.request_parameters().model);
            println!("Mock mode: {}", config.use_mock);
        } else {
            println!("Status: Not found (using defaults)");
        }

        println!("\nTo set API key:");
        println!("  aiterm --set-api-key <your-key>");
        println!("\nOr set environment variable:");
        println!("  export {}=<your-key>", API_KEY_VAR);

        Ok(())
    }
}
