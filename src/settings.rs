use async_openai::error::OpenAIError;
use async_openai::{Client, config::OpenAIConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SETTINGS_PATH: &str = "./data/settings.json";

/// Sampling and retry knobs handed to the backend for one kind of call.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    /// Extra attempts after the first one, for transient failures only.
    pub max_retries: u32,
}

impl GenerationSettings {
    pub fn poet() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.9,
            max_tokens: 1000,
            max_retries: 2,
        }
    }

    pub fn guardrail() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: 400,
            max_retries: 2,
        }
    }
}

// Define a structure to hold application settings with serialization and deserialization capabilities.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Settings {
    pub openai_api_key: Option<String>, // Falls back to OPENAI_API_KEY when unset.
    pub api_base: Option<String>,       // Any OpenAI compatible endpoint.
    pub model: String,
    pub poet: GenerationSettings,
    pub guardrail: GenerationSettings,
    pub request_timeout_secs: u64,
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
    pub log_dir: PathBuf,
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            openai_api_key: None,
            api_base: None,
            model: "gpt-4o-mini".to_string(),
            poet: GenerationSettings::poet(),
            guardrail: GenerationSettings::guardrail(),
            request_timeout_secs: 60,
            database_path: PathBuf::from("./data/poetry_agent.db"),
            bind_addr: "127.0.0.1:8000".to_string(),
            allowed_origins: vec!["https://poetry-assistant-aazs.vercel.app".to_string()],
            log_dir: PathBuf::from("./data"),
            debug_mode: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    // Load settings from a default file path.
    pub fn load() -> io::Result<Self> {
        Self::load_settings_from_file(DEFAULT_SETTINGS_PATH)
    }

    /// Reads the file at `path`, or hands back the defaults when there is none yet.
    pub fn load_or_default(path: impl AsRef<Path>) -> io::Result<Self> {
        match Self::load_settings_from_file(&path) {
            Ok(settings) => Ok(settings),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!(
                    "No settings at {}, using defaults",
                    path.as_ref().display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    // Save current settings to a default file path.
    pub fn save(&self) -> io::Result<()> {
        self.save_to_file(DEFAULT_SETTINGS_PATH)
    }

    pub fn load_settings_from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let data = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn openai_config(&self) -> OpenAIConfig {
        let mut config = OpenAIConfig::new();
        if let Some(key) = &self.openai_api_key {
            config = config.with_api_key(key);
        }
        if let Some(base) = &self.api_base {
            config = config.with_api_base(base);
        }
        config
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug_mode {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }

    // Asynchronously validate the configured API key against the models endpoint.
    pub async fn validate_api_key(&self) -> bool {
        let client = Client::with_config(self.openai_config());
        match client.models().list().await {
            Ok(_) => true,
            Err(OpenAIError::Reqwest(e)) => {
                log::warn!("Could not reach the model endpoint: {e}");
                false
            }
            Err(e) => {
                log::warn!("API key rejected: {e}");
                false
            }
        }
    }
}
