use std::path::PathBuf;

use color_eyre::eyre::Result;
use llmeme::ai::config::{GenerationConfig, ModelConfig};
use llmeme::meme::{Credentials, RenderConfig};
use serde::Deserialize;
use strum_macros::Display;

use crate::utils::PROJECT_NAME;

const CONFIG: &str = include_str!("../.config/config.json5");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventBackend {
    #[default]
    Sqlite,
    Jsonl,
}

impl EventBackend {
    fn default_file_name(&self) -> &'static str {
        match self {
            EventBackend::Sqlite => "events.db",
            EventBackend::Jsonl => "events.jsonl",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub backend: EventBackend,
    pub path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        EventsConfig {
            backend: EventBackend::default(),
            path: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub _data_dir: PathBuf,
    #[serde(default)]
    pub _config_dir: PathBuf,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub context_path: Option<PathBuf>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub imgflip: Credentials,
    #[serde(default)]
    pub events: EventsConfig,
}

impl Config {
    /// Layers the bundled defaults, any config file in the config dir, then
    /// `LLMEME_*` environment variables (`__` separates nested keys).
    pub fn new() -> Result<Self, config::ConfigError> {
        let data_dir = crate::utils::get_data_dir();
        let config_dir = crate::utils::get_config_dir();
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5))
            .set_default("_data_dir", data_dir.to_str().unwrap_or_default())?
            .set_default("_config_dir", config_dir.to_str().unwrap_or_default())?;

        let config_files = [
            ("config.json5", config::FileFormat::Json5),
            ("config.json", config::FileFormat::Json),
            ("config.yaml", config::FileFormat::Yaml),
            ("config.toml", config::FileFormat::Toml),
            ("config.ini", config::FileFormat::Ini),
        ];
        let mut found_config = false;
        for (file, format) in &config_files {
            let path = config_dir.join(file);
            if path.exists() {
                found_config = true;
            }
            builder = builder.add_source(config::File::from(path).format(*format).required(false));
        }
        if !found_config {
            log::info!(
                "no configuration file found in {}, using defaults",
                config_dir.display()
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(PROJECT_NAME.as_str())
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    pub fn events_path(&self) -> PathBuf {
        self.events
            .path
            .clone()
            .unwrap_or_else(|| self._data_dir.join(self.events.backend.default_file_name()))
    }
}
