use crate::agent::DEFAULT_MAX_ROUNDS;
use crate::conversation::TranscriptFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ORBIT_DIR: &str = ".orbit";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptConfig {
    pub enabled: bool,
    pub format: TranscriptFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: TranscriptFormat::Text,
            dir: None,
        }
    }
}

impl TranscriptConfig {
    pub fn sessions_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| get_orbit_dir().join("sessions"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_rounds: usize,
    pub parallel_tool_calls: bool,
    pub system_instruction: Option<String>,
    pub transcript: TranscriptConfig,
    #[serde(skip)]
    pub workspace_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: "gemini".to_string(),
            api_key: String::new(),
            base_url: None,
            model: "gemini-2.5-flash".to_string(),
            temperature: 1.0,
            max_rounds: DEFAULT_MAX_ROUNDS,
            parallel_tool_calls: false,
            system_instruction: None,
            transcript: TranscriptConfig::default(),
            workspace_dir: get_orbit_dir().join("workspace"),
        }
    }
}

pub fn get_orbit_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(ORBIT_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_orbit_dir().join("config.toml")
}

pub fn ensure_orbit_dir() -> Result<PathBuf> {
    let orbit_dir = get_orbit_dir();

    if !orbit_dir.exists() {
        std::fs::create_dir_all(&orbit_dir).with_context(|| {
            format!("Failed to create orbit directory at {}", orbit_dir.display())
        })?;
    }

    Ok(orbit_dir)
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path())
}

pub fn load_config_from(config_path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!("Config file not found. Run 'orbit onboard' to set up your configuration.")
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.workspace_dir = get_orbit_dir().join("workspace");

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_orbit_dir()?;
    save_config_to(config, &get_config_path())
}

pub fn save_config_to(config: &Config, config_path: &Path) -> Result<()> {
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}
