use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{platform, schedule};


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cron schedule for the monitor worker
    #[serde(default = "default_cron")]
    pub cron: String,

    /// Repository to publish release images to (e.g., ghcr.io/owner/smsb)
    pub repository: Option<String>,

    /// Branch that is allowed to publish
    #[serde(default = "default_publish_branch")]
    pub publish_branch: String,

    /// Target platforms for the release build
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,

    /// Path to the project the release builds
    #[serde(default = "default_project_path")]
    pub project_path: PathBuf,
}

fn default_cron() -> String {
    schedule::DEFAULT_CRON.to_string()
}

fn default_publish_branch() -> String {
    "main".to_string()
}

fn default_platforms() -> Vec<String> {
    platform::DEFAULTS.iter().map(|p| p.to_string()).collect()
}

fn default_project_path() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cron: default_cron(),
            repository: None,
            publish_branch: default_publish_branch(),
            platforms: default_platforms(),
            project_path: default_project_path(),
        }
    }
}

impl Config {
    /// Load the config file if present, then apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_file()?;

        if let Ok(cron) = std::env::var("CRONJOB") {
            config.cron = cron;
        }
        if let Ok(repo) = std::env::var("SMSB_REPO") {
            config.repository = Some(repo);
        }
        if let Ok(branch) = std::env::var("SMSB_PUBLISH_BRANCH") {
            config.publish_branch = branch;
        }

        Ok(config)
    }

    fn load_file() -> anyhow::Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("smsb").join("config.toml");
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)?;
                let config: Config = toml::from_str(&content)?;
                return Ok(config);
            }
        }
        Ok(Config::default())
    }
}
