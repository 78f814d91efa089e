use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueConfig {
    pub views_per_unit: f64,
    pub video_rate: f64,
    pub image_rate: f64,
    pub text_rate: f64,
    pub account_min_views: u64,
    pub account_min_likes: u64,
    pub post_min_views: u64,
    pub post_min_likes: u64,
}

impl Default for RevenueConfig {
    fn default() -> Self {
        Self {
            views_per_unit: 1250.0,
            video_rate: 25.0,
            image_rate: 15.0,
            text_rate: 10.0,
            account_min_views: 2000,
            account_min_likes: 25,
            post_min_views: 1000,
            post_min_likes: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub daily_limit: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { daily_limit: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrikeConfig {
    pub window_hours: i64,
    pub lockout_threshold: usize,
}

impl Default for StrikeConfig {
    fn default() -> Self {
        Self {
            window_hours: 48,
            lockout_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalConfig {
    pub fee_rate: f64,
    pub min_amount: f64,
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self {
            fee_rate: 0.05,
            min_amount: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickConfig {
    pub view_interval_secs: u64,
    pub stats_interval_secs: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            view_interval_secs: 5,
            stats_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub revenue: RevenueConfig,
    pub quota: QuotaConfig,
    pub strikes: StrikeConfig,
    pub withdrawals: WithdrawalConfig,
    pub ticks: TickConfig,
    pub store: StoreConfig,
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                toml::from_str(&contents)
                    .map_err(|err| format!("failed to parse config: {}", err))?
            } else {
                EngineConfig::default()
            }
        } else {
            EngineConfig::default()
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config dir: {}", err))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload).map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = env::var("ENGINE_DATA_DIR") {
            if !data_dir.trim().is_empty() {
                self.store.data_dir = PathBuf::from(data_dir);
            }
        }
        if let Ok(seed) = env::var("ENGINE_SEED") {
            if let Ok(value) = seed.parse::<u64>() {
                self.seed = Some(value);
            }
        }
        if let Ok(interval) = env::var("ENGINE_VIEW_TICK_SECS") {
            if let Ok(value) = interval.parse::<u64>() {
                self.ticks.view_interval_secs = value.max(1);
            }
        }
        if let Ok(interval) = env::var("ENGINE_STATS_TICK_SECS") {
            if let Ok(value) = interval.parse::<u64>() {
                self.ticks.stats_interval_secs = value.max(1);
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("ENGINE_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/engine.toml")))
}
