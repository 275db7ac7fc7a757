// In crates/app-config/src/types.rs

use serde::Deserialize;

use risk::types::{RiskSettings, SizerSettings};
use strategies::types::{GridSettings, MacdSettings};

// Define the container for all strategy settings
#[derive(Deserialize, Debug, Default, Clone)]
pub struct StrategySettings {
    // Each strategy has its own optional settings block; the first populated
    // block is the one a run uses.
    pub grid: Option<GridSettings>,
    pub macd: Option<MacdSettings>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,

    #[serde(default)]
    pub strategies: StrategySettings,

    /// Account-level risk limits.
    #[serde(default)]
    pub risk: RiskSettings,

    /// Position sizing policy.
    #[serde(default)]
    pub sizer: SizerSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,

    /// Rayon worker count for parameter sweeps.
    pub sweep_cores: u32,
}
