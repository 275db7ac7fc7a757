// In app/src/sweep.rs

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use analytics::types::PerformanceReport;
use anyhow::{Context, Result};
use app_config::Settings;
use backtester::run_backtest;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strategies::types::{GridSettings, MacdSettings};
use strategies::{GridStrategy, MacdStrategy, Strategy};
use toml::Value;

use crate::data;

// --- Structs for deserializing sweep.toml ---

#[derive(Deserialize, Debug)]
pub struct SweepConfig {
    pub job: JobSettings,

    // Using `flatten` tells serde to collect all other top-level tables
    // from the TOML file into this HashMap. The key will be the table name
    // (e.g., "grid_params") and the value will be the raw TOML table.
    #[serde(flatten)]
    pub strategy_params: HashMap<String, Value>,
}

#[derive(Deserialize, Debug)]
pub struct JobSettings {
    pub name: String,
    pub data: String,
    pub start_date: String,
    pub end_date: String,
    pub capital: Decimal,
    pub strategy_to_sweep: String,
}

/// One fully-expanded parameter set for the strategy under test.
#[derive(Debug, Clone)]
pub enum ParamSet {
    Grid(GridSettings),
    Macd(MacdSettings),
}

impl ParamSet {
    fn build(&self) -> strategies::Result<Box<dyn Strategy + Send>> {
        Ok(match self {
            ParamSet::Grid(settings) => Box::new(GridStrategy::new(settings.clone())?),
            ParamSet::Macd(settings) => Box::new(MacdStrategy::new(settings.clone())?),
        })
    }

    fn as_json(&self) -> serde_json::Value {
        match self {
            ParamSet::Grid(settings) => serde_json::to_value(settings).unwrap_or_default(),
            ParamSet::Macd(settings) => serde_json::to_value(settings).unwrap_or_default(),
        }
    }
}

/// What one sweep worker produces: the parameters it ran and their report.
#[derive(Debug, Serialize)]
pub struct SweepOutcome {
    pub parameters: serde_json::Value,
    pub report: PerformanceReport,
}

// --- Public API for the Sweep Module ---

pub fn load_sweep_config() -> Result<SweepConfig> {
    let content =
        fs::read_to_string("config/sweep.toml").context("Failed to read config/sweep.toml")?;
    toml::from_str(&content).context("Failed to parse sweep.toml")
}

pub fn generate_parameter_sets(config: &SweepConfig) -> Result<Vec<ParamSet>> {
    // 1. Dynamically find the correct parameter table to use.
    let strategy_key = format!("{}_params", config.job.strategy_to_sweep);

    let params_value = config.strategy_params.get(&strategy_key).ok_or_else(|| {
        anyhow::anyhow!(
            "Parameter table '{}' not found in sweep.toml. Available tables are: {:?}",
            strategy_key,
            config.strategy_params.keys()
        )
    })?;

    let params_table = params_value
        .as_table()
        .ok_or_else(|| anyhow::anyhow!("'{}' must be a TOML table.", strategy_key))?;
    if params_table.is_empty() {
        anyhow::bail!("'{}' has no parameters to expand.", strategy_key);
    }

    // 2. Expand every parameter into its list of candidate values.
    let mut keys = vec![];
    let mut value_lists = vec![];
    for (key, value) in params_table.iter() {
        keys.push(key.clone());
        value_lists.push(expand_value(value));
    }

    // 3. Build the cartesian product with an odometer over the value lists.
    let mut tables = vec![];
    let mut indices = vec![0; value_lists.len()];
    loop {
        let mut table = toml::map::Map::new();
        for (i, key) in keys.iter().enumerate() {
            table.insert(key.clone(), value_lists[i][indices[i]].clone());
        }
        tables.push(table);

        let mut idx = value_lists.len();
        while idx > 0 {
            idx -= 1;
            indices[idx] += 1;
            if indices[idx] < value_lists[idx].len() {
                break;
            }
            indices[idx] = 0;
        }
        if idx == 0 && indices[0] == 0 {
            break;
        }
    }

    // 4. Convert each combination into the typed settings of the strategy.
    let mut sets = vec![];
    for table in tables {
        let set = match config.job.strategy_to_sweep.as_str() {
            "grid" => ParamSet::Grid(Value::Table(table).try_into()?),
            "macd" => ParamSet::Macd(Value::Table(table).try_into()?),
            other => anyhow::bail!("Unknown strategy '{}' in sweep config", other),
        };
        sets.push(set);
    }
    Ok(sets)
}

/// The main parallel engine for running a sweep job.
pub fn run_sweep(
    settings: &Settings,
    config: &SweepConfig,
    param_sets: Vec<ParamSet>,
) -> Result<Vec<SweepOutcome>> {
    tracing::info!(cores = settings.app.sweep_cores, "Configuring Rayon thread pool.");
    ThreadPoolBuilder::new()
        .num_threads(settings.app.sweep_cores as usize)
        .build_global()
        .context("Failed to build Rayon thread pool")?;

    let start = data::parse_date(&config.job.start_date, true)?;
    let end = data::parse_date(&config.job.end_date, false)?;
    // The bars are loaded once and shared read-only; every worker builds its
    // own strategy, risk manager and sizer.
    let bars = Arc::new(data::load_bars(Path::new(&config.job.data))?);
    tracing::info!(
        bars = bars.len(),
        sets = param_sets.len(),
        "Starting sweep runs."
    );

    let capital = config.job.capital;
    let risk_settings = settings.risk.clone();
    let sizer_settings = settings.sizer.clone();

    let outcomes: Vec<SweepOutcome> = param_sets
        .par_iter()
        .filter_map(|params| {
            let strategy = match params.build() {
                Ok(strategy) => strategy,
                Err(e) => {
                    tracing::error!(error = %e, "Skipping an invalid parameter set.");
                    return None;
                }
            };
            match run_backtest(
                &bars,
                capital,
                start,
                end,
                strategy,
                risk_settings.clone(),
                sizer_settings.clone(),
            ) {
                Ok(result) => Some(SweepOutcome {
                    parameters: params.as_json(),
                    report: result.report,
                }),
                Err(e) => {
                    tracing::error!(error = %e, "A single backtest run failed.");
                    None
                }
            }
        })
        .collect();

    Ok(outcomes)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        _ => None,
    }
}

/// Expands a `{ start, end, step }` table into its inclusive range; any other
/// value passes through as a single fixed candidate. A range whose bounds and
/// step are all integers yields integer values, so integer-typed settings
/// fields deserialize cleanly.
fn expand_value(value: &Value) -> Vec<Value> {
    if let Some(table) = value.as_table() {
        if let (Some(start), Some(end)) = (
            table.get("start").and_then(as_number),
            table.get("end").and_then(as_number),
        ) {
            let step = table.get("step").and_then(as_number).unwrap_or(1.0);
            let integral = table.values().all(|v| matches!(v, Value::Integer(_)));

            let mut values = vec![];
            let mut current = start;
            while current <= end + 1e-8 {
                values.push(if integral {
                    Value::Integer(current.round() as i64)
                } else {
                    Value::Float(current)
                });
                current += step;
            }
            return values;
        }
    }
    vec![value.clone()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(raw: &str) -> SweepConfig {
        toml::from_str(raw).unwrap()
    }

    #[test]
    fn ranges_expand_into_the_cartesian_product() {
        let config = config(
            r#"
            [job]
            name = "test"
            data = "data/bars.csv"
            start_date = "2024-01-01"
            end_date = "2024-01-31"
            capital = "10000"
            strategy_to_sweep = "macd"

            [macd_params]
            fast_period = { start = 8, end = 12, step = 2 }
            slow_period = 26
            signal_period = 9
            confidence = 0.8
        "#,
        );

        let sets = generate_parameter_sets(&config).unwrap();
        // fast_period in {8, 10, 12}, everything else fixed.
        assert_eq!(sets.len(), 3);
        let fasts: Vec<u32> = sets
            .iter()
            .map(|set| match set {
                ParamSet::Macd(settings) => settings.fast_period,
                ParamSet::Grid(_) => panic!("expected macd parameter sets"),
            })
            .collect();
        assert_eq!(fasts, vec![8, 10, 12]);
    }

    #[test]
    fn float_ranges_stay_floats() {
        let values = expand_value(
            &toml::from_str::<Value>("v = { start = 0.5, end = 1.5, step = 0.5 }").unwrap()["v"],
        );
        assert_eq!(values.len(), 3);
        assert!(matches!(values[0], Value::Float(_)));
    }

    #[test]
    fn missing_parameter_table_is_an_error() {
        let config = config(
            r#"
            [job]
            name = "test"
            data = "data/bars.csv"
            start_date = "2024-01-01"
            end_date = "2024-01-31"
            capital = "10000"
            strategy_to_sweep = "grid"

            [macd_params]
            fast_period = 12
            slow_period = 26
            signal_period = 9
            confidence = 0.8
        "#,
        );
        assert!(generate_parameter_sets(&config).is_err());
    }
}
