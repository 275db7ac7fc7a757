// In crates/risk/src/account_manager.rs

use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone, Utc};
use core_types::{MarketBar, Position, Signal};
use num_traits::cast::ToPrimitive;
use rust_decimal::Decimal;

use crate::types::RiskSettings;
use crate::{Error, Result, RiskManager};

/// Number of trailing observations feeding the volatility estimate.
const VOLATILITY_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy)]
struct DayStats {
    start_equity: Decimal,
    current_equity: Decimal,
}

/// Account-level risk manager.
///
/// Every evaluation first folds the current equity into the per-day stats and
/// the running drawdown, then applies the gates in a fixed order: daily loss,
/// account drawdown, and finally the volatility-scaled risk budget. The
/// drawdown gate is monotonic: once the account has breached `max_drawdown`
/// from its starting equity, every later evaluation in the run is vetoed.
#[derive(Debug)]
pub struct AccountRiskManager {
    /// The configuration for this risk manager instance.
    settings: RiskSettings,
    /// Drawdown baseline. Fixed at construction; drawdown is measured from
    /// starting equity, not from a running peak.
    total_equity: Decimal,
    daily_stats: HashMap<NaiveDate, DayStats>,
    /// Worst drawdown fraction observed so far.
    max_drawdown_reached: f64,
}

impl AccountRiskManager {
    /// Creates a new `AccountRiskManager` instance from its settings.
    pub fn new(initial_equity: Decimal, settings: RiskSettings) -> Result<Self> {
        if initial_equity <= Decimal::ZERO {
            return Err(Error::InvalidParameters(format!(
                "initial equity must be positive, got {initial_equity}"
            )));
        }
        for (name, value) in [
            ("max_position_size", settings.max_position_size),
            ("max_drawdown", settings.max_drawdown),
            ("max_daily_loss", settings.max_daily_loss),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::InvalidParameters(format!(
                    "{name} must be a fraction in (0, 1], got {value}"
                )));
            }
        }

        Ok(Self {
            settings,
            total_equity: initial_equity,
            daily_stats: HashMap::new(),
            max_drawdown_reached: 0.0,
        })
    }

    fn update_equity(&mut self, day: NaiveDate, current_equity: Decimal) {
        let stats = self.daily_stats.entry(day).or_insert(DayStats {
            start_equity: current_equity,
            current_equity,
        });
        stats.current_equity = current_equity;

        let drawdown = ((self.total_equity - current_equity) / self.total_equity)
            .to_f64()
            .unwrap_or(0.0);
        if drawdown > self.max_drawdown_reached {
            self.max_drawdown_reached = drawdown;
        }
    }

    fn check_daily_loss(&self, day: NaiveDate, current_equity: Decimal) -> Result<()> {
        let Some(stats) = self.daily_stats.get(&day) else {
            return Ok(());
        };
        if stats.start_equity == Decimal::ZERO {
            return Ok(());
        }
        let daily_return = ((current_equity - stats.start_equity) / stats.start_equity)
            .to_f64()
            .unwrap_or(0.0);
        if daily_return <= -self.settings.max_daily_loss {
            return Err(Error::Vetoed {
                reason: "Daily loss limit reached".to_string(),
            });
        }
        Ok(())
    }

    fn check_drawdown(&self) -> Result<()> {
        if self.max_drawdown_reached >= self.settings.max_drawdown {
            return Err(Error::Vetoed {
                reason: "Maximum drawdown reached".to_string(),
            });
        }
        Ok(())
    }
}

impl RiskManager for AccountRiskManager {
    fn name(&self) -> &'static str {
        "AccountRiskManager"
    }

    fn evaluate(
        &mut self,
        capital: Decimal,
        signal: &Signal,
        _open_position: Option<&Position>,
        window: &[MarketBar],
    ) -> Result<f64> {
        // Days are keyed by the UTC calendar date of the evaluated signal, so
        // a replay of the same input produces the same day buckets.
        let day = Utc
            .timestamp_millis_opt(signal.timestamp)
            .unwrap()
            .date_naive();

        self.update_equity(day, capital);
        self.check_daily_loss(day, capital)?;
        self.check_drawdown()?;

        let volatility = volatility(window);
        let risk_amount =
            self.settings.max_position_size * signal.confidence * (1.0 - volatility);

        // The risk fraction is compared against the equity-scaled cap as-is.
        let cap = capital.to_f64().unwrap_or(0.0) * self.settings.max_position_size;
        if risk_amount > cap {
            return Err(Error::Vetoed {
                reason: "Position size exceeds limit".to_string(),
            });
        }

        Ok(risk_amount)
    }
}

/// Root-mean-square of simple returns over the trailing window, capped at 1.
///
/// The first observation contributes a zero return, so the denominator is the
/// length of the trailing slice rather than the number of price pairs.
fn volatility(window: &[MarketBar]) -> f64 {
    let start = window.len().saturating_sub(VOLATILITY_WINDOW);
    let tail = &window[start..];
    if tail.is_empty() {
        return 0.0;
    }

    let mut sum_sq = 0.0;
    for pair in tail.windows(2) {
        let prev = pair[0].price.to_f64().unwrap_or(0.0);
        let curr = pair[1].price.to_f64().unwrap_or(0.0);
        if prev != 0.0 {
            let simple_return = (curr - prev) / prev;
            sum_sq += simple_return * simple_return;
        }
    }

    (sum_sq / tail.len() as f64).sqrt().min(1.0)
}
