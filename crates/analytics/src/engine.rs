use crate::types::{EquityPoint, PerformanceReport, Trade};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Trading periods per year used to annualize the Sharpe ratio.
const ANNUALIZATION_PERIODS: f64 = 252.0;

/// The engine responsible for calculating performance metrics from trade data.
#[derive(Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates a full performance report from a trade ledger and an equity
    /// curve.
    pub fn calculate(&self, trades: &[Trade], equity_curve: &[EquityPoint]) -> PerformanceReport {
        let mut report = PerformanceReport::new();

        // 1. Trade counts and net P&L
        report.total_trades = trades.len() as u32;
        report.net_pnl = trades.iter().map(|t| t.pnl).sum();

        // 2. Total return, first equity point to last
        if let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) {
            if first.value > dec!(0) {
                report.total_return_percentage = ((last.value - first.value) / first.value)
                    .to_f64()
                    .unwrap_or(0.0)
                    * 100.0;
            }
        }

        // 3. Win Rate & Profit Factor
        let wins = trades.iter().filter(|t| t.pnl > dec!(0)).count();
        report.win_rate = wins as f64 / trades.len() as f64;

        let gross_profit: Decimal = trades.iter().filter(|t| t.pnl > dec!(0)).map(|t| t.pnl).sum();
        let gross_loss: Decimal = trades
            .iter()
            .filter(|t| t.pnl < dec!(0))
            .map(|t| t.pnl)
            .sum::<Decimal>()
            .abs();
        report.profit_factor = if gross_loss > dec!(0) {
            (gross_profit / gross_loss).to_f64().unwrap_or(0.0)
        } else if gross_profit > dec!(0) {
            f64::INFINITY // Pure profit
        } else {
            f64::NAN // No winners and no losers
        };

        // 4. Max Drawdown
        report.max_drawdown = max_drawdown(equity_curve);

        // 5. Sharpe Ratio
        report.sharpe_ratio = sharpe_ratio(equity_curve);

        report
    }
}

/// Largest peak-to-trough decline as a fraction of the running peak.
fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = match equity_curve.first() {
        Some(point) => point.value,
        None => return 0.0,
    };
    let mut max_drawdown = 0.0f64;

    for point in equity_curve {
        if point.value > peak {
            peak = point.value;
        }
        if peak > dec!(0) {
            let drawdown = ((peak - point.value) / peak).to_f64().unwrap_or(0.0);
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }
    }
    max_drawdown
}

/// Annualized ratio of mean to standard deviation of point-to-point returns.
///
/// Fewer than two equity points, or a curve with zero deviation, has no
/// defined ratio and reports NaN.
fn sharpe_ratio(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 {
        return f64::NAN;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            if w[0].value.is_zero() {
                0.0
            } else {
                ((w[1].value - w[0].value) / w[0].value)
                    .to_f64()
                    .unwrap_or(0.0)
            }
        })
        .collect();

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (*r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return f64::NAN;
    }
    mean / std_dev * ANNUALIZATION_PERIODS.sqrt()
}
