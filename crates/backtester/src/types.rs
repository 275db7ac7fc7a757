// In crates/backtester/src/types.rs

use analytics::types::{EquityPoint, PerformanceReport, Trade};
use serde::Serialize;

/// Everything a finished run produces: the realized trade ledger, the
/// trade-indexed equity curve, and the performance report derived from them.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub report: PerformanceReport,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}
