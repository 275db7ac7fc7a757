pub mod error;
pub mod logger;
pub mod types;

use analytics::engine::AnalyticsEngine;
use analytics::types::PerformanceReport;
use chrono::{DateTime, TimeZone, Utc};
use core_types::{Action, MarketBar, Position, Side};
use risk::{AccountRiskManager, PositionSizer, RiskManager, RiskSettings, SizerSettings};
use rust_decimal::Decimal;
use strategies::Strategy;
use tracing::{debug, info};

pub use error::{Error, Result};
pub use logger::TradeLogger;
pub use types::BacktestResult;

/// Maximum number of bars preceding the current one handed to the strategy.
const BAR_HISTORY_SIZE: usize = 100;

/// The main engine for running historical backtests.
///
/// Each bar flows through the same pipeline: the strategy proposes a signal,
/// the risk manager either grants a risk budget or vetoes the bar, the sizer
/// converts the budget into a quantity, and the engine applies the resulting
/// transition to its single long-only position slot.
pub struct Backtester {
    /// A single strategy instance to test.
    pub strategy: Box<dyn Strategy + Send>,
    /// The risk manager instance.
    pub risk_manager: Box<dyn RiskManager + Send>,
    /// The position sizer applied to approved signals.
    pub sizer: PositionSizer,
    logger: TradeLogger,
}

impl Backtester {
    pub fn new(
        strategy: Box<dyn Strategy + Send>,
        risk_manager: Box<dyn RiskManager + Send>,
        sizer: PositionSizer,
    ) -> Self {
        Self {
            strategy,
            risk_manager,
            sizer,
            logger: TradeLogger::new(),
        }
    }

    /// Runs the simulation over `bars`, restricted to `[start, end]`.
    ///
    /// `bars` must be sorted by timestamp; the run is fully deterministic, so
    /// replaying the same input yields an identical result.
    pub fn run(
        &mut self,
        bars: &[MarketBar],
        initial_capital: Decimal,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BacktestResult> {
        if bars.is_empty() {
            return Err(Error::EmptyHistory);
        }
        if initial_capital <= Decimal::ZERO {
            return Err(Error::InvalidCapital(initial_capital));
        }
        if start > end {
            return Err(Error::InvalidDateRange { start, end });
        }
        if let Some(index) = bars.windows(2).position(|w| w[1].timestamp < w[0].timestamp) {
            return Err(Error::OutOfOrderBar { index: index + 1 });
        }

        // The bars are sorted, so the date range selects a contiguous slice.
        let start_ms = start.timestamp_millis();
        let end_ms = end.timestamp_millis();
        let lo = bars.partition_point(|bar| bar.timestamp < start_ms);
        let hi = bars.partition_point(|bar| bar.timestamp <= end_ms);
        let filtered = &bars[lo..hi];

        self.logger = TradeLogger::new();
        self.logger.record_equity(start, initial_capital);

        let mut capital = initial_capital;
        let mut open_position: Option<Position> = None;

        info!(
            strategy = self.strategy.name(),
            risk_manager = self.risk_manager.name(),
            bars = filtered.len(),
            %start,
            %end,
            "Starting backtest run."
        );

        for i in 0..filtered.len() {
            let bar = &filtered[i];
            let window = &filtered[i.saturating_sub(BAR_HISTORY_SIZE)..=i];

            // --- 1. Assess Strategy ---
            let signal = self.strategy.analyze(window)?;

            // --- 2. Evaluate Signal with Risk Manager ---
            // The manager sees every bar, Hold included, so its per-day and
            // drawdown state tracks the whole run.
            let risk_amount = match self.risk_manager.evaluate(
                capital,
                &signal,
                open_position.as_ref(),
                window,
            ) {
                Ok(risk_amount) => risk_amount,
                Err(risk::Error::Vetoed { reason }) => {
                    debug!(
                        timestamp = bar.timestamp,
                        action = ?signal.action,
                        %reason,
                        "Risk manager vetoed the signal."
                    );
                    continue;
                }
                Err(e) => return Err(Error::Risk(e)),
            };

            // --- 3. Size and Apply the Transition ---
            let quantity = self.sizer.size(capital, risk_amount, bar.price);
            match (signal.action, open_position.take()) {
                (Action::Buy, None) => {
                    open_position = Some(Position {
                        side: Side::Long,
                        entry_price: bar.price,
                        entry_time: bar.timestamp,
                        quantity,
                    });
                    info!(
                        timestamp = bar.timestamp,
                        price = %bar.price,
                        %quantity,
                        "Opened long position."
                    );
                }
                (Action::Sell, Some(position)) => {
                    let pnl = self.logger.record_trade(&position, bar.price, bar.timestamp);
                    capital += pnl;
                    self.logger
                        .record_equity(Utc.timestamp_millis_opt(bar.timestamp).unwrap(), capital);
                    info!(
                        timestamp = bar.timestamp,
                        exit_price = %bar.price,
                        %pnl,
                        %capital,
                        "Closed long position."
                    );
                }
                // Buy while in a position and Sell while flat are no-ops.
                (_, position) => open_position = position,
            }
        }

        if let Some(position) = &open_position {
            info!(
                entry_time = position.entry_time,
                entry_price = %position.entry_price,
                "Position still open at the end of the run; excluded from the trade ledger."
            );
        }

        info!(
            trades = self.logger.trades.len(),
            final_capital = %capital,
            "Backtest finished."
        );

        // --- Analytics Calculation ---
        let report = AnalyticsEngine::new().calculate(&self.logger.trades, &self.logger.equity_curve);

        Ok(BacktestResult {
            report,
            trades: self.logger.trades.clone(),
            equity_curve: self.logger.equity_curve.clone(),
        })
    }
}

/// Wires the standard pipeline together and runs it once.
///
/// This is the entry point the application uses: an `AccountRiskManager` and a
/// `PositionSizer` are built from their settings, seeded with the same initial
/// capital the simulation starts from.
pub fn run_backtest(
    bars: &[MarketBar],
    initial_capital: Decimal,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    strategy: Box<dyn Strategy + Send>,
    risk_settings: RiskSettings,
    sizer_settings: SizerSettings,
) -> Result<BacktestResult> {
    if initial_capital <= Decimal::ZERO {
        return Err(Error::InvalidCapital(initial_capital));
    }
    let risk_manager = AccountRiskManager::new(initial_capital, risk_settings)?;
    let sizer = PositionSizer::new(sizer_settings)?;
    let mut backtester = Backtester::new(strategy, Box::new(risk_manager), sizer);
    backtester.run(bars, initial_capital, start, end)
}

/// Helper function to print the performance report in a readable format.
pub fn print_report(report: &PerformanceReport) {
    println!("\n--- Backtest Performance Report ---");
    println!("-----------------------------------");
    println!("Net P&L:         ${:.2}", report.net_pnl);
    println!("Total Return:    {:.2}%", report.total_return_percentage);
    println!("Max Drawdown:    {:.2}%", report.max_drawdown * 100.0);
    println!("Sharpe Ratio:    {}", format_ratio(report.sharpe_ratio, 3));
    println!("Profit Factor:   {}", format_ratio(report.profit_factor, 2));
    println!("Win Rate:        {}", format_percent(report.win_rate));
    println!("Total Trades:    {}", report.total_trades);
    println!("-----------------------------------");
}

fn format_ratio(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:.precision$}")
    }
}

fn format_percent(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}%", value * 100.0)
    }
}
