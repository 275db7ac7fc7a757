// In crates/backtester/tests/engine_scenarios.rs

use backtester::{Backtester, Error, run_backtest};
use chrono::{DateTime, TimeZone, Utc};
use core_types::{Action, MarketBar, Position, Side, Signal};
use risk::{PositionSizer, RiskManager, RiskSettings, SizerSettings};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strategies::Strategy;

const MINUTE_MS: i64 = 60_000;
const DAY_MS: i64 = 86_400_000;

/// Emits a fixed sequence of actions, one per call, then holds forever.
struct ScriptedStrategy {
    script: Vec<Action>,
    cursor: usize,
}

impl ScriptedStrategy {
    fn new(script: &[Action]) -> Self {
        Self {
            script: script.to_vec(),
            cursor: 0,
        }
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    fn analyze(&mut self, window: &[MarketBar]) -> strategies::Result<Signal> {
        let bar = window.last().expect("the engine never passes an empty window");
        let action = self.script.get(self.cursor).copied().unwrap_or(Action::Hold);
        self.cursor += 1;
        Ok(match action {
            Action::Buy => Signal::buy(1.0, bar.price, bar.timestamp),
            Action::Sell => Signal::sell(1.0, bar.price, bar.timestamp),
            Action::Hold => Signal::hold(bar.price, bar.timestamp),
        })
    }
}

/// Fails on the first call, standing in for a broken indicator.
struct FailingStrategy;

impl Strategy for FailingStrategy {
    fn name(&self) -> &'static str {
        "Failing"
    }

    fn analyze(&mut self, _window: &[MarketBar]) -> strategies::Result<Signal> {
        Err(strategies::Error::Analysis("indicator failure".to_string()))
    }
}

/// Grants the same risk budget to every signal.
struct FixedBudget(f64);

impl RiskManager for FixedBudget {
    fn name(&self) -> &'static str {
        "FixedBudget"
    }

    fn evaluate(
        &mut self,
        _capital: Decimal,
        _signal: &Signal,
        _open_position: Option<&Position>,
        _window: &[MarketBar],
    ) -> risk::Result<f64> {
        Ok(self.0)
    }
}

/// Rejects every signal.
struct VetoAll;

impl RiskManager for VetoAll {
    fn name(&self) -> &'static str {
        "VetoAll"
    }

    fn evaluate(
        &mut self,
        _capital: Decimal,
        _signal: &Signal,
        _open_position: Option<&Position>,
        _window: &[MarketBar],
    ) -> risk::Result<f64> {
        Err(risk::Error::Vetoed {
            reason: "All signals blocked".to_string(),
        })
    }
}

fn ts(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

fn minute_bars(prices: &[Decimal]) -> Vec<MarketBar> {
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| MarketBar {
            timestamp: i as i64 * MINUTE_MS,
            price: *price,
        })
        .collect()
}

fn daily_bars(prices: &[Decimal]) -> Vec<MarketBar> {
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| MarketBar {
            timestamp: i as i64 * DAY_MS,
            price: *price,
        })
        .collect()
}

/// A sizer whose minimum bound is small enough to leave tiny risk-based
/// quantities unclamped.
fn permissive_sizer() -> PositionSizer {
    PositionSizer::new(SizerSettings {
        min_position_size: 0.0001,
        ..SizerSettings::default()
    })
    .unwrap()
}

fn engine(script: &[Action], risk_manager: Box<dyn RiskManager + Send>) -> Backtester {
    Backtester::new(
        Box::new(ScriptedStrategy::new(script)),
        risk_manager,
        permissive_sizer(),
    )
}

#[test]
fn empty_history_is_rejected() {
    let mut backtester = engine(&[], Box::new(FixedBudget(0.02)));
    let err = backtester
        .run(&[], dec!(10_000), ts(0), ts(MINUTE_MS))
        .unwrap_err();
    assert!(matches!(err, Error::EmptyHistory));
}

#[test]
fn non_positive_capital_is_rejected() {
    let bars = minute_bars(&[dec!(100)]);
    let mut backtester = engine(&[], Box::new(FixedBudget(0.02)));
    let err = backtester
        .run(&bars, dec!(0), ts(0), ts(MINUTE_MS))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCapital(_)));
}

#[test]
fn inverted_date_range_is_rejected() {
    let bars = minute_bars(&[dec!(100)]);
    let mut backtester = engine(&[], Box::new(FixedBudget(0.02)));
    let err = backtester
        .run(&bars, dec!(10_000), ts(MINUTE_MS), ts(0))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDateRange { .. }));
}

#[test]
fn out_of_order_bars_report_the_offending_index() {
    let bars = vec![
        MarketBar {
            timestamp: 0,
            price: dec!(100),
        },
        MarketBar {
            timestamp: 100,
            price: dec!(101),
        },
        MarketBar {
            timestamp: 50,
            price: dec!(102),
        },
    ];
    let mut backtester = engine(&[], Box::new(FixedBudget(0.02)));
    let err = backtester
        .run(&bars, dec!(10_000), ts(0), ts(MINUTE_MS))
        .unwrap_err();
    assert!(matches!(err, Error::OutOfOrderBar { index: 2 }));
}

#[test]
fn scripted_round_trip_produces_one_trade_and_its_equity_point() {
    let bars = minute_bars(&[
        dec!(100),
        dec!(99),
        dec!(98),
        dec!(100),
        dec!(103),
        dec!(105),
        dec!(102),
    ]);
    let script = [
        Action::Hold,
        Action::Hold,
        Action::Hold,
        Action::Buy,
        Action::Hold,
        Action::Sell,
        Action::Hold,
    ];
    let mut backtester = engine(&script, Box::new(FixedBudget(0.02)));
    let result = backtester
        .run(&bars, dec!(10_000), ts(0), ts(6 * MINUTE_MS))
        .unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.side, Side::Long);
    assert_eq!(trade.entry_time, ts(3 * MINUTE_MS));
    assert_eq!(trade.exit_time, ts(5 * MINUTE_MS));
    assert_eq!(trade.entry_price, dec!(100));
    assert_eq!(trade.exit_price, dec!(105));
    // 10_000 * 0.02 / 100 = 2 units.
    assert_eq!(trade.quantity, dec!(2));
    assert_eq!(trade.pnl, dec!(10));

    assert_eq!(result.equity_curve.len(), result.trades.len() + 1);
    assert_eq!(result.equity_curve[0].timestamp, ts(0));
    assert_eq!(result.equity_curve[0].value, dec!(10_000));
    assert_eq!(result.equity_curve[1].timestamp, ts(5 * MINUTE_MS));
    assert_eq!(result.equity_curve[1].value, dec!(10_010));

    assert_eq!(result.report.total_trades, 1);
    assert_eq!(result.report.net_pnl, dec!(10));
    assert_eq!(result.report.win_rate, 1.0);
    assert!(result.report.profit_factor.is_infinite());
    assert!((result.report.total_return_percentage - 0.1).abs() < 1e-9);
}

#[test]
fn date_filter_can_exclude_every_bar() {
    let bars = minute_bars(&[dec!(100), dec!(101), dec!(102)]);
    let mut backtester = engine(&[Action::Buy], Box::new(FixedBudget(0.02)));
    let result = backtester
        .run(&bars, dec!(10_000), ts(1_000_000_000), ts(2_000_000_000))
        .unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.equity_curve.len(), 1);
    assert_eq!(result.equity_curve[0].value, dec!(10_000));
    assert_eq!(result.report.total_return_percentage, 0.0);
    assert!(result.report.win_rate.is_nan());
    assert!(result.report.sharpe_ratio.is_nan());
}

#[test]
fn position_open_at_the_end_is_left_out_of_the_ledger() {
    let bars = minute_bars(&[dec!(100), dec!(110)]);
    let mut backtester = engine(&[Action::Buy, Action::Hold], Box::new(FixedBudget(0.02)));
    let result = backtester
        .run(&bars, dec!(10_000), ts(0), ts(MINUTE_MS))
        .unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.equity_curve.len(), 1);
    assert_eq!(result.report.net_pnl, dec!(0));
}

#[test]
fn redundant_buys_and_sells_are_ignored() {
    let bars = minute_bars(&[dec!(100), dec!(101), dec!(102), dec!(103)]);
    let script = [Action::Buy, Action::Buy, Action::Sell, Action::Sell];
    let mut backtester = engine(&script, Box::new(FixedBudget(0.02)));
    let result = backtester
        .run(&bars, dec!(10_000), ts(0), ts(3 * MINUTE_MS))
        .unwrap();

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].entry_price, dec!(100));
    assert_eq!(result.trades[0].exit_price, dec!(102));
    assert_eq!(result.trades[0].pnl, dec!(4));
}

#[test]
fn veto_blocks_every_transition() {
    let bars = minute_bars(&[dec!(100), dec!(101), dec!(102)]);
    let script = [Action::Buy, Action::Sell, Action::Buy];
    let mut backtester = engine(&script, Box::new(VetoAll));
    let result = backtester
        .run(&bars, dec!(10_000), ts(0), ts(2 * MINUTE_MS))
        .unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.equity_curve.len(), 1);
}

#[test]
fn strategy_failure_aborts_the_run() {
    let bars = minute_bars(&[dec!(100), dec!(101)]);
    let mut backtester = Backtester::new(
        Box::new(FailingStrategy),
        Box::new(FixedBudget(0.02)),
        permissive_sizer(),
    );
    let err = backtester
        .run(&bars, dec!(10_000), ts(0), ts(MINUTE_MS))
        .unwrap_err();
    assert!(matches!(err, Error::Strategy(_)));
}

#[test]
fn identical_inputs_produce_identical_results() {
    let bars = minute_bars(&[dec!(100), dec!(99), dec!(103), dec!(101), dec!(104)]);
    let script = [
        Action::Buy,
        Action::Hold,
        Action::Sell,
        Action::Buy,
        Action::Sell,
    ];

    let run = || {
        engine(&script, Box::new(FixedBudget(0.02)))
            .run(&bars, dec!(10_000), ts(0), ts(4 * MINUTE_MS))
            .unwrap()
    };
    let first = run();
    let second = run();

    assert_eq!(first.trades, second.trades);
    assert_eq!(first.equity_curve, second.equity_curve);
    assert_eq!(first.report.net_pnl, second.report.net_pnl);
}

#[test]
fn breached_drawdown_freezes_the_rest_of_the_run() {
    // The 50% collapse on the close breaches the default 20% drawdown limit,
    // so the later entry and exit are both vetoed.
    let bars = daily_bars(&[dec!(100), dec!(100), dec!(50), dec!(50), dec!(100)]);
    let script = [
        Action::Buy,
        Action::Hold,
        Action::Sell,
        Action::Buy,
        Action::Sell,
    ];

    let result = run_backtest(
        &bars,
        dec!(10_000),
        ts(0),
        ts(4 * DAY_MS),
        Box::new(ScriptedStrategy::new(&script)),
        RiskSettings::default(),
        SizerSettings::default(),
    )
    .unwrap();

    assert_eq!(result.trades.len(), 1);
    // Risk-based entry: 10_000 * 0.1 / 100 = 10, lifted to the 1% minimum of
    // 100 units, then closed at half the entry price.
    assert_eq!(result.trades[0].quantity, dec!(100));
    assert_eq!(result.trades[0].pnl, dec!(-5_000));
    assert_eq!(result.equity_curve.len(), 2);
    assert_eq!(result.equity_curve[1].value, dec!(5_000));
    assert_eq!(result.report.net_pnl, dec!(-5_000));
}
