// In app/src/analyzer.rs

use analytics::types::PerformanceReport;
use serde::Serialize;

use crate::sweep::SweepOutcome;

const MINIMUM_TRADES_THRESHOLD: u32 = 30;

#[derive(Debug, Serialize)]
pub struct RankedOutcome {
    pub score: f64,
    pub outcome: SweepOutcome,
}

/// Filters and ranks the outcomes of a sweep job.
pub fn analyze_and_rank_results(outcomes: Vec<SweepOutcome>) -> Vec<RankedOutcome> {
    let total_outcomes = outcomes.len();

    let mut ranked: Vec<RankedOutcome> = outcomes
        .into_iter()
        .filter_map(|outcome| {
            // 1. Filter out runs with too few trades
            if outcome.report.total_trades < MINIMUM_TRADES_THRESHOLD {
                return None;
            }

            // 2. Calculate the score; undefined metrics make a run unrankable
            let score = calculate_score(&outcome.report);
            if !score.is_finite() {
                return None;
            }

            Some(RankedOutcome { score, outcome })
        })
        .collect();

    tracing::info!(
        total_outcomes,
        passing_outcomes = ranked.len(),
        "Finished scoring sweep outcomes."
    );

    // 3. Sort by score in descending order (higher is better)
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    ranked
}

/// The multi-objective scoring function.
/// Higher scores are better.
fn calculate_score(report: &PerformanceReport) -> f64 {
    // Define weights for each metric
    const PROFIT_FACTOR_WEIGHT: f64 = 40.0;
    const SHARPE_RATIO_WEIGHT: f64 = 30.0;
    const MAX_DRAWDOWN_WEIGHT: f64 = -35.0; // Negative weight penalizes drawdown
    const TOTAL_RETURN_WEIGHT: f64 = 15.0;

    // Cap values so an extreme outlier cannot dominate the score.
    let capped_profit_factor = report.profit_factor.min(5.0);
    let capped_sharpe = report.sharpe_ratio.min(5.0);
    let capped_return = (report.total_return_percentage / 100.0).min(5.0);

    (capped_profit_factor * PROFIT_FACTOR_WEIGHT)
        + (capped_sharpe * SHARPE_RATIO_WEIGHT)
        + (report.max_drawdown * MAX_DRAWDOWN_WEIGHT)
        + (capped_return * TOTAL_RETURN_WEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn outcome(trades: u32, profit_factor: f64, sharpe: f64, drawdown: f64) -> SweepOutcome {
        SweepOutcome {
            parameters: serde_json::json!({ "id": trades }),
            report: PerformanceReport {
                total_return_percentage: 10.0,
                net_pnl: dec!(1_000),
                max_drawdown: drawdown,
                sharpe_ratio: sharpe,
                win_rate: 0.6,
                profit_factor,
                total_trades: trades,
            },
        }
    }

    #[test]
    fn thin_ledgers_are_filtered_out() {
        let ranked = analyze_and_rank_results(vec![outcome(5, 2.0, 1.0, 0.1)]);
        assert!(ranked.is_empty());
    }

    #[test]
    fn undefined_metrics_make_a_run_unrankable() {
        let ranked = analyze_and_rank_results(vec![outcome(50, f64::NAN, 1.0, 0.1)]);
        assert!(ranked.is_empty());
    }

    #[test]
    fn better_runs_rank_first() {
        let ranked = analyze_and_rank_results(vec![
            outcome(40, 1.2, 0.5, 0.3),
            outcome(50, 3.0, 2.0, 0.05),
        ]);
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].score > ranked[1].score);
        assert_eq!(ranked[0].outcome.report.total_trades, 50);
    }

    #[test]
    fn infinite_profit_factor_is_capped_not_dominant() {
        let perfect = analyze_and_rank_results(vec![outcome(50, f64::INFINITY, 1.0, 0.1)]);
        let merely_good = analyze_and_rank_results(vec![outcome(50, 5.0, 1.0, 0.1)]);
        assert_eq!(perfect[0].score, merely_good[0].score);
    }
}
