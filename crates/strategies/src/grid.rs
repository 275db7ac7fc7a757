// In crates/strategies/src/grid.rs

use crate::types::GridSettings;
use crate::{Error, Result, Strategy};
use core_types::{MarketBar, Signal};
use num_traits::cast::FromPrimitive;
use rust_decimal::Decimal;

/// A mean-reversion strategy trading a fixed ladder of price levels.
///
/// The ladder is a geometric ladder built once at construction: `grid_count`
/// levels spaced `grid_spacing_percent` apart, centered on `reference_price`.
/// A bar whose price sits materially below the nearest level proposes a buy,
/// materially above proposes a sell, otherwise the strategy holds.
pub struct GridStrategy {
    settings: GridSettings,
    /// Ladder levels, ascending.
    levels: Vec<Decimal>,
    /// `1 - spacing/100`, the lower band multiplier.
    lower_band: Decimal,
    /// `1 + spacing/100`, the upper band multiplier.
    upper_band: Decimal,
}

impl GridStrategy {
    /// Creates a new `GridStrategy` instance from its settings.
    pub fn new(settings: GridSettings) -> Result<Self> {
        if !settings.grid_spacing_percent.is_finite() || settings.grid_spacing_percent <= 0.0 {
            return Err(Error::InvalidSettings(format!(
                "grid_spacing_percent must be a positive number, got {}",
                settings.grid_spacing_percent
            )));
        }
        if settings.reference_price <= Decimal::ZERO {
            return Err(Error::InvalidSettings(format!(
                "reference_price must be positive, got {}",
                settings.reference_price
            )));
        }

        let spacing = settings.grid_spacing_percent / 100.0;
        let lower_band = Decimal::from_f64(1.0 - spacing).ok_or_else(|| {
            Error::InvalidSettings("grid_spacing_percent does not fit a decimal band".into())
        })?;
        let upper_band = Decimal::from_f64(1.0 + spacing).ok_or_else(|| {
            Error::InvalidSettings("grid_spacing_percent does not fit a decimal band".into())
        })?;
        let levels = Self::build_levels(&settings)?;

        Ok(Self {
            settings,
            levels,
            lower_band,
            upper_band,
        })
    }

    fn build_levels(settings: &GridSettings) -> Result<Vec<Decimal>> {
        let ratio = 1.0 + settings.grid_spacing_percent / 100.0;
        let count = settings.grid_count as i32;
        let half = count / 2;

        let mut levels = Vec::with_capacity(settings.grid_count as usize);
        for i in 0..count {
            let factor = Decimal::from_f64(ratio.powi(i - half)).ok_or_else(|| {
                Error::InvalidSettings("grid ladder does not fit a decimal price".into())
            })?;
            levels.push(settings.reference_price * factor);
        }
        Ok(levels)
    }

    /// Nearest ladder level by absolute distance. A tie keeps the lower level.
    fn nearest_level(&self, price: Decimal) -> Option<Decimal> {
        let mut nearest: Option<Decimal> = None;
        for &level in &self.levels {
            match nearest {
                Some(best) if (level - price).abs() >= (best - price).abs() => {}
                _ => nearest = Some(level),
            }
        }
        nearest
    }
}

impl Strategy for GridStrategy {
    fn name(&self) -> &'static str {
        "GridLadder"
    }

    fn analyze(&mut self, window: &[MarketBar]) -> Result<Signal> {
        let bar = window
            .last()
            .ok_or_else(|| Error::Analysis("analyze called with an empty window".into()))?;
        let price = bar.price;

        // An empty ladder can never produce an entry or an exit.
        let Some(nearest) = self.nearest_level(price) else {
            return Ok(Signal::hold(price, bar.timestamp));
        };

        let signal = if price < nearest * self.lower_band {
            Signal::buy(self.settings.confidence, price, bar.timestamp)
        } else if price > nearest * self.upper_band {
            Signal::sell(self.settings.confidence, price, bar.timestamp)
        } else {
            Signal::hold(price, bar.timestamp)
        };
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Action;
    use rust_decimal_macros::dec;

    fn settings(reference: Decimal, spacing: f64, count: u32) -> GridSettings {
        GridSettings {
            reference_price: reference,
            grid_spacing_percent: spacing,
            grid_count: count,
            confidence: 0.7,
        }
    }

    fn bar(timestamp: i64, price: Decimal) -> MarketBar {
        MarketBar { timestamp, price }
    }

    #[test]
    fn ladder_is_geometric_and_ascending() {
        let strategy = GridStrategy::new(settings(dec!(100), 2.0, 10)).unwrap();
        assert_eq!(strategy.levels.len(), 10);
        assert!(strategy.levels.windows(2).all(|w| w[0] < w[1]));
        // Exponents run -5..=4, so the reference price itself is a level.
        assert_eq!(strategy.levels[5], dec!(100));
    }

    #[test]
    fn nearest_level_tie_keeps_the_lower_level() {
        // Ladder [50, 100]; 75 is equidistant from both.
        let strategy = GridStrategy::new(settings(dec!(100), 100.0, 2)).unwrap();
        assert_eq!(strategy.nearest_level(dec!(75)), Some(dec!(50)));
    }

    #[test]
    fn price_far_below_the_ladder_proposes_a_buy() {
        let mut strategy = GridStrategy::new(settings(dec!(100), 2.0, 10)).unwrap();
        let signal = strategy.analyze(&[bar(0, dec!(80))]).unwrap();
        assert_eq!(signal.action, Action::Buy);
        assert_eq!(signal.confidence, 0.7);
        assert_eq!(signal.price, dec!(80));
    }

    #[test]
    fn price_far_above_the_ladder_proposes_a_sell() {
        let mut strategy = GridStrategy::new(settings(dec!(100), 2.0, 10)).unwrap();
        let signal = strategy.analyze(&[bar(0, dec!(120))]).unwrap();
        assert_eq!(signal.action, Action::Sell);
    }

    #[test]
    fn price_inside_the_band_holds() {
        let mut strategy = GridStrategy::new(settings(dec!(100), 2.0, 10)).unwrap();
        let signal = strategy.analyze(&[bar(0, dec!(100.5))]).unwrap();
        assert_eq!(signal.action, Action::Hold);
    }

    #[test]
    fn empty_ladder_holds_deterministically() {
        let mut strategy = GridStrategy::new(settings(dec!(100), 2.0, 0)).unwrap();
        for _ in 0..3 {
            let signal = strategy.analyze(&[bar(0, dec!(42))]).unwrap();
            assert_eq!(signal.action, Action::Hold);
        }
    }

    #[test]
    fn non_positive_spacing_is_rejected() {
        assert!(GridStrategy::new(settings(dec!(100), 0.0, 10)).is_err());
        assert!(GridStrategy::new(settings(dec!(100), -2.0, 10)).is_err());
    }

    #[test]
    fn non_positive_reference_price_is_rejected() {
        assert!(GridStrategy::new(settings(dec!(0), 2.0, 10)).is_err());
    }

    #[test]
    fn empty_window_is_an_analysis_error() {
        let mut strategy = GridStrategy::new(settings(dec!(100), 2.0, 10)).unwrap();
        assert!(strategy.analyze(&[]).is_err());
    }
}
