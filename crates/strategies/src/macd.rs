// In crates/strategies/src/macd.rs

use crate::types::MacdSettings;
use crate::{Error, Result, Strategy};
use core_types::{Action, MarketBar, Signal};
use num_traits::cast::ToPrimitive;
use ta::Next;
use ta::indicators::MovingAverageConvergenceDivergence as Macd;

/// Momentum strategy keyed on the sign of the MACD histogram.
///
/// The histogram is recomputed from scratch for the current window and for
/// the window without its last bar; a sign change between the two readings is
/// the crossover event. Recomputing both windows per call keeps the detector
/// a pure function of the window rather than a rolling state that drifts over
/// a long run.
pub struct MacdStrategy {
    settings: MacdSettings,
}

impl MacdStrategy {
    /// Creates a new `MacdStrategy` instance from its settings.
    pub fn new(settings: MacdSettings) -> Result<Self> {
        if settings.fast_period >= settings.slow_period {
            return Err(Error::InvalidSettings(format!(
                "fast_period ({}) must be shorter than slow_period ({})",
                settings.fast_period, settings.slow_period
            )));
        }
        // Probe construction so bad periods surface here, not per bar.
        Self::indicator(&settings)?;
        Ok(Self { settings })
    }

    fn indicator(settings: &MacdSettings) -> Result<Macd> {
        Macd::new(
            settings.fast_period as usize,
            settings.slow_period as usize,
            settings.signal_period as usize,
        )
        .map_err(|e| Error::InvalidSettings(e.to_string()))
    }

    /// The histogram value after feeding the whole series through a fresh
    /// indicator instance.
    fn histogram(&self, prices: &[f64]) -> Result<f64> {
        let mut macd = Self::indicator(&self.settings)?;
        let mut histogram = 0.0;
        for &price in prices {
            histogram = macd.next(price).histogram;
        }
        Ok(histogram)
    }

    fn crossover(previous: f64, current: f64) -> Action {
        if current > 0.0 && previous < 0.0 {
            Action::Buy
        } else if current < 0.0 && previous > 0.0 {
            Action::Sell
        } else {
            Action::Hold
        }
    }
}

impl Strategy for MacdStrategy {
    fn name(&self) -> &'static str {
        "MacdCrossover"
    }

    fn analyze(&mut self, window: &[MarketBar]) -> Result<Signal> {
        let bar = window
            .last()
            .ok_or_else(|| Error::Analysis("analyze called with an empty window".into()))?;
        let price = bar.price;

        // Not enough bars for a meaningful histogram pair yet.
        if window.len() <= self.settings.slow_period as usize {
            return Ok(Signal::hold(price, bar.timestamp));
        }

        let prices: Vec<f64> = window.iter().map(|b| b.price.to_f64().unwrap()).collect();

        let current = self.histogram(&prices)?;
        let previous = self.histogram(&prices[..prices.len() - 1])?;

        let signal = match Self::crossover(previous, current) {
            Action::Buy => Signal::buy(self.settings.confidence, price, bar.timestamp),
            Action::Sell => Signal::sell(self.settings.confidence, price, bar.timestamp),
            Action::Hold => Signal::hold(price, bar.timestamp),
        };
        Ok(signal)
    }
}
