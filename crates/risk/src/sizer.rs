// In crates/risk/src/sizer.rs

use num_traits::cast::FromPrimitive;
use rust_decimal::Decimal;

use crate::types::{SizerSettings, SizingMethod};
use crate::{Error, Result};

/// Turns an approved risk budget into an order quantity.
///
/// Whatever the configured policy produces, the result is clamped to the
/// `[capital * min_position_size, capital * max_position_size]` band, so a
/// sizing call never fails and never exceeds the account-level bounds.
#[derive(Debug)]
pub struct PositionSizer {
    /// The configuration for this sizer instance.
    settings: SizerSettings,
}

impl PositionSizer {
    /// Creates a new `PositionSizer` instance from its settings.
    pub fn new(settings: SizerSettings) -> Result<Self> {
        for (name, value) in [
            ("max_position_size", settings.max_position_size),
            ("min_position_size", settings.min_position_size),
            ("default_risk_per_trade", settings.default_risk_per_trade),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::InvalidParameters(format!(
                    "{name} must be a fraction in (0, 1], got {value}"
                )));
            }
        }
        if settings.min_position_size > settings.max_position_size {
            return Err(Error::InvalidParameters(format!(
                "min_position_size ({}) exceeds max_position_size ({})",
                settings.min_position_size, settings.max_position_size
            )));
        }
        if !(0.0..=1.0).contains(&settings.kelly_win_rate) {
            return Err(Error::InvalidParameters(format!(
                "kelly_win_rate must be in [0, 1], got {}",
                settings.kelly_win_rate
            )));
        }
        if settings.kelly_win_loss_ratio <= 0.0 {
            return Err(Error::InvalidParameters(format!(
                "kelly_win_loss_ratio must be positive, got {}",
                settings.kelly_win_loss_ratio
            )));
        }

        Ok(Self { settings })
    }

    /// Calculates the order quantity for an approved trade.
    pub fn size(&self, capital: Decimal, risk_amount: f64, price: Decimal) -> Decimal {
        let size = match self.settings.method {
            SizingMethod::Fixed => self.fixed_size(capital),
            SizingMethod::RiskBased => self.risk_based_size(capital, risk_amount, price),
            SizingMethod::Kelly => self.kelly_size(capital, risk_amount),
        };
        self.clamp(size, capital)
    }

    fn fixed_size(&self, capital: Decimal) -> Decimal {
        capital * Decimal::from_f64(self.settings.default_risk_per_trade).unwrap()
    }

    fn risk_based_size(&self, capital: Decimal, risk_amount: f64, price: Decimal) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        capital * Decimal::from_f64(risk_amount).unwrap_or_default() / price
    }

    fn kelly_size(&self, capital: Decimal, risk_amount: f64) -> Decimal {
        let win_rate = self.settings.kelly_win_rate;
        let kelly = win_rate - (1.0 - win_rate) / self.settings.kelly_win_loss_ratio;
        capital * Decimal::from_f64(kelly.max(0.0) * risk_amount).unwrap_or_default()
    }

    fn clamp(&self, size: Decimal, capital: Decimal) -> Decimal {
        let max = capital * Decimal::from_f64(self.settings.max_position_size).unwrap();
        let min = capital * Decimal::from_f64(self.settings.min_position_size).unwrap();
        size.max(min).min(max)
    }
}
