use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::KbarError;

/// Decimal places kept for open/high/low/close.
pub const PRICE_DP: u32 = 6;
/// Decimal places kept for volume.
pub const VOLUME_DP: u32 = 2;

/// Lowest price any candle may carry.
pub fn price_floor() -> Decimal {
    Decimal::new(1, 2)
}

/// A single OHLCV candle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// Build a candle and check the OHLCV invariants.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Result<Self, KbarError> {
        let candle = Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// Build a candle from raw walk values, quantized to output precision.
    ///
    /// Rounding is monotone, so bounds that hold on the raw values still hold
    /// after quantization.
    pub fn from_walk(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, KbarError> {
        Self::new(
            timestamp,
            quantize(open, PRICE_DP, "open")?,
            quantize(high, PRICE_DP, "high")?,
            quantize(low, PRICE_DP, "low")?,
            quantize(close, PRICE_DP, "close")?,
            quantize(volume, VOLUME_DP, "volume")?,
        )
    }

    /// Check price bounds, the price floor and positive volume.
    pub fn validate(&self) -> Result<(), KbarError> {
        let floor = price_floor();
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if value < floor {
                return Err(KbarError::InvalidCandle(format!(
                    "{field} {value} below price floor {floor}"
                )));
            }
        }

        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low {
            return Err(KbarError::InvalidCandle(format!(
                "low {} above min(open, close) {body_low}",
                self.low
            )));
        }
        if self.high < body_high {
            return Err(KbarError::InvalidCandle(format!(
                "high {} below max(open, close) {body_high}",
                self.high
            )));
        }
        if self.volume <= Decimal::ZERO {
            return Err(KbarError::InvalidCandle(format!(
                "volume {} must be positive",
                self.volume
            )));
        }
        Ok(())
    }
}

fn quantize(value: f64, dp: u32, field: &str) -> Result<Decimal, KbarError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(dp))
        .ok_or_else(|| KbarError::InvalidCandle(format!("{field} is not representable: {value}")))
}
