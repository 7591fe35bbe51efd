//! Random-walk candle generator.
//!
//! Each candle opens at the previous close and closes after a uniform drift
//! of at most ±2%. The intrabar range extends both ends of the body by a
//! random span proportional to the open. Prices never drop below the floor.

use chrono::{DateTime, TimeDelta, Utc};
use kbar_core::Candle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SynthError;

pub const DEFAULT_START_PRICE: f64 = 100.0;
pub const DEFAULT_INTERVAL_SECONDS: u64 = 60;

const PRICE_FLOOR: f64 = 0.01;
const MAX_DRIFT: f64 = 0.02;
const SPAN_MIN: f64 = 0.001;
const SPAN_MAX: f64 = 0.01;
const VOLUME_MIN: f64 = 50.0;
const VOLUME_MAX: f64 = 5_000.0;

/// Validated series shape: how many candles and how far apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    length: usize,
    interval: TimeDelta,
    total: TimeDelta,
}

impl GenerationParams {
    pub fn new(length: usize, interval_seconds: u64) -> Result<Self, SynthError> {
        if length == 0 {
            return Err(SynthError::InvalidArgument("length must be positive".into()));
        }
        if interval_seconds == 0 {
            return Err(SynthError::InvalidArgument(
                "interval-seconds must be positive".into(),
            ));
        }

        let out_of_range = || {
            SynthError::InvalidArgument(format!(
                "{length} candles of {interval_seconds}s exceed the supported time range"
            ))
        };
        let seconds = i64::try_from(interval_seconds).map_err(|_| out_of_range())?;
        let interval = TimeDelta::try_seconds(seconds).ok_or_else(out_of_range)?;
        let total = i64::try_from(length)
            .ok()
            .and_then(|n| seconds.checked_mul(n))
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(out_of_range)?;

        Ok(Self {
            length,
            interval,
            total,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval.num_seconds().unsigned_abs()
    }
}

/// One RNG stream: seeded when `seed` is given, otherwise from OS entropy.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generate `params.length()` candles ending one interval before `anchor`.
///
/// Draws three values per candle from `rng` (drift, span, volume), in that
/// order, so a shared stream stays reproducible across calls.
pub fn generate<R: Rng>(
    params: &GenerationParams,
    rng: &mut R,
    anchor: DateTime<Utc>,
    start_price: f64,
) -> Result<Vec<Candle>, SynthError> {
    if !start_price.is_finite() || start_price <= 0.0 {
        return Err(SynthError::InvalidArgument(format!(
            "start price must be positive, got {start_price}"
        )));
    }

    let base_time = anchor.checked_sub_signed(params.total).ok_or_else(|| {
        SynthError::InvalidArgument(format!("series start before {anchor} is out of range"))
    })?;

    let mut candles = Vec::with_capacity(params.length);
    let mut timestamp = base_time;
    let mut price = start_price;

    for _ in 0..params.length {
        let open = price;
        let drift = rng.gen_range(-MAX_DRIFT..MAX_DRIFT);
        let close = (open * (1.0 + drift)).max(PRICE_FLOOR);

        let span = open * rng.gen_range(SPAN_MIN..SPAN_MAX);
        let high = open.max(close) + span;
        let low = (open.min(close) - span).max(PRICE_FLOOR);

        let volume = rng.gen_range(VOLUME_MIN..VOLUME_MAX);

        candles.push(Candle::from_walk(timestamp, open, high, low, close, volume)?);

        price = close;
        timestamp += params.interval;
    }

    Ok(candles)
}
