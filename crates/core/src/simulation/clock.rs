use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

const NIGHT_DIURNAL_FACTOR: f64 = 0.2;
const SEASONAL_AMPLITUDE: f64 = 0.3;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// One observation of the wall clock as the simulation sees it.
///
/// `hour_of_day` is carried separately from `timestamp` because the production clock
/// reads the hour in local time while event timestamps are always UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockReading {
    pub timestamp: DateTime<Utc>,
    pub hour_of_day: u32,
}

impl ClockReading {
    pub fn utc(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, hour_of_day: timestamp.hour() }
    }

    /// Coarse time bucket used as the order-history key.
    pub fn minute_bucket(&self) -> i64 {
        self.timestamp.timestamp().div_euclid(60)
    }

    fn epoch_seconds(&self) -> f64 {
        self.timestamp.timestamp_millis() as f64 / 1000.0
    }
}

pub trait TimeSource: Send + Sync {
    fn now(&self) -> ClockReading;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> ClockReading {
        ClockReading { timestamp: Utc::now(), hour_of_day: Local::now().hour() }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    reading: ClockReading,
}

impl FixedClock {
    pub fn new(reading: ClockReading) -> Self {
        Self { reading }
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> ClockReading {
        self.reading
    }
}

/// Advances by a fixed step on every reading, starting at `start`.
#[derive(Debug)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    step_secs: i64,
    readings: AtomicU64,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step_secs: u64) -> Self {
        Self { start, step_secs: step_secs as i64, readings: AtomicU64::new(0) }
    }
}

impl TimeSource for SteppingClock {
    fn now(&self) -> ClockReading {
        let index = self.readings.fetch_add(1, Ordering::Relaxed) as i64;
        let offset = Duration::seconds(self.step_secs.saturating_mul(index));
        ClockReading::utc(self.start + offset)
    }
}

/// Multiplicative demand modifiers derived from the clock.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DemandFactors {
    pub diurnal: f64,
    pub seasonal: f64,
}

impl DemandFactors {
    pub fn at(reading: &ClockReading) -> Self {
        Self {
            diurnal: diurnal_factor(reading.hour_of_day),
            seasonal: seasonal_factor(reading.epoch_seconds()),
        }
    }

    pub fn combined(&self) -> f64 {
        self.diurnal * self.seasonal
    }
}

/// Daytime peak between 06:00 and 22:00, flat floor overnight.
pub fn diurnal_factor(hour_of_day: u32) -> f64 {
    if (6..=22).contains(&hour_of_day) {
        0.5 + 0.5 * ((hour_of_day as f64 - 6.0) * PI / 12.0).sin()
    } else {
        NIGHT_DIURNAL_FACTOR
    }
}

pub fn seasonal_factor(epoch_seconds: f64) -> f64 {
    1.0 + SEASONAL_AMPLITUDE * (epoch_seconds / SECONDS_PER_DAY).sin()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::simulation::clock::{
        diurnal_factor, seasonal_factor, ClockReading, DemandFactors, FixedClock, SteppingClock,
        TimeSource,
    };

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).single().expect("epoch is representable")
    }

    #[test]
    fn diurnal_factor_peaks_at_noon_and_floors_overnight() {
        assert!((diurnal_factor(12) - 1.0).abs() < 1e-12);
        assert!((diurnal_factor(6) - 0.5).abs() < 1e-12);
        assert_eq!(diurnal_factor(3), 0.2);
        assert_eq!(diurnal_factor(23), 0.2);
        assert!(diurnal_factor(22) < 0.2, "late evening dips below the overnight floor");
    }

    #[test]
    fn seasonal_factor_oscillates_around_one() {
        assert_eq!(seasonal_factor(0.0), 1.0);
        let peak = seasonal_factor(std::f64::consts::FRAC_PI_2 * 86_400.0);
        assert!((peak - 1.3).abs() < 1e-12);
    }

    #[test]
    fn fixed_clock_can_pin_both_factors_to_unity() {
        let clock = FixedClock::new(ClockReading { timestamp: epoch(), hour_of_day: 12 });
        let factors = DemandFactors::at(&clock.now());

        assert!((factors.combined() - 1.0).abs() < 1e-12);
        assert_eq!(clock.now().minute_bucket(), 0);
    }

    #[test]
    fn stepping_clock_advances_one_step_per_reading() {
        let clock = SteppingClock::new(epoch(), 30);

        let first = clock.now();
        let second = clock.now();
        let third = clock.now();

        assert_eq!(first.timestamp, epoch());
        assert_eq!((second.timestamp - first.timestamp).num_seconds(), 30);
        assert_eq!(third.minute_bucket(), 1);
        assert_eq!(third.hour_of_day, 0);
    }
}
