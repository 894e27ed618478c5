//! Timestamps for queued frames.
//!
//! Frames carry integer tick timestamps as handed over by the capture stage.
//! A `Timebase` gives ticks their meaning; conversions use rational
//! arithmetic so frame durations at NTSC rates stay exact.

use crate::error::{LookaheadError, Result};
use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds per tick, as a rational number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timebase {
    value: Rational64,
}

impl Timebase {
    /// Create a timebase of `numerator / denominator` seconds per tick.
    #[inline]
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            value: Rational64::new(numerator, denominator),
        }
    }

    /// 90 kHz clock used by MPEG systems.
    pub fn mpeg() -> Self {
        Self::new(1, 90_000)
    }

    /// Exact duration of `ticks` in seconds.
    #[inline]
    pub fn seconds(self, ticks: i64) -> Rational64 {
        self.value * ticks
    }

    #[inline]
    pub fn seconds_f64(self, ticks: i64) -> f64 {
        let s = self.seconds(ticks);
        *s.numer() as f64 / *s.denom() as f64
    }

    /// Both terms must be positive.
    pub fn validate(&self) -> Result<()> {
        if *self.value.numer() <= 0 || *self.value.denom() <= 0 {
            return Err(LookaheadError::Config(format!(
                "timebase {} must be positive",
                self
            )));
        }
        Ok(())
    }

    /// Ticks spanned by one frame at `fps_num / fps_den`, rounded down.
    pub fn frame_duration(self, fps_num: i64, fps_den: i64) -> Option<i64> {
        self.frame_start(1, fps_num, fps_den)
    }

    /// Tick timestamp of frame `index` at `fps_num / fps_den`, without
    /// accumulating rounding error across frames.
    ///
    /// `None` for a zero frame rate or timebase, or when the result does not
    /// fit in an `i64`.
    pub fn frame_start(self, index: i64, fps_num: i64, fps_den: i64) -> Option<i64> {
        // index * fps_den * denom / (fps_num * numer), in i128.
        let num = (index as i128)
            .checked_mul(fps_den as i128)?
            .checked_mul(*self.value.denom() as i128)?;
        let den = (fps_num as i128).checked_mul(*self.value.numer() as i128)?;
        if den == 0 {
            return None;
        }
        i64::try_from(num / den).ok()
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::mpeg()
    }
}

impl fmt::Display for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value.numer(), self.value.denom())
    }
}

/// Presentation interval of a frame in ticks. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    #[inline]
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn duration(self) -> i64 {
        self.end - self.start
    }

    #[inline]
    pub fn contains(self, ticks: i64) -> bool {
        ticks >= self.start && ticks < self.end
    }
}
