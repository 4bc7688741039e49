use std::fmt::Debug;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use num_traits::Float;

use crate::errors::{Error, Result};

/// Parse a YYYYMMDDHH run stamp, e.g. 2020061521.
///
pub fn parse_datestamp(stamp: u64) -> Result<NaiveDateTime> {
    let hour = (stamp % 100) as u32;
    let day = ((stamp / 100) % 100) as u32;
    let month = ((stamp / 10_000) % 100) as u32;
    let year = (stamp / 1_000_000) as i32;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .ok_or_else(|| Error::Schema(format!("invalid datestamp: {stamp}")))
}

/// An arithmetic sequence of run base dates with both endpoints included.
///
/// The Nth date is computed as `start + N * step` rather than by repeated
/// addition, so enumeration order never affects the result.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub step: Duration,
    pub steps: usize,
}

impl DateRange {
    /// Build the range covering `start..=end` every `step_hours` hours.
    ///
    /// The count is `floor((end - start) / step) + 1`; `end` itself is only
    /// produced when the span divides evenly. The step is carried at
    /// whole-second granularity; finer steps are rejected rather than
    /// silently snapped.
    ///
    pub fn inclusive(start: NaiveDateTime, end: NaiveDateTime, step_hours: f64) -> Result<Self> {
        if step_hours <= 0.0 {
            return Err(Error::Schema(format!(
                "period step must be positive, got {step_hours}"
            )));
        }
        let step_secs = (step_hours * 3600.0).round() as i64;
        if step_secs == 0 {
            return Err(Error::Schema(format!(
                "period step of {step_hours} hours is below one-second granularity"
            )));
        }
        let span = (end - start).num_seconds();
        if span < 0 {
            return Err(Error::Schema(format!(
                "period start {start} is after period end {end}"
            )));
        }

        Ok(Self {
            start,
            step: Duration::seconds(step_secs),
            steps: (span / step_secs) as usize + 1,
        })
    }

    pub fn get(&self, index: usize) -> NaiveDateTime {
        self.start + self.step * index as i32
    }

    pub fn len(&self) -> usize {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.steps).map(|i| self.get(i))
    }
}

/// An arithmetic sequence of forecast lead times, endpoints included.
///
/// Timesteps are commonly fractional (0.25 hours), so the Nth term is
/// computed as `start + N * step` by index multiplication. A running sum
/// would accumulate rounding drift over long ranges.
///
#[derive(Clone, Debug, PartialEq)]
pub struct TermRange<N>
where
    N: Float + Debug + Send + Sync + 'static,
{
    pub start: N,
    pub step: N,
    pub steps: usize,
}

impl<N> TermRange<N>
where
    N: Float + Debug + Send + Sync + 'static,
{
    pub fn inclusive(start: N, end: N, step: N) -> Result<Self> {
        if step <= N::zero() {
            return Err(Error::Schema(format!(
                "term timestep must be positive, got {step:?}"
            )));
        }
        if end < start {
            return Err(Error::Schema(format!(
                "term end {end:?} is before term start {start:?}"
            )));
        }
        // Decimal steps like 0.1 divide into a quotient that can land just
        // below the whole number it stands for; flooring that raw value
        // would drop the declared end from the range. Snap near-integer
        // quotients back before flooring.
        let quotient = (end - start) / step;
        let nearest = quotient.round();
        let quotient = if (quotient - nearest).abs() < N::from(1e-9).unwrap() {
            nearest
        } else {
            quotient.floor()
        };
        let steps = quotient.to_usize().ok_or_else(|| {
            Error::Schema(format!(
                "term range {start:?}..{end:?} by {step:?} does not enumerate"
            ))
        })?;

        Ok(Self {
            start,
            step,
            steps: steps + 1,
        })
    }

    pub fn get(&self, index: usize) -> N {
        N::from(index).unwrap() * self.step + self.start
    }

    pub fn len(&self) -> usize {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = N> + '_ {
        (0..self.steps).map(|i| self.get(i))
    }
}
