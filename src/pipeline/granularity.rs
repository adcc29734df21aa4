//! Preferred-number series used to snap bucket boundaries
//!
//! Decade series repeat every power of ten (`..., 0.5, 1, 2, 5, 10, 20, ...`).
//! Rounding is strict in both directions: a value already in the series
//! rounds to its neighbour. Zero rounds down to zero and up to 1.

use std::fmt;
use std::str::FromStr;

use super::errors::PipelineError;

const R5: &[f64] = &[1.0, 1.6, 2.5, 4.0, 6.3];
const R10: &[f64] = &[1.0, 1.25, 1.6, 2.0, 2.5, 3.15, 4.0, 5.0, 6.3, 8.0];
const R20: &[f64] = &[
    1.0, 1.12, 1.25, 1.4, 1.6, 1.8, 2.0, 2.24, 2.5, 2.8, 3.15, 3.55, 4.0, 4.5, 5.0, 5.6, 6.3,
    7.1, 8.0, 9.0,
];
const R40: &[f64] = &[
    1.0, 1.06, 1.12, 1.18, 1.25, 1.32, 1.4, 1.5, 1.6, 1.7, 1.8, 1.9, 2.0, 2.12, 2.24, 2.36, 2.5,
    2.65, 2.8, 3.0, 3.15, 3.35, 3.55, 3.75, 4.0, 4.25, 4.5, 4.75, 5.0, 5.3, 5.6, 6.0, 6.3, 6.7,
    7.1, 7.5, 8.0, 8.5, 9.0, 9.5,
];
const ONE_TWO_FIVE: &[f64] = &[1.0, 2.0, 5.0];
const E6: &[f64] = &[1.0, 1.5, 2.2, 3.3, 4.7, 6.8];
const E12: &[f64] = &[1.0, 1.2, 1.5, 1.8, 2.2, 2.7, 3.3, 3.9, 4.7, 5.6, 6.8, 8.2];
const E24: &[f64] = &[
    1.0, 1.1, 1.2, 1.3, 1.5, 1.6, 1.8, 2.0, 2.2, 2.4, 2.7, 3.0, 3.3, 3.6, 3.9, 4.3, 4.7, 5.1,
    5.6, 6.2, 6.8, 7.5, 8.2, 9.1,
];

/// Relative slack when comparing a mantissa against series entries
const EPSILON: f64 = 1e-9;

/// A preferred-number series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    R5,
    R10,
    R20,
    R40,
    OneTwoFive,
    E6,
    E12,
    E24,
    PowersOf2,
}

impl Granularity {
    /// Conventional name of the series
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::R5 => "R5",
            Granularity::R10 => "R10",
            Granularity::R20 => "R20",
            Granularity::R40 => "R40",
            Granularity::OneTwoFive => "1-2-5",
            Granularity::E6 => "E6",
            Granularity::E12 => "E12",
            Granularity::E24 => "E24",
            Granularity::PowersOf2 => "POWERSOF2",
        }
    }

    fn decade_series(&self) -> Option<&'static [f64]> {
        match self {
            Granularity::R5 => Some(R5),
            Granularity::R10 => Some(R10),
            Granularity::R20 => Some(R20),
            Granularity::R40 => Some(R40),
            Granularity::OneTwoFive => Some(ONE_TWO_FIVE),
            Granularity::E6 => Some(E6),
            Granularity::E12 => Some(E12),
            Granularity::E24 => Some(E24),
            Granularity::PowersOf2 => None,
        }
    }

    /// Smallest series value strictly greater than `value`.
    ///
    /// `value` must be finite and non-negative.
    pub fn round_up(&self, value: f64) -> f64 {
        if value <= 0.0 {
            return 1.0;
        }
        let Some(series) = self.decade_series() else {
            let mut p = 2f64.powf(value.log2().floor());
            while p <= value {
                p *= 2.0;
            }
            return p;
        };

        let (mantissa, scale) = split_decade(value);
        let next = series
            .iter()
            .find(|&&s| s > mantissa + EPSILON)
            .map(|&s| s * scale)
            .unwrap_or(series[0] * scale * 10.0);
        tidy(next)
    }

    /// Largest series value strictly less than `value`.
    ///
    /// `value` must be finite and non-negative.
    pub fn round_down(&self, value: f64) -> f64 {
        if value <= 0.0 {
            return 0.0;
        }
        let Some(series) = self.decade_series() else {
            let mut p = 2f64.powf(value.log2().ceil());
            while p >= value {
                p /= 2.0;
            }
            return p;
        };

        let (mantissa, scale) = split_decade(value);
        let prev = series
            .iter()
            .rev()
            .find(|&&s| s < mantissa - EPSILON)
            .map(|&s| s * scale)
            .unwrap_or(series[series.len() - 1] * scale / 10.0);
        tidy(prev)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R5" => Ok(Granularity::R5),
            "R10" => Ok(Granularity::R10),
            "R20" => Ok(Granularity::R20),
            "R40" => Ok(Granularity::R40),
            "1-2-5" => Ok(Granularity::OneTwoFive),
            "E6" => Ok(Granularity::E6),
            "E12" => Ok(Granularity::E12),
            "E24" => Ok(Granularity::E24),
            "POWERSOF2" => Ok(Granularity::PowersOf2),
            other => Err(PipelineError::InvalidStage(format!(
                "unknown granularity '{}'",
                other
            ))),
        }
    }
}

/// Splits a positive value into a mantissa in [1, 10) and its power of ten
fn split_decade(value: f64) -> (f64, f64) {
    let mut scale = 10f64.powi(value.log10().floor() as i32);
    let mut mantissa = value / scale;
    if mantissa >= 10.0 - EPSILON {
        mantissa /= 10.0;
        scale *= 10.0;
    } else if mantissa < 1.0 - EPSILON {
        mantissa *= 10.0;
        scale /= 10.0;
    }
    (mantissa, scale)
}

/// Strips float noise such as 0.16000000000000003
fn tidy(value: f64) -> f64 {
    format!("{:.11e}", value).parse().unwrap_or(value)
}
