//! Small numeric helpers for consensus math and presentation rounding.
//!
//! # Design Philosophy
//!
//! - Accumulation always happens at full `f64` precision
//! - Rounding happens only when a value is serialized for consumers
//! - Per-game figures present 2 decimals, slate-level figures 1 decimal

use serde::Serializer;

/// Arithmetic mean, `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected sample standard deviation, `0.0` below two samples
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Round to a fixed number of decimal places
#[inline]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// serde helper: per-game presentation precision
pub fn round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 2))
}

/// serde helper: per-game presentation precision for optional values
pub fn round2_opt<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&round_to(*v, 2)),
        None => serializer.serialize_none(),
    }
}

/// serde helper: slate-level presentation precision
pub fn round1<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[8.5, 9.5]), 9.0);
    }

    #[test]
    fn test_sample_std_dev_needs_two_points() {
        assert_eq!(sample_std_dev(&[]), 0.0);
        assert_eq!(sample_std_dev(&[8.5]), 0.0);
    }

    #[test]
    fn test_sample_std_dev_bessel() {
        // mean 9, squared deviations 1 + 1 = 2, n-1 = 1
        let sd = sample_std_dev(&[8.0, 10.0]);
        assert!((sd - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(8.456, 2), 8.46);
        assert_eq!(round_to(71.249, 1), 71.2);
        assert_eq!(round_to(-0.04, 1), -0.0);
    }
}
