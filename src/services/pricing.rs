//! Bundle pricing engine
//!
//! Derives a single interest rate for a pool of loans from the loans'
//! default rates and a caller-supplied risk multiplier. This is a pure
//! computation: persistence and recomputation triggers live with the
//! bundle service, which never trusts a previously stored rate.

use thiserror::Error;

/// Domain errors for interest rate computation
#[derive(Error, Debug, PartialEq)]
pub enum PricingError {
    #[error("Cannot price an empty loan pool")]
    EmptyPool,

    #[error("Risk multiplier must be strictly positive, got {0}")]
    InvalidMultiplier(f64),

    #[error("Default rate out of range [0, 1]: {0}")]
    InvalidDefaultRate(f64),

    #[error("Undefined default rate: pooled default rate is 1.0")]
    UndefinedDefaultRate,
}

/// Compute a bundle's interest rate from its member loans' default rates
/// and the risk multiplier `m`.
///
/// Let `avg` be the arithmetic mean of the default rates; the result is
/// `((1 + m) / (1 - avg)) - 1`.
///
/// Deterministic in its inputs, so callers can safely re-derive the rate
/// on every read instead of caching a value that could drift.
///
/// # Errors
///
/// * [`PricingError::EmptyPool`] when `default_rates` is empty
/// * [`PricingError::InvalidMultiplier`] when `m` is not strictly positive
/// * [`PricingError::InvalidDefaultRate`] when any rate falls outside [0, 1]
/// * [`PricingError::UndefinedDefaultRate`] when the mean rate is 1.0,
///   where the formula would otherwise divide by zero
pub fn compute_interest_rate(default_rates: &[f64], m: f64) -> Result<f64, PricingError> {
    if default_rates.is_empty() {
        return Err(PricingError::EmptyPool);
    }
    if !(m > 0.0) || !m.is_finite() {
        return Err(PricingError::InvalidMultiplier(m));
    }
    if let Some(&bad) = default_rates
        .iter()
        .find(|r| !r.is_finite() || **r < 0.0 || **r > 1.0)
    {
        return Err(PricingError::InvalidDefaultRate(bad));
    }

    let avg = default_rates.iter().sum::<f64>() / default_rates.len() as f64;

    // All loans certain to default: the formula has no defined value and
    // must not silently produce infinity.
    if avg >= 1.0 {
        return Err(PricingError::UndefinedDefaultRate);
    }

    Ok(((1.0 + m) / (1.0 - avg)) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        // rates [0.1, 0.2, 0.3], m = 1.5 -> avg 0.2 -> (2.5 / 0.8) - 1 = 2.125
        let rate = compute_interest_rate(&[0.1, 0.2, 0.3], 1.5).unwrap();
        assert!((rate - 2.125).abs() < 1e-12);
    }

    #[test]
    fn test_zero_risk_pool_yields_multiplier() {
        // avg = 0 collapses the formula to exactly m
        let rate = compute_interest_rate(&[0.0, 0.0], 2.0).unwrap();
        assert!((rate - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rate_exceeds_multiplier_for_risky_pools() {
        for m in [0.1, 0.5, 1.5, 10.0] {
            for rates in [&[0.05][..], &[0.1, 0.9], &[0.5, 0.5, 0.5]] {
                let rate = compute_interest_rate(rates, m).unwrap();
                assert!(
                    rate > m,
                    "rate {} should exceed multiplier {} for pool {:?}",
                    rate,
                    m,
                    rates
                );
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let rates = [0.12, 0.34, 0.05, 0.0];
        let first = compute_interest_rate(&rates, 1.2).unwrap();
        let second = compute_interest_rate(&rates, 1.2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_all_certain_defaults_is_domain_error() {
        let result = compute_interest_rate(&[1.0, 1.0, 1.0], 1.5);
        assert_eq!(result, Err(PricingError::UndefinedDefaultRate));
    }

    #[test]
    fn test_result_is_always_finite() {
        // Mean just below 1.0 stays defined, however large
        let rate = compute_interest_rate(&[0.999999], 1.5).unwrap();
        assert!(rate.is_finite());
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert_eq!(compute_interest_rate(&[], 1.5), Err(PricingError::EmptyPool));
    }

    #[test]
    fn test_non_positive_multiplier_rejected() {
        assert_eq!(
            compute_interest_rate(&[0.1], 0.0),
            Err(PricingError::InvalidMultiplier(0.0))
        );
        assert_eq!(
            compute_interest_rate(&[0.1], -1.0),
            Err(PricingError::InvalidMultiplier(-1.0))
        );
    }

    #[test]
    fn test_out_of_range_default_rate_rejected() {
        assert_eq!(
            compute_interest_rate(&[0.1, 1.5], 1.0),
            Err(PricingError::InvalidDefaultRate(1.5))
        );
        assert_eq!(
            compute_interest_rate(&[-0.1], 1.0),
            Err(PricingError::InvalidDefaultRate(-0.1))
        );
    }
}
