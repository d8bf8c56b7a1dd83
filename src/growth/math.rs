//! Exponential growth primitives.
//!
//! Everything here models `final = starting * e^(rate * periods)`. Inputs
//! that would take a logarithm of a non-positive number or divide by zero
//! yield `None`, so callers omit the metric instead of propagating NaN.

use std::f64::consts::LN_2;

use crate::growth::increases::daily_increases;
use crate::growth::utility::mean;

/// Rate solving `final = starting * e^(rate * periods)`, i.e.
/// `-ln(starting / final) / periods`.
pub fn exp_growth_rate(final_count: f64, starting_count: f64, periods: f64) -> Option<f64> {
    if final_count <= 0.0 || starting_count <= 0.0 || periods == 0.0 {
        return None;
    }
    Some(-(starting_count / final_count).ln() / periods)
}

/// Periods needed to double at `rate`: `ln(2) / ln(1 + rate)`.
///
/// Undefined for `rate <= -1`, and infinite for a zero rate.
pub fn doubling_time(rate: f64) -> Option<f64> {
    if rate <= -1.0 || rate == 0.0 {
        return None;
    }
    Some(LN_2 / (1.0 + rate).ln())
}

/// Mean doubling time implied by the latest count against each earlier count
/// in `window` (newest first), using the day distance as the period count.
///
/// Non-positive rates are discarded before averaging.
pub fn averaged_doubling_time(window: &[u64]) -> Option<f64> {
    let (&latest, earlier) = window.split_first()?;

    let doubling_times: Vec<f64> = earlier
        .iter()
        .enumerate()
        .filter_map(|(i, &count)| exp_growth_rate(latest as f64, count as f64, (i + 1) as f64))
        .filter(|rate| *rate > 0.0)
        .filter_map(doubling_time)
        .collect();

    mean(&doubling_times)
}

/// Mean ratio of each day's new cases to the previous day's, over `window`
/// (cumulative counts, newest first).
///
/// Example: `[150, 120, 100, 90, 80]` gives daily increases 30, 20, 10, 10,
/// ratios 1.5, 2.0, 1.0 and a growth factor of 1.5.
///
/// Returns `None` when any estimated increase is zero or fewer than two
/// increases are available.
pub fn growth_factor(window: &[u64]) -> Option<f64> {
    let increases = daily_increases(window);

    if increases.iter().any(|&increase| increase == 0.0) {
        return None;
    }

    let ratios: Vec<f64> = increases.windows(2).map(|pair| pair[0] / pair[1]).collect();

    mean(&ratios)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_exp_growth_rate_round_trips_through_exp() {
        let rate = exp_growth_rate(200.0, 100.0, 2.0).unwrap();
        assert_close(100.0 * (rate * 2.0).exp(), 200.0);
        assert_close(rate, LN_2 / 2.0);
    }

    #[test]
    fn test_exp_growth_rate_rejects_non_positive_counts() {
        assert_eq!(exp_growth_rate(100.0, 0.0, 1.0), None);
        assert_eq!(exp_growth_rate(0.0, 100.0, 1.0), None);
        assert_eq!(exp_growth_rate(100.0, 50.0, 0.0), None);
    }

    #[test]
    fn test_doubling_time() {
        assert_close(doubling_time(1.0).unwrap(), 1.0);
        assert_close(doubling_time(0.5).unwrap(), LN_2 / 1.5f64.ln());
        assert_eq!(doubling_time(-1.0), None);
        assert_eq!(doubling_time(-2.5), None);
        assert_eq!(doubling_time(0.0), None);
    }

    #[test]
    fn test_growth_factor_documented_example() {
        assert_close(growth_factor(&[150, 120, 100, 90, 80]).unwrap(), 1.5);
    }

    #[test]
    fn test_growth_factor_flat_series_is_unavailable() {
        // First pair has zero increase and is never smoothed.
        assert_eq!(growth_factor(&[100, 100, 90, 80]), None);
    }

    #[test]
    fn test_growth_factor_needs_two_increases() {
        assert_eq!(growth_factor(&[100, 90]), None);
        assert_eq!(growth_factor(&[100]), None);
    }

    #[test]
    fn test_averaged_doubling_time_averages_each_offset() {
        let window = [52, 51, 50];
        let one_day = doubling_time(exp_growth_rate(52.0, 51.0, 1.0).unwrap()).unwrap();
        let two_day = doubling_time(exp_growth_rate(52.0, 50.0, 2.0).unwrap()).unwrap();
        assert_close(
            averaged_doubling_time(&window).unwrap(),
            (one_day + two_day) / 2.0,
        );
    }

    #[test]
    fn test_averaged_doubling_time_skips_non_positive_rates() {
        // 80 -> 80 has a zero rate and is dropped; only 80 vs 40 survives.
        let only = doubling_time(exp_growth_rate(80.0, 40.0, 2.0).unwrap()).unwrap();
        assert_close(averaged_doubling_time(&[80, 80, 40]).unwrap(), only);
    }

    #[test]
    fn test_averaged_doubling_time_unavailable_without_growth() {
        assert_eq!(averaged_doubling_time(&[60, 60, 60]), None);
        assert_eq!(averaged_doubling_time(&[60]), None);
        assert_eq!(averaged_doubling_time(&[]), None);
    }
}
