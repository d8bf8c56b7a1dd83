//! Daily new-case estimation from cumulative counts.

use crate::growth::math::exp_growth_rate;

/// Converts cumulative counts (newest first, no gaps) into daily increases,
/// newest pair first.
///
/// Agencies often skip a day's update, which shows up as a zero increase
/// followed by a double-sized one. A zero increase (other than the newest
/// one) is replaced by the value implied by exponential growth between its
/// two neighbours. Three equal readings in a row are a real plateau:
/// estimation stops there and no further increases are returned.
pub fn daily_increases(counts: &[u64]) -> Vec<f64> {
    let mut increases = Vec::with_capacity(counts.len().saturating_sub(1));

    for i in 0..counts.len().saturating_sub(1) {
        let mut increase = counts[i] as f64 - counts[i + 1] as f64;

        if i != 0 && increase == 0.0 {
            let newer = counts[i - 1];
            let older = counts[i + 1];
            if newer == older {
                break;
            }

            // Grow the older reading by one period of the two-period rate.
            if let Some(rate) = exp_growth_rate(newer as f64, older as f64, 2.0) {
                let estimated = rate.exp() * older as f64;
                increase = estimated - older as f64;
            }
        }

        increases.push(increase);
    }

    increases
}
