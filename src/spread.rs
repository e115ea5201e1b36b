//! Repeat/reflect spread transform.

use crate::header::{Spread, SpreadMethod};

/// The result of mapping a spread-transformed input back to the base
/// function's domain.
#[derive(Debug, Clone, Copy)]
pub struct SpreadInput {
    /// The wrapped value to pass to the base function, in `[0, 1]` when the
    /// base domain itself spans `[0, 1]`; more generally in the base
    /// function's own input space after the caller re-scales.
    pub wrapped: f64,
    /// Number of whole wraps consumed to reach `wrapped` (`floor(factor*t)`).
    pub wrap_count: i64,
    /// True when this wrap was reflected (odd `wrap_count`, non-zero
    /// fractional part, `Reflect` method).
    pub reflected: bool,
}

/// Apply the spread pre-multiply/bias/wrap transform.
/// `t` is assumed already expressed in units of the base domain span
/// (e.g. `(input - lo) / (hi - lo)`), so that `factor * t` directly counts
/// domain-span wraps.
pub fn forward(spread: Spread, t: f64, upwards: bool) -> SpreadInput {
    if spread.is_identity() {
        return SpreadInput { wrapped: t, wrap_count: 0, reflected: false };
    }
    let bias = if upwards { crate::consts::STITCH_BIAS_EPSILON } else { -crate::consts::STITCH_BIAS_EPSILON };
    let scaled = spread.factor as f64 * t + bias * t.abs();
    let wrap_count = scaled.floor() as i64;
    let frac = scaled - scaled.floor();
    let reflected = matches!(spread.method, SpreadMethod::Reflect) && wrap_count % 2 != 0 && frac != 0.0;
    let wrapped = if reflected { 1.0 - frac } else { frac };
    SpreadInput { wrapped, wrap_count, reflected }
}

/// Map a discontinuity found in the base function's wrapped input space
/// back through one wrap, given the wrap this discontinuity was found in.
pub fn unwrap_discontinuity(spread: Spread, wrap_count: i64, base_value: f64, reflected: bool) -> f64 {
    debug_assert!(!spread.is_identity());
    let frac = if reflected { 1.0 - base_value } else { base_value };
    (wrap_count as f64 + frac) / spread.factor as f64
}

/// The next wrap-boundary strictly inside `[bounds_lo, bounds_hi]`
/// (expressed in the same domain-span units as [`forward`]'s `t`), or
/// `None` if there is none. Wrap boundaries occur at every integer
/// multiple of `1/factor`.
pub fn next_wrap_boundary(spread: Spread, bounds_lo: f64, bounds_hi: f64) -> Option<f64> {
    if spread.is_identity() {
        return None;
    }
    let step = 1.0 / spread.factor as f64;
    let first = ((bounds_lo / step).floor() + 1.0) * step;
    let mut candidate = first;
    while candidate <= bounds_hi {
        if candidate > bounds_lo {
            return Some(candidate);
        }
        candidate += step;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_when_factor_one() {
        let s = Spread { method: SpreadMethod::Repeat, factor: 1 };
        let r = forward(s, 0.37, true);
        assert_eq!(r.wrapped, 0.37);
        assert_eq!(r.wrap_count, 0);
        assert!(!r.reflected);
    }

    #[test]
    fn repeat_wraps_without_reflection() {
        let s = Spread { method: SpreadMethod::Repeat, factor: 3 };
        let r = forward(s, 0.8, true);
        assert_eq!(r.wrap_count, 2);
        assert!(!r.reflected);
        assert!((r.wrapped - 0.4).abs() < 1e-6);
    }

    #[test]
    fn reflect_flips_odd_wraps() {
        let s = Spread { method: SpreadMethod::Reflect, factor: 2 };
        let r = forward(s, 0.75, true);
        assert_eq!(r.wrap_count, 1);
        assert!(r.reflected);
        assert!((r.wrapped - 0.5).abs() < 1e-6);
    }
}
