//! Boundary policies: map an unbounded running value onto `[min, max]`.
//!
//! All three policies are pure and total. They agree at the band edges
//! (`overall == max` yields `max`, `overall == min` yields `min`) and leave
//! values already inside the band untouched.
//!
//! Degenerate input is normalised first: `max < min` swaps the bounds,
//! `max == min` collapses to `min`, and NaN passes through. An infinite
//! running value (e.g. from `x/0`) cannot wrap or fold, so every policy
//! holds it at the bound it ran past.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a running value that leaves its band is brought back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    /// Clamp to the nearest bound.
    Hold,
    /// Wrap around: leaving the top re-enters at the bottom (sawtooth).
    Loop,
    /// Bounce: hitting a bound reverses direction (triangle wave).
    Reverse,
}

impl Breakpoint {
    pub fn apply(self, overall: f64, max: f64, min: f64) -> f64 {
        match self {
            Breakpoint::Hold => hold(overall, max, min),
            Breakpoint::Loop => loop_around(overall, max, min),
            Breakpoint::Reverse => reverse(overall, max, min),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Breakpoint::Hold => "hold",
            Breakpoint::Loop => "loop",
            Breakpoint::Reverse => "reverse",
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown breakpoint `{0}` (expected hold, loop or reverse)")]
pub struct UnknownBreakpoint(pub String);

impl FromStr for Breakpoint {
    type Err = UnknownBreakpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hold" => Ok(Breakpoint::Hold),
            "loop" => Ok(Breakpoint::Loop),
            "reverse" => Ok(Breakpoint::Reverse),
            _ => Err(UnknownBreakpoint(s.to_string())),
        }
    }
}

/// Outcome of bound normalisation shared by all policies.
enum Band {
    /// Nothing to do, return this value.
    Done(f64),
    /// `min <= max`, `overall` outside the band.
    Outside { max: f64, min: f64 },
}

fn normalise(overall: f64, max: f64, min: f64) -> Band {
    if overall.is_nan() || max.is_nan() || min.is_nan() {
        return Band::Done(overall);
    }
    let (max, min) = if max < min { (min, max) } else { (max, min) };
    if max == min {
        return Band::Done(min);
    }
    if overall >= min && overall <= max {
        return Band::Done(overall);
    }
    Band::Outside { max, min }
}

/// Clamp `overall` into `[min, max]`.
pub fn hold(overall: f64, max: f64, min: f64) -> f64 {
    match normalise(overall, max, min) {
        Band::Done(v) => v,
        Band::Outside { max, min } => overall.clamp(min, max),
    }
}

/// Sawtooth wrap of `overall` into `[min, max]`.
///
/// With one open side, values beyond the finite bound cannot wrap and are
/// held at that bound.
pub fn loop_around(overall: f64, max: f64, min: f64) -> f64 {
    let (max, min) = match normalise(overall, max, min) {
        Band::Done(v) => return v,
        Band::Outside { max, min } => (max, min),
    };
    if overall.is_infinite() || max.is_infinite() || min.is_infinite() {
        return overall.clamp(min, max);
    }

    let width = max - min;
    let t = (overall - min).rem_euclid(width);
    if t == 0.0 {
        // Whole multiples of the band land on the bound they crossed.
        return if overall > max { max } else { min };
    }
    min + t
}

/// Triangle-wave fold of `overall` into `[min, max]`.
///
/// With one open side the value is reflected once off the finite bound.
pub fn reverse(overall: f64, max: f64, min: f64) -> f64 {
    let (max, min) = match normalise(overall, max, min) {
        Band::Done(v) => return v,
        Band::Outside { max, min } => (max, min),
    };
    if overall.is_infinite() {
        return overall.clamp(min, max);
    }
    if max.is_infinite() && min.is_infinite() {
        return overall;
    }
    if max.is_infinite() {
        return 2.0 * min - overall;
    }
    if min.is_infinite() {
        return 2.0 * max - overall;
    }

    let width = max - min;
    let p = (overall - min).rem_euclid(2.0 * width);
    if p <= width { min + p } else { max - (p - width) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INF: f64 = f64::INFINITY;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn hold_clamps() {
        assert_eq!(hold(120.0, 100.0, 0.0), 100.0);
        assert_eq!(hold(-3.0, 100.0, 0.0), 0.0);
        assert_eq!(hold(42.0, 100.0, 0.0), 42.0);
        assert_eq!(hold(1e12, 100.0, 0.0), 100.0);
    }

    #[test]
    fn loop_wraps_like_a_sawtooth() {
        assert!(close(loop_around(370.0, 360.0, 0.0), 10.0));
        assert!(close(loop_around(-10.0, 360.0, 0.0), 350.0));
        assert!(close(loop_around(450.0, 360.0, 0.0), 90.0));
        assert_eq!(loop_around(720.0, 360.0, 0.0), 360.0);
        assert_eq!(loop_around(-360.0, 360.0, 0.0), 0.0);
    }

    #[test]
    fn loop_handles_negative_min() {
        // Band of width 360 centred on zero.
        assert!(close(loop_around(190.0, 180.0, -180.0), -170.0));
        assert!(close(loop_around(-190.0, 180.0, -180.0), 170.0));
    }

    #[test]
    fn reverse_folds_back() {
        assert!(close(reverse(110.0, 100.0, 0.0), 90.0));
        assert!(close(reverse(-10.0, 100.0, 0.0), 10.0));
        assert!(close(reverse(210.0, 100.0, 0.0), 10.0));
        assert!(close(reverse(200.0, 100.0, 0.0), 0.0));
    }

    #[test]
    fn open_sides() {
        assert_eq!(loop_around(1e9, INF, 0.0), 1e9);
        assert_eq!(loop_around(-5.0, INF, 0.0), 0.0);
        assert_eq!(loop_around(5.0, 0.0, -INF), 0.0);
        assert_eq!(reverse(-5.0, INF, 0.0), 5.0);
        assert_eq!(reverse(7.0, 5.0, -INF), 3.0);
        assert_eq!(reverse(-1e6, INF, -INF), -1e6);
        assert_eq!(hold(0.05, INF, 0.1), 0.1);
    }

    #[test]
    fn degenerate_bounds() {
        assert_eq!(loop_around(17.0, 5.0, 5.0), 5.0);
        assert_eq!(reverse(17.0, 5.0, 5.0), 5.0);
        // Swapped bounds behave like the ordered band.
        assert!(close(loop_around(370.0, 0.0, 360.0), 10.0));
        assert!(loop_around(f64::NAN, 1.0, 0.0).is_nan());
    }

    #[test]
    fn infinite_values_hold_at_the_crossed_bound() {
        for policy in [Breakpoint::Hold, Breakpoint::Loop, Breakpoint::Reverse] {
            assert_eq!(policy.apply(INF, 360.0, 0.0), 360.0, "{policy}");
            assert_eq!(policy.apply(-INF, 360.0, 0.0), 0.0, "{policy}");
            assert_eq!(policy.apply(-INF, INF, 0.1), 0.1, "{policy}");
            assert_eq!(policy.apply(INF, 5.0, -INF), 5.0, "{policy}");
        }
    }

    #[test]
    fn parse_policy_names() {
        assert_eq!("Loop".parse::<Breakpoint>(), Ok(Breakpoint::Loop));
        assert_eq!(" hold ".parse::<Breakpoint>(), Ok(Breakpoint::Hold));
        assert!("bounce".parse::<Breakpoint>().is_err());
        assert_eq!(Breakpoint::Reverse.to_string(), "reverse");
    }
}
