//! Integration tests: boundary policies swept across every sign combination
//! of the band (positive-only, straddling zero, negative-only, open sides).

use recur_core::breakpoint::{Breakpoint, hold, loop_around, reverse};

const EPS: f64 = 1e-9;

/// Finite bands covering the four sign quadrants.
const BANDS: [(f64, f64); 4] = [
    (50.0, 10.0),    // positive only
    (30.0, -20.0),   // straddles zero
    (-10.0, -80.0),  // negative only
    (360.0, 0.0),    // starts at zero
];

fn sweep(min: f64, max: f64) -> impl Iterator<Item = f64> {
    let width = max - min;
    let start = min - 3.0 * width;
    (0..=1200).map(move |i| start + i as f64 * (7.0 * width / 1200.0))
}

#[test]
fn every_policy_stays_inside_the_band() {
    for (max, min) in BANDS {
        for v in sweep(min, max) {
            for policy in [Breakpoint::Hold, Breakpoint::Loop, Breakpoint::Reverse] {
                let out = policy.apply(v, max, min);
                assert!(
                    out >= min - EPS && out <= max + EPS,
                    "{policy}({v}, {max}, {min}) = {out}"
                );
            }
        }
    }
}

#[test]
fn values_inside_the_band_are_untouched() {
    for (max, min) in BANDS {
        for v in sweep(min, max).filter(|v| *v >= min && *v <= max) {
            assert_eq!(hold(v, max, min), v);
            assert_eq!(loop_around(v, max, min), v);
            assert_eq!(reverse(v, max, min), v);
        }
    }
}

#[test]
fn bounds_are_fixed_points() {
    for (max, min) in BANDS {
        for policy in [Breakpoint::Hold, Breakpoint::Loop, Breakpoint::Reverse] {
            assert_eq!(policy.apply(max, max, min), max);
            assert_eq!(policy.apply(min, max, min), min);
        }
    }
}

#[test]
fn reverse_reflects_about_both_bounds() {
    for (max, min) in BANDS {
        let width = max - min;
        for step in 1..20 {
            let d = width * step as f64 / 20.0;
            let above = reverse(max + d, max, min);
            let below = reverse(max - d, max, min);
            assert!((above - below).abs() < EPS, "max reflection at d={d}");

            let under = reverse(min - d, max, min);
            let over = reverse(min + d, max, min);
            assert!((under - over).abs() < EPS, "min reflection at d={d}");
        }
    }
}

#[test]
fn reverse_and_hold_are_continuous() {
    for (max, min) in BANDS {
        let points: Vec<f64> = sweep(min, max).collect();
        let step = points[1] - points[0];
        for pair in points.windows(2) {
            for f in [hold, reverse] {
                let jump = (f(pair[1], max, min) - f(pair[0], max, min)).abs();
                assert!(jump <= step + EPS, "jump of {jump} between {pair:?}");
            }
        }
    }
}

#[test]
fn loop_only_jumps_at_the_wrap_point() {
    for (max, min) in BANDS {
        let width = max - min;
        let points: Vec<f64> = sweep(min, max).collect();
        let step = points[1] - points[0];
        for pair in points.windows(2) {
            let a = loop_around(pair[0], max, min);
            let b = loop_around(pair[1], max, min);
            let jump = (b - a).abs();
            // Either a small move, or a wrap of almost one full band.
            assert!(
                jump <= step + EPS || (jump - width).abs() <= step + EPS,
                "loop jumped {jump} between {pair:?}"
            );
        }
    }
}

#[test]
fn loop_preserves_overshoot_modulo_the_band() {
    for (max, min) in BANDS {
        let width = max - min;
        let overshoot = width * 0.25;
        let out = loop_around(max + overshoot, max, min);
        assert!((out - (min + overshoot)).abs() < EPS);
        let out = loop_around(min - overshoot, max, min);
        assert!((out - (max - overshoot)).abs() < EPS);
    }
}

#[test]
fn open_bands_never_wrap() {
    let inf = f64::INFINITY;
    for v in [-1e6, -3.0, 0.0, 4.5, 1e9] {
        let looped = loop_around(v, inf, 0.0);
        let reversed = reverse(v, inf, 0.0);
        if v >= 0.0 {
            assert_eq!(looped, v);
            assert_eq!(reversed, v);
        } else {
            assert_eq!(looped, 0.0);
            assert_eq!(reversed, -v);
        }
    }
}
