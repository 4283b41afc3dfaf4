// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Closed-form analysis windows (§4.3). `Kaiser` and `Tukey` fall back to the
//! Hamming coefficients; their native shapes are reserved but not implemented.

use crate::config::WindowType;
use std::f64::consts::PI;

/// Builds an `n`-long real-valued window.
pub fn generate(window_type: WindowType, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let m = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let x = i as f64;
            match window_type {
                WindowType::Rectangular => 1.0,
                WindowType::Hann => 0.5 * (1.0 - (2.0 * PI * x / m).cos()),
                WindowType::Hamming | WindowType::Kaiser | WindowType::Tukey => {
                    0.54 - 0.46 * (2.0 * PI * x / m).cos()
                }
                WindowType::Blackman => {
                    0.42 - 0.5 * (2.0 * PI * x / m).cos() + 0.08 * (4.0 * PI * x / m).cos()
                }
                WindowType::FlatTop => {
                    1.0 - 1.93 * (2.0 * PI * x / m).cos() + 1.29 * (4.0 * PI * x / m).cos()
                        - 0.388 * (6.0 * PI * x / m).cos()
                        + 0.032 * (8.0 * PI * x / m).cos()
                }
                WindowType::Bartlett => 1.0 - ((x - m / 2.0) / (m / 2.0)).abs(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangular_is_all_ones() {
        let w = generate(WindowType::Rectangular, 8);
        assert!(w.iter().all(|&v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn hann_endpoints_are_zero() {
        let w = generate(WindowType::Hann, 8);
        assert!(w[0].abs() < 1e-12);
        assert!(w[7].abs() < 1e-12);
    }

    #[test]
    fn hamming_is_symmetric() {
        let w = generate(WindowType::Hamming, 9);
        for i in 0..w.len() {
            assert!((w[i] - w[w.len() - 1 - i]).abs() < 1e-9);
        }
    }

    #[test]
    fn kaiser_and_tukey_fall_back_to_hamming() {
        let hamming = generate(WindowType::Hamming, 10);
        assert_eq!(generate(WindowType::Kaiser, 10), hamming);
        assert_eq!(generate(WindowType::Tukey, 10), hamming);
    }

    #[test]
    fn enbw_positive_and_finite_for_every_window() {
        for wt in [
            WindowType::Rectangular,
            WindowType::Hann,
            WindowType::Hamming,
            WindowType::Blackman,
            WindowType::FlatTop,
            WindowType::Kaiser,
            WindowType::Tukey,
            WindowType::Bartlett,
        ] {
            let e = wt.enbw();
            assert!(e > 0.0 && e.is_finite());
        }
    }
}
