// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Raw-power-to-unit scaling under a fixed reference impedance (§4.5, C5).

use crate::config::ScaleUnit;

const REFERENCE_IMPEDANCE: f64 = 50.0;
const POWER_FLOOR: f64 = 1e-20;

/// Scales a single raw power bin (already Welch-normalized) to the requested unit.
pub fn scale_psd(raw: f64, unit: ScaleUnit) -> f64 {
    let p_w = (raw / REFERENCE_IMPEDANCE).max(POWER_FLOOR);
    let v_dbm = 10.0 * (p_w * 1000.0).log10();
    match unit {
        ScaleUnit::Dbm => v_dbm,
        ScaleUnit::Dbuv => v_dbm + 107.0,
        ScaleUnit::Dbmv => v_dbm + 47.0,
        ScaleUnit::Watts => p_w,
        ScaleUnit::Volts => (p_w * REFERENCE_IMPEDANCE).sqrt(),
    }
}

/// Scales an entire PSD bin array in place.
pub fn scale_psd_bins(bins: &mut [f64], unit: ScaleUnit) {
    for b in bins.iter_mut() {
        *b = scale_psd(*b, unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dbm_matches_worked_example() {
        let v = scale_psd(50.0, ScaleUnit::Dbm);
        assert!((v - 30.0).abs() < 1e-9);
    }

    #[test]
    fn dbuv_matches_worked_example() {
        let v = scale_psd(50.0, ScaleUnit::Dbuv);
        assert!((v - 137.0).abs() < 1e-9);
    }

    #[test]
    fn watts_matches_worked_example() {
        let v = scale_psd(50.0, ScaleUnit::Watts);
        assert!((v - 1.0).abs() < 1e-9);
    }

    #[test]
    fn volts_matches_worked_example() {
        let v = scale_psd(50.0, ScaleUnit::Volts);
        assert!((v - 7.0710678).abs() < 1e-6);
    }

    #[test]
    fn dbm_is_strictly_monotonic_above_floor() {
        let a = scale_psd(10.0, ScaleUnit::Dbm);
        let b = scale_psd(20.0, ScaleUnit::Dbm);
        assert!(b > a);
    }
}
