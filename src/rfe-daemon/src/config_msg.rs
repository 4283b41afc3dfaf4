// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Parses the JSON-like control-plane configuration payload (§6) into a
//! `DesiredCfg`. Unknown enum tags silently normalize to their default
//! (§7); a message with both `center_freq_hz` and `sample_rate_hz` absent
//! or zero is rejected outright.

use rfe_core::{DesiredCfg, RfMode, ScaleUnit, WindowType};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("center_freq_hz and sample_rate_hz are both zero")]
    NoFrequencyInfo,
}

fn get_f64(v: &Value, key: &str, default: f64) -> f64 {
    v.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn get_u64(v: &Value, key: &str, default: u64) -> u64 {
    v.get(key).and_then(Value::as_u64).unwrap_or(default)
}

fn get_i32(v: &Value, key: &str, default: i32) -> i32 {
    v.get(key)
        .and_then(Value::as_i64)
        .map(|n| n as i32)
        .unwrap_or(default)
}

fn get_bool(v: &Value, key: &str, default: bool) -> bool {
    v.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn get_tag<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str)
}

/// Parses one control-plane message into a `DesiredCfg`.
pub fn parse_desired_cfg(payload: &[u8]) -> Result<DesiredCfg, ConfigParseError> {
    let v: Value = serde_json::from_slice(payload)?;

    let center_freq_hz = get_u64(&v, "center_freq_hz", 0);
    let sample_rate_hz = get_f64(&v, "sample_rate_hz", 0.0);
    if center_freq_hz == 0 && sample_rate_hz == 0.0 {
        return Err(ConfigParseError::NoFrequencyInfo);
    }

    Ok(DesiredCfg {
        rf_mode: get_tag(&v, "rf_mode").map(RfMode::from_tag).unwrap_or_default(),
        center_freq_hz,
        sample_rate_hz,
        span_hz: get_f64(&v, "span", sample_rate_hz),
        lna_gain: get_i32(&v, "lna_gain", 16),
        vga_gain: get_i32(&v, "vga_gain", 16),
        amp_enabled: get_bool(&v, "antenna_amp", false),
        antenna_port: get_i32(&v, "antenna_port", 0),
        rbw_hz: get_f64(&v, "rbw_hz", 1000.0),
        overlap: get_f64(&v, "overlap", 0.5),
        window_type: get_tag(&v, "window").map(WindowType::from_tag).unwrap_or_default(),
        scale: get_tag(&v, "scale").map(ScaleUnit::from_tag).unwrap_or_default(),
        ppm_error: get_i32(&v, "ppm_error", 0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_message() {
        let json = br#"{
            "rf_mode": "FM",
            "center_freq_hz": 100000000,
            "sample_rate_hz": 2000000,
            "span": 2000000,
            "rbw_hz": 1000,
            "overlap": 0.5,
            "window": "hamming",
            "scale": "dbm",
            "lna_gain": 24,
            "vga_gain": 20,
            "antenna_amp": true,
            "antenna_port": 1,
            "ppm_error": 2
        }"#;
        let cfg = parse_desired_cfg(json).unwrap();
        assert_eq!(cfg.rf_mode, RfMode::Fm);
        assert_eq!(cfg.center_freq_hz, 100_000_000);
        assert!(cfg.amp_enabled);
    }

    #[test]
    fn unknown_tags_normalize_to_default() {
        let json = br#"{"center_freq_hz": 1, "window": "bogus", "scale": "bogus", "rf_mode": "bogus"}"#;
        let cfg = parse_desired_cfg(json).unwrap();
        assert_eq!(cfg.window_type, WindowType::Hamming);
        assert_eq!(cfg.scale, ScaleUnit::Dbm);
        assert_eq!(cfg.rf_mode, RfMode::Realtime);
    }

    #[test]
    fn rejects_when_both_frequencies_are_zero() {
        let json = br#"{"center_freq_hz": 0, "sample_rate_hz": 0}"#;
        assert!(matches!(
            parse_desired_cfg(json),
            Err(ConfigParseError::NoFrequencyInfo)
        ));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_desired_cfg(b"not json").is_err());
    }
}
