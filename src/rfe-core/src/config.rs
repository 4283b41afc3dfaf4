// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration data model shared by the control link and the supervisor.

use serde::{Deserialize, Serialize};

/// Analysis window shapes (§4.3). `Kaiser` and `Tukey` are accepted tags but
/// fall back to the Hamming coefficients; their native shapes are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowType {
    Rectangular,
    Hann,
    Hamming,
    Blackman,
    FlatTop,
    Kaiser,
    Tukey,
    Bartlett,
}

impl Default for WindowType {
    fn default() -> Self {
        WindowType::Hamming
    }
}

impl WindowType {
    /// Parse a lowercased control-link tag, defaulting to Hamming on anything unrecognized.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "rectangular" => WindowType::Rectangular,
            "hann" => WindowType::Hann,
            "hamming" => WindowType::Hamming,
            "blackman" => WindowType::Blackman,
            "flat-top" | "flattop" | "flat_top" => WindowType::FlatTop,
            "kaiser" => WindowType::Kaiser,
            "tukey" => WindowType::Tukey,
            "bartlett" => WindowType::Bartlett,
            _ => WindowType::Hamming,
        }
    }

    /// Equivalent noise bandwidth factor used by the parameter resolver (§4.3, §4.4).
    pub fn enbw(self) -> f64 {
        match self {
            WindowType::Rectangular => 1.000,
            WindowType::Hamming => 1.363,
            WindowType::Hann => 1.500,
            WindowType::Blackman => 1.730,
            WindowType::FlatTop => 3.770,
            WindowType::Bartlett => 1.330,
            WindowType::Kaiser => 1.800,
            WindowType::Tukey => 1.500,
        }
    }
}

/// Output unit tag for the PSD scaler (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleUnit {
    Dbm,
    Dbuv,
    Dbmv,
    Watts,
    Volts,
}

impl Default for ScaleUnit {
    fn default() -> Self {
        ScaleUnit::Dbm
    }
}

impl ScaleUnit {
    /// Parse a lowercased control-link tag, defaulting to dBm on anything unrecognized.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "dbm" => ScaleUnit::Dbm,
            "dbuv" => ScaleUnit::Dbuv,
            "dbmv" => ScaleUnit::Dbmv,
            "w" | "watts" => ScaleUnit::Watts,
            "v" | "volts" => ScaleUnit::Volts,
            _ => ScaleUnit::Dbm,
        }
    }
}

/// Acquisition mode requested by the control plane. Parsed and carried but not
/// otherwise acted on by this core (§9 open question (c)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RfMode {
    Realtime,
    Campaign,
    Fm,
    Am,
}

impl Default for RfMode {
    fn default() -> Self {
        RfMode::Realtime
    }
}

impl RfMode {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "realtime" => RfMode::Realtime,
            "campaign" => RfMode::Campaign,
            "fm" => RfMode::Fm,
            "am" => RfMode::Am,
            _ => RfMode::Realtime,
        }
    }
}

/// Welch PSD invocation parameters (§3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PsdConfig {
    pub window_type: WindowType,
    pub sample_rate_hz: f64,
    pub nperseg: usize,
    pub noverlap: usize,
}

/// The full desired configuration as received from the control plane (§3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesiredCfg {
    pub rf_mode: RfMode,
    pub center_freq_hz: u64,
    pub sample_rate_hz: f64,
    pub span_hz: f64,
    pub lna_gain: i32,
    pub vga_gain: i32,
    pub amp_enabled: bool,
    pub antenna_port: i32,
    pub rbw_hz: f64,
    pub overlap: f64,
    pub window_type: WindowType,
    pub scale: ScaleUnit,
    pub ppm_error: i32,
}

impl Default for DesiredCfg {
    fn default() -> Self {
        DesiredCfg {
            rf_mode: RfMode::default(),
            center_freq_hz: 100_000_000,
            sample_rate_hz: 2_000_000.0,
            span_hz: 2_000_000.0,
            lna_gain: 16,
            vga_gain: 16,
            amp_enabled: false,
            antenna_port: 0,
            rbw_hz: 1000.0,
            overlap: 0.5,
            window_type: WindowType::default(),
            scale: ScaleUnit::default(),
            ppm_error: 0,
        }
    }
}

/// The subset of `DesiredCfg` actually delivered to the SDR driver (§3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HwConfig {
    pub center_freq_hz: u64,
    pub sample_rate_hz: f64,
    pub lna_gain: i32,
    pub vga_gain: i32,
    pub amp_enabled: bool,
    pub ppm_error: i32,
}

impl HwConfig {
    pub fn from_desired(cfg: &DesiredCfg) -> Self {
        HwConfig {
            center_freq_hz: cfg.center_freq_hz,
            sample_rate_hz: cfg.sample_rate_hz,
            lna_gain: cfg.lna_gain,
            vga_gain: cfg.vga_gain,
            amp_enabled: cfg.amp_enabled,
            ppm_error: cfg.ppm_error,
        }
    }

    /// Two configs are equal iff all six fields match, sample rate with a small tolerance (§3).
    pub fn roughly_eq(&self, other: &HwConfig) -> bool {
        self.center_freq_hz == other.center_freq_hz
            && (self.sample_rate_hz - other.sample_rate_hz).abs() < 1.0
            && self.lna_gain == other.lna_gain
            && self.vga_gain == other.vga_gain
            && self.amp_enabled == other.amp_enabled
            && self.ppm_error == other.ppm_error
    }
}
