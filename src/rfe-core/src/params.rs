// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Derives FFT sizing, overlap, and buffer targets from a requested RBW (§4.4, C6).

use crate::config::{DesiredCfg, HwConfig, PsdConfig};

const MIN_NPERSEG: usize = 256;

/// Parameters resolved from a `DesiredCfg` for one acquisition cycle.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedParams {
    pub psd_config: PsdConfig,
    pub hw_config: HwConfig,
    pub total_bytes: usize,
}

impl ResolvedParams {
    pub fn resolve(cfg: &DesiredCfg) -> Self {
        let enbw = cfg.window_type.enbw();
        let rbw_safe = if cfg.rbw_hz > 0.0 { cfg.rbw_hz } else { 1000.0 };
        let nperseg_need = enbw * cfg.sample_rate_hz / rbw_safe;

        let nperseg = next_pow2_at_least(nperseg_need, MIN_NPERSEG);
        let noverlap = ((nperseg as f64) * cfg.overlap.clamp(0.0, 1.0)) as usize;
        let noverlap = noverlap.min(nperseg.saturating_sub(1));

        let total_bytes = (2.0 * cfg.sample_rate_hz) as usize;

        ResolvedParams {
            psd_config: PsdConfig {
                window_type: cfg.window_type,
                sample_rate_hz: cfg.sample_rate_hz,
                nperseg,
                noverlap,
            },
            hw_config: HwConfig::from_desired(cfg),
            total_bytes,
        }
    }
}

fn next_pow2_at_least(need: f64, floor: usize) -> usize {
    if need <= floor as f64 {
        return floor;
    }
    let mut n = floor;
    while (n as f64) < need {
        n *= 2;
    }
    n
}
