// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Welch-method power spectral density estimation (§4.2, C4).
//!
//! Grounded in the fftshift/magnitude idiom of this codebase's existing
//! spectrum snapshotter, extended with segment averaging, overlap, Welch
//! normalization, and DC-spike repair per the resolved algorithm.

use crate::config::PsdConfig;
use crate::window;
use num_complex::Complex64;
use rustfft::FftPlanner;

/// Output of a single Welch PSD invocation: `nfft` bins each, fftshifted.
#[derive(Debug, Clone)]
pub struct PsdResult {
    pub f_out: Vec<f64>,
    pub p_out: Vec<f64>,
}

/// Runs the Welch PSD algorithm of §4.2 over `x`. Returns an all-zero result
/// (still valid, still publishable) if `x` is shorter than `cfg.nperseg`.
pub fn execute_welch_psd(x: &[Complex64], cfg: &PsdConfig) -> PsdResult {
    let nfft = cfg.nperseg;
    let mut p_out = vec![0.0f64; nfft];
    let mut f_out = vec![0.0f64; nfft];

    let fs = cfg.sample_rate_hz;
    for (i, f) in f_out.iter_mut().enumerate() {
        *f = -fs / 2.0 + i as f64 * (fs / nfft as f64);
    }

    if nfft == 0 {
        return PsdResult { f_out, p_out };
    }

    let step = (cfg.nperseg.saturating_sub(cfg.noverlap)).max(1);
    let n = x.len();
    let k_count = if n >= cfg.nperseg {
        (n - cfg.nperseg) / step + 1
    } else {
        0
    };

    let w = window::generate(cfg.window_type, cfg.nperseg);
    let s2 = w.iter().map(|v| v * v).sum::<f64>() / cfg.nperseg as f64;

    if k_count == 0 {
        return PsdResult { f_out, p_out };
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nfft);
    let mut scratch = vec![Complex64::new(0.0, 0.0); nfft];

    for k in 0..k_count {
        let start = k * step;
        for i in 0..nfft {
            let sample = start + i;
            scratch[i] = if sample < n {
                x[sample] * w[i]
            } else {
                Complex64::new(0.0, 0.0)
            };
        }
        fft.process(&mut scratch);
        for (bin, acc) in scratch.iter().zip(p_out.iter_mut()) {
            *acc += bin.norm_sqr();
        }
    }

    if s2 > 0.0 {
        let scale = 1.0 / (fs * s2 * k_count as f64 * nfft as f64);
        for v in p_out.iter_mut() {
            *v *= scale;
        }
    }

    fftshift(&mut p_out);
    repair_dc_spike(&mut p_out);

    PsdResult { f_out, p_out }
}

/// Rotates `buf` by `len/2` so bin 0 carries the most negative frequency.
/// Applying this twice to an even-length buffer recovers the original.
pub fn fftshift(buf: &mut [f64]) {
    let half = buf.len() / 2;
    buf.rotate_left(half);
}

/// Replaces the center `2h` bins around DC with the average of their
/// immediate outer neighbors (§4.2 step 7).
fn repair_dc_spike(p_out: &mut [f64]) {
    let nfft = p_out.len();
    if nfft == 0 {
        return;
    }
    let c = nfft / 2;
    let h = ((nfft as f64 * 0.0025) as usize).max(1);

    if c < h + 1 || c + h + 1 >= nfft {
        return;
    }
    let lo = c - h - 1;
    let hi = c + h + 1;
    let m = (p_out[lo] + p_out[hi]) / 2.0;
    for v in &mut p_out[c - h..c + h] {
        *v = m;
    }
}
