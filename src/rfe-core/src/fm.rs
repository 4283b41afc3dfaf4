// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Narrowband FM demodulator: phase-difference discriminator, decimation,
//! de-emphasis, DC blocker, and a fixed-cutoff biquad low-pass (§4.6, C7).

use num_complex::Complex64;
use std::f64::consts::PI;

const DC_BLOCK_R: f64 = 0.996;
const LPF_CUTOFF_HZ: f64 = 12_000.0;
const LPF_Q: f64 = 0.707;

/// Construction parameters for a `FmRadio` instance.
#[derive(Debug, Clone, Copy)]
pub struct FmRadioConfig {
    pub fs_in_hz: f64,
    pub fs_audio_hz: f64,
    pub deemph_us: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct DcBlocker {
    x1: f64,
    y1: f64,
}

impl DcBlocker {
    fn process(&mut self, x: f64) -> f64 {
        let y = x - self.x1 + DC_BLOCK_R * self.y1;
        self.x1 = x;
        self.y1 = y;
        y
    }
}

/// RBJ cookbook second-order low-pass, Direct Form II transposed.
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    fn low_pass(fs: f64, cutoff_hz: f64, q: f64) -> Self {
        let omega = 2.0 * PI * cutoff_hz / fs;
        let alpha = omega.sin() / (2.0 * q);
        let cos_omega = omega.cos();

        let a0 = 1.0 + alpha;
        let b0 = (1.0 - cos_omega) / 2.0 / a0;
        let b1 = (1.0 - cos_omega) / a0;
        let b2 = b0;
        let a1 = -2.0 * cos_omega / a0;
        let a2 = (1.0 - alpha) / a0;

        Biquad {
            b0,
            b1,
            b2,
            a1,
            a2,
            z1: 0.0,
            z2: 0.0,
        }
    }

    fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

/// Owned FM demodulator state, driven by a single audio thread (§3).
pub struct FmRadio {
    prev: Complex64,
    audio_acc: f64,
    samples_in_acc: u32,
    decim_factor: u32,
    deemph_acc: f64,
    deemph_alpha: f64,
    gain: f64,
    dc_block: DcBlocker,
    biquad: Biquad,
}

impl FmRadio {
    pub fn new(cfg: FmRadioConfig) -> Self {
        let decim_factor = (cfg.fs_in_hz / cfg.fs_audio_hz).round().max(1.0) as u32;
        let tau = cfg.deemph_us * 1e-6;
        let dt = 1.0 / cfg.fs_audio_hz;
        let deemph_alpha = dt / (tau + dt);

        FmRadio {
            prev: Complex64::new(1.0, 0.0),
            audio_acc: 0.0,
            samples_in_acc: 0,
            decim_factor,
            deemph_acc: 0.0,
            deemph_alpha,
            gain: 60000.0,
            dc_block: DcBlocker::default(),
            biquad: Biquad::low_pass(cfg.fs_audio_hz, LPF_CUTOFF_HZ, LPF_Q),
        }
    }

    /// Demodulates `samples`, returning one PCM16 sample per `decim_factor` inputs.
    pub fn process(&mut self, samples: &[Complex64]) -> Vec<i16> {
        let mut out = Vec::with_capacity(samples.len() / self.decim_factor as usize + 1);
        for &x in samples {
            let diff = x * self.prev.conj();
            let angle = diff.im.atan2(diff.re);
            self.prev = x;

            self.audio_acc += angle;
            self.samples_in_acc += 1;

            if self.samples_in_acc >= self.decim_factor {
                let v = self.audio_acc / self.samples_in_acc as f64;
                self.audio_acc = 0.0;
                self.samples_in_acc = 0;

                self.deemph_acc += self.deemph_alpha * (v - self.deemph_acc);
                let mut a = self.deemph_acc;
                a = self.dc_block.process(a);
                a = self.biquad.process(a);

                let pcm = (a * self.gain).clamp(-32768.0, 32767.0);
                out.push(pcm as i16);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_3_first_sample_matches_worked_example() {
        let cfg = FmRadioConfig {
            fs_in_hz: 48_000.0,
            fs_audio_hz: 48_000.0,
            deemph_us: 75.0,
        };
        let mut radio = FmRadio::new(cfg);
        // `prev` starts at 1+0j, matching n = 0 exactly, so that sample alone
        // yields a zero phase difference. The first non-trivial transition is
        // n = 0 -> n = 1.
        let samples: Vec<Complex64> = (0..48)
            .map(|n| Complex64::new(0.0, 0.1 * n as f64).exp())
            .collect();
        let out = radio.process(&samples[..2]);

        let tau = 75.0e-6;
        let dt = 1.0 / 48_000.0;
        let deemph_alpha = dt / (tau + dt);
        // angle(n=0 -> n=1) = atan2(sin(0.1), cos(0.1)) = 0.1.
        // DC blocker passes the first nonzero sample through unchanged
        // (x1 = y1 = 0 at n = 0), and the biquad's first nonzero output is
        // just its b0 coefficient times input.
        let deemph = deemph_alpha * 0.1;
        let b0 = {
            let omega = 2.0 * PI * LPF_CUTOFF_HZ / 48_000.0;
            let alpha = omega.sin() / (2.0 * LPF_Q);
            let cos_omega = omega.cos();
            (1.0 - cos_omega) / 2.0 / (1.0 + alpha)
        };
        let raw: f64 = b0 * deemph * 60000.0;
        let expected = raw.clamp(-32768.0, 32767.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], 0);
        assert!((out[1] as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn decim_factor_clamped_to_at_least_one() {
        let cfg = FmRadioConfig {
            fs_in_hz: 1000.0,
            fs_audio_hz: 48_000.0,
            deemph_us: 75.0,
        };
        let radio = FmRadio::new(cfg);
        assert_eq!(radio.decim_factor, 1);
    }

    #[test]
    fn constant_instantaneous_frequency_yields_steady_state_output() {
        let cfg = FmRadioConfig {
            fs_in_hz: 48_000.0,
            fs_audio_hz: 48_000.0,
            deemph_us: 75.0,
        };
        let mut radio = FmRadio::new(cfg);
        let delta_f = 0.05;
        let samples: Vec<Complex64> = (0..4000)
            .map(|n| Complex64::new(0.0, delta_f * n as f64).exp())
            .collect();
        let out = radio.process(&samples);
        let tail = &out[out.len() - 200..];
        let mean = tail.iter().map(|&v| v as f64).sum::<f64>() / tail.len() as f64;
        let variance = tail
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / tail.len() as f64;
        assert!(variance.sqrt() < mean.abs().max(1.0) * 0.05);
    }

    #[test]
    fn output_length_divides_by_decim_factor() {
        let cfg = FmRadioConfig {
            fs_in_hz: 192_000.0,
            fs_audio_hz: 48_000.0,
            deemph_us: 75.0,
        };
        let mut radio = FmRadio::new(cfg);
        let samples = vec![Complex64::new(1.0, 0.0); 401];
        let out = radio.process(&samples);
        assert_eq!(out.len(), 401 / 4);
    }
}
