// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Real-time data plane for a single-device SDR acquisition and DSP engine:
//! ring buffers, Welch PSD estimation, and the narrowband FM audio chain.

pub mod config;
pub mod fm;
pub mod iq;
pub mod params;
pub mod psd;
pub mod ring_buffer;
pub mod scale;
pub mod window;

/// Error type for fallible operations whose callers only need to log and retry.
pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use config::{DesiredCfg, HwConfig, PsdConfig, RfMode, ScaleUnit, WindowType};
pub use fm::{FmRadio, FmRadioConfig};
pub use iq::decode_iq;
pub use params::ResolvedParams;
pub use psd::{execute_welch_psd, PsdResult};
pub use ring_buffer::RingBuffer;
