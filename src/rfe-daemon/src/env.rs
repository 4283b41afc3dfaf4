// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! `.env`-backed environment lookup and process bootstrap configuration (§6, §10.3).
//!
//! A minimal line-oriented reader, not a full dotenv implementation: no
//! quoting, no multi-line values, no `export` keyword. An `.env` value takes
//! precedence over an unset process environment variable.

use std::fs;
use std::path::Path;

/// Looks up `key` in `./.env` (if present), falling back to the process environment.
pub fn getenv(key: &str) -> Option<String> {
    if let Some(v) = read_dotenv(Path::new(".env"), key) {
        return Some(v);
    }
    std::env::var(key).ok()
}

fn read_dotenv(path: &Path, key: &str) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let prefix = format!("{key}=");
    for line in content.lines() {
        if let Some(value) = line.strip_prefix(&prefix) {
            return Some(value.trim_end().to_string());
        }
    }
    None
}

/// Bootstrap configuration read once at process start (§6).
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub verbose: bool,
    pub ipc_addr: String,
    pub audio_tcp_host: String,
    pub audio_tcp_port: u16,
    pub opus_frame_ms: u32,
    pub opus_bitrate: u32,
    pub opus_complexity: u32,
    pub opus_vbr: bool,
}

const AUDIO_FS_DEFAULT: u32 = 48_000;

impl BootstrapConfig {
    pub fn from_env() -> Self {
        BootstrapConfig {
            verbose: getenv("VERBOSE").as_deref() == Some("true"),
            ipc_addr: getenv("IPC_ADDR").unwrap_or_else(|| "ipc:///tmp/rf_engine".to_string()),
            audio_tcp_host: getenv("AUDIO_TCP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            audio_tcp_port: getenv("AUDIO_TCP_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(9000),
            opus_frame_ms: getenv("OPUS_FRAME_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            opus_bitrate: getenv("OPUS_BITRATE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(32_000),
            opus_complexity: getenv("OPUS_COMPLEXITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            opus_vbr: getenv("OPUS_VBR").as_deref() == Some("true"),
        }
    }

    pub fn audio_fs_hz(&self) -> u32 {
        AUDIO_FS_DEFAULT
    }

    pub fn opus_frame_samples(&self) -> u32 {
        self.audio_fs_hz() * self.opus_frame_ms / 1000
    }
}
