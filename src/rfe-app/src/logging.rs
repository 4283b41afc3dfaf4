// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging. `verbose` maps to `DEBUG`, otherwise `INFO` — this
/// engine's `VERBOSE` environment flag is boolean, not a level string.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(level)
        .init();
}
