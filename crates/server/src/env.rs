// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server crate.

use std::time::Duration;

/// Server version reported in the MCP handshake (from Cargo.toml).
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default per-call tool timeout (override: `ILDBG_TOOL_TIMEOUT_MS`).
pub fn tool_timeout() -> Duration {
    std::env::var("ILDBG_TOOL_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// Funceval deadline (override: `ILDBG_EVAL_TIMEOUT_MS`).
pub fn eval_timeout() -> Duration {
    std::env::var("ILDBG_EVAL_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(5000))
}

/// Default `EnvFilter` directive when `--log-level`/`ILDBG_LOG` are unset.
pub fn log_directive() -> String {
    std::env::var("ILDBG_LOG").unwrap_or_else(|_| "info".to_string())
}
