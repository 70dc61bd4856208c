// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Subscriber setup for binaries and tests embedding a network.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Filter variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "REGIONNET_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a stdout fmt subscriber. Later calls leave the first one in place.
pub fn init() {
    let installed = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Logging initialized");
    }
}
