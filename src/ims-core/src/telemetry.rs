// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! Process-wide tracing setup. Domain crates never construct their own
//! subscriber; they only ever call `tracing::{debug,info,warn,error}!`, and
//! whoever owns `main` calls [`init_tracing`] once at startup.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing_subscriber::fmt` subscriber with an `EnvFilter`
/// defaulting to `info` when `RUST_LOG` is unset.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
