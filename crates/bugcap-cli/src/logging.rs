// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the bugcap CLI.
//!
//! Uses `tracing` with `tracing-subscriber`, writing to stderr so stdout
//! stays clean for payloads. `RUST_LOG` overrides the default filter.
//!
//! # Examples
//!
//! ```bash
//! # Stage timings and token usage
//! RUST_LOG=bugcap=info bugcap suggest --project PMT --logs console.log
//!
//! # Prompts, extraction strategies and retries
//! RUST_LOG=bugcap=debug bugcap suggest --project PMT --logs console.log
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "bugcap=debug,bugcap_core=debug,reqwest=warn"
    } else {
        "bugcap=warn,bugcap_core=warn,reqwest=error"
    }
}

/// Initialize the logging subsystem.
///
/// `verbose` (the `-v` flag) raises the default level to debug.
pub fn init_logging(verbose: bool) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
