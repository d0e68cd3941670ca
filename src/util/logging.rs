//! Logging utilities for specprof
//!
//! Diagnostics go through `tracing` and are written to stderr, so they
//! never interleave with the report on stdout.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Raises the default log level to debug when set
pub const ENV_DEBUG: &str = "SPECPROF_DEBUG";

static INIT: Once = Once::new();

/// Initialize the tracing system
///
/// This function sets up tracing with an `EnvFilter` that:
/// - Honors the `RUST_LOG` environment variable if set
/// - Uses the `SPECPROF_DEBUG` environment variable to control logging level
/// - Only logs warnings and errors by default
///
/// A shim lives inside someone else's process; if the host already
/// installed a global subscriber, that one is kept.
pub fn init_logging() {
	INIT.call_once(|| {
		let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			if std::env::var_os(ENV_DEBUG).is_some() {
				EnvFilter::new("specprof_rs=debug")
			} else {
				EnvFilter::new("specprof_rs=warn")
			}
		});

		let _ = tracing_subscriber::registry()
			.with(fmt::layer().with_target(true).with_writer(std::io::stderr))
			.with(filter)
			.try_init();
	});
}
