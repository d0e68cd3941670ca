//! Shim configuration
//!
//! What a shim measures and reports. The target itself is never runtime
//! configurable; only these knobs are, through the builder methods or the
//! `SPECPROF_*` environment variables.

use once_cell::sync::Lazy;

/// Disables the exit report when set
pub const ENV_NO_REPORT: &str = "SPECPROF_NO_REPORT";
/// Enables a trace event around every forwarded call when set
pub const ENV_TRACE_CALLS: &str = "SPECPROF_TRACE_CALLS";

/// Environment overrides, read once per process
static ENV_OVERRIDES: Lazy<EnvOverrides> = Lazy::new(EnvOverrides::read);

#[derive(Debug, Clone, Copy, Default)]
struct EnvOverrides {
	no_report: bool,
	trace_calls: bool,
}

impl EnvOverrides {
	fn read() -> Self {
		Self {
			no_report: env_flag(ENV_NO_REPORT),
			trace_calls: env_flag(ENV_TRACE_CALLS),
		}
	}
}

fn env_flag(name: &str) -> bool {
	std::env::var_os(name).is_some_and(|value| !matches!(value.to_str(), Some("" | "0" | "false")))
}

/// Configuration for a shim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShimConfig {
	/// Whether to measure thread CPU time alongside wall time
	pub cpu_time: bool,
	/// Whether to print the report at shutdown
	pub report: bool,
	/// Whether to emit a trace event around every forwarded call
	pub trace_calls: bool,
	/// Whether the load-time hook resolves the target right away
	pub eager: bool,
}

impl Default for ShimConfig {
	fn default() -> Self {
		Self::new()
	}
}

impl ShimConfig {
	/// Create a configuration with default settings
	#[must_use]
	pub const fn new() -> Self {
		Self {
			cpu_time: true,
			report: true,
			trace_calls: false,
			eager: true,
		}
	}

	/// Enable or disable CPU time measurement
	#[must_use]
	pub const fn cpu_time(mut self, enabled: bool) -> Self {
		self.cpu_time = enabled;
		self
	}

	/// Enable or disable the exit report
	#[must_use]
	pub const fn report(mut self, enabled: bool) -> Self {
		self.report = enabled;
		self
	}

	/// Enable or disable per-call trace events
	#[must_use]
	pub const fn trace_calls(mut self, enabled: bool) -> Self {
		self.trace_calls = enabled;
		self
	}

	/// Resolve at load time (`true`) or on the first call (`false`)
	#[must_use]
	pub const fn eager(mut self, enabled: bool) -> Self {
		self.eager = enabled;
		self
	}

	/// Apply the `SPECPROF_*` environment overrides
	#[must_use]
	pub fn apply_env(self) -> Self {
		let env = *ENV_OVERRIDES;
		Self {
			report: self.report && !env.no_report,
			trace_calls: self.trace_calls || env.trace_calls,
			..self
		}
	}
}
