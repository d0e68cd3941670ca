//! Shims
//!
//! A `Shim` is the process-wide state behind one intercepted function: the
//! target descriptor, the once-resolved handle to the original, the call
//! statistics and the report-once latch. It is an ordinary value so tests
//! can build independent instances; `#[interpose]` puts one in a `static`
//! and wires `on_load`/`shutdown` to the library's load and unload hooks.

mod config;
mod error;

pub use config::{ENV_NO_REPORT, ENV_TRACE_CALLS, ShimConfig};
pub use error::{Result, ShimError};

use crate::report::Report;
use crate::resolver::{ResolvedHandle, Signature, resolve};
use crate::stats::{CallTimer, Statistics, StatsSnapshot};
use crate::target::TargetDescriptor;
use once_cell::sync::OnceCell;
use std::process;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tracing::{debug, error, info, trace};

/// Interception state for one target function
///
/// `F` is the function pointer type of the original, e.g.
/// `unsafe extern "C" fn(i32, i32) -> i32`.
#[derive(Debug)]
pub struct Shim<F> {
	target: TargetDescriptor,
	config: ShimConfig,
	handle: OnceCell<ResolvedHandle<F>>,
	stats: Statistics,
	resolutions: AtomicU32,
	failed: AtomicBool,
	reported: AtomicBool,
}

impl<F: Signature> Shim<F> {
	/// Create a shim with default settings
	#[must_use]
	pub const fn new(target: TargetDescriptor) -> Self {
		Self::with_config(target, ShimConfig::new())
	}

	/// Create a shim with explicit settings
	#[must_use]
	pub const fn with_config(target: TargetDescriptor, config: ShimConfig) -> Self {
		Self {
			target,
			config,
			handle: OnceCell::new(),
			stats: Statistics::new(),
			resolutions: AtomicU32::new(0),
			failed: AtomicBool::new(false),
			reported: AtomicBool::new(false),
		}
	}

	#[must_use]
	pub const fn target(&self) -> &TargetDescriptor {
		&self.target
	}

	/// The configuration in effect, environment overrides included
	#[must_use]
	pub fn config(&self) -> ShimConfig {
		self.config.apply_env()
	}

	/// Load-time hook
	///
	/// Sets up logging and, unless the shim is lazy, resolves the target.
	pub fn on_load(&self) {
		crate::util::init_logging();
		debug!("Loading shim for {}", self.target);
		if self.config.eager {
			self.initialize();
		}
	}

	/// Resolve the target if that has not happened yet
	///
	/// Exactly one thread runs the resolver; the others wait for it and see
	/// either nothing or the complete handle. A failed attempt publishes
	/// nothing.
	pub fn try_initialize(&self) -> Result<&ResolvedHandle<F>> {
		self.handle.get_or_try_init(|| {
			self.resolutions.fetch_add(1, Ordering::Relaxed);
			info!("Resolving {}", self.target);
			resolve::<F>(&self.target)
		})
	}

	/// Resolve the target, terminating the process on failure
	///
	/// A missing library or an unusable descriptor exits with status 1; a
	/// missing or unbindable symbol aborts. Nothing is ever forwarded through an unresolved handle.
	pub fn initialize(&self) -> &ResolvedHandle<F> {
		match self.try_initialize() {
			Ok(handle) => handle,
			Err(err) => self.fail(&err),
		}
	}

	fn fail(&self, err: &ShimError) -> ! {
		self.failed.store(true, Ordering::Release);
		error!("Initialization of the {} shim failed: {}", self.target.display_name(), err);
		if err.is_symbol_failure() {
			eprintln!("specprof: unable to resolve {} symbol: {}", self.target.symbol_name(), err);
			process::abort();
		}
		if err.is_load_failure() {
			eprintln!("specprof: unable to access target library: {}", err);
		} else {
			eprintln!("specprof: unusable target for {}: {}", self.target.display_name(), err);
		}
		process::exit(1);
	}

	/// Whether the target has been resolved
	#[must_use]
	pub fn is_resolved(&self) -> bool {
		self.handle.get().is_some()
	}

	/// How many times the resolver has run
	#[must_use]
	pub fn resolution_count(&self) -> u32 {
		self.resolutions.load(Ordering::Relaxed)
	}

	/// Forward one intercepted call to the original
	///
	/// `forward` receives the original function and must call it with the
	/// intercepted arguments, unmodified and in order. Its result is handed
	/// back untouched.
	///
	/// Not reentrant: the target must not be a function this path calls
	/// (allocation, clocks, `dlsym`, stdio). Such a shim recurses into
	/// itself, or deadlocks in its own first resolution.
	#[inline]
	pub fn call<R>(&self, forward: impl FnOnce(F) -> R) -> R {
		let original = self.initialize().get();
		self.measure(original, forward)
	}

	/// Like `call`, but reports resolution failures instead of terminating
	pub fn try_call<R>(&self, forward: impl FnOnce(F) -> R) -> Result<R> {
		let original = self.try_initialize()?.get();
		Ok(self.measure(original, forward))
	}

	fn measure<R>(&self, original: F, forward: impl FnOnce(F) -> R) -> R {
		let config = self.config();
		let call = self.stats.record_call();
		if config.trace_calls {
			trace!(call = call, "Call of the original {}...", self.target.display_name());
		}

		let timer = CallTimer::start(config.cpu_time);
		let ret = forward(original);
		let measurement = timer.stop();
		self.stats.record_time(&measurement);

		if config.trace_calls {
			trace!(call = call, wall = ?measurement.wall, cpu = ?measurement.cpu, "...done");
		}
		ret
	}

	/// Current statistics
	#[must_use]
	pub fn stats(&self) -> StatsSnapshot {
		self.stats.snapshot()
	}

	/// Build the report without printing it
	#[must_use]
	pub fn report(&self) -> Report {
		Report::new(self.target.display_name(), self.stats(), self.config().cpu_time)
	}

	/// Unload-time hook: print the report, once
	///
	/// Returns whether the report was printed. Later calls, and calls after a
	/// failed initialization, print nothing.
	pub fn shutdown(&self) -> bool {
		if self.reported.swap(true, Ordering::AcqRel) {
			return false;
		}
		if self.failed.load(Ordering::Acquire) {
			debug!("Skipping report for {}: initialization failed", self.target.display_name());
			return false;
		}
		if !self.config().report {
			debug!("Report for {} disabled", self.target.display_name());
			return false;
		}
		self.report().print();
		true
	}

	/// Whether `shutdown` has already run
	#[must_use]
	pub fn is_shut_down(&self) -> bool {
		self.reported.load(Ordering::Acquire)
	}
}
