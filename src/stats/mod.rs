//! Call statistics
//!
//! Counters are plain atomics so concurrent callers never lose an update
//! and the hot path never takes a lock.

mod clock;

pub use clock::{CallTimer, Measurement, thread_cpu_time};

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Accumulated statistics for one intercepted function
#[derive(Debug, Default)]
pub struct Statistics {
	call_count: AtomicU64,
	wall_nanos: AtomicU64,
	cpu_nanos: AtomicU64,
}

impl Statistics {
	#[must_use]
	pub const fn new() -> Self {
		Self {
			call_count: AtomicU64::new(0),
			wall_nanos: AtomicU64::new(0),
			cpu_nanos: AtomicU64::new(0),
		}
	}

	/// Count one call and return the running total
	#[inline]
	pub fn record_call(&self) -> u64 {
		self.call_count.fetch_add(1, Ordering::Relaxed) + 1
	}

	/// Add the time spent in one forwarded call
	#[inline]
	pub fn record_time(&self, measurement: &Measurement) {
		self.wall_nanos.fetch_add(as_nanos(measurement.wall), Ordering::Relaxed);
		if let Some(cpu) = measurement.cpu {
			self.cpu_nanos.fetch_add(as_nanos(cpu), Ordering::Relaxed);
		}
	}

	/// Get a copy of the current statistics
	#[must_use]
	pub fn snapshot(&self) -> StatsSnapshot {
		StatsSnapshot {
			call_count: self.call_count.load(Ordering::Relaxed),
			wall_time: Duration::from_nanos(self.wall_nanos.load(Ordering::Relaxed)),
			cpu_time: Duration::from_nanos(self.cpu_nanos.load(Ordering::Relaxed)),
		}
	}
}

fn as_nanos(duration: Duration) -> u64 {
	u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Point-in-time copy of `Statistics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
	/// Total number of intercepted calls
	pub call_count: u64,
	/// Cumulative wall-clock time spent in the original
	pub wall_time: Duration,
	/// Cumulative CPU time spent in the original
	pub cpu_time: Duration,
}

impl StatsSnapshot {
	/// Mean wall-clock time per call, if any call was made
	#[must_use]
	pub fn mean_wall_time(&self) -> Option<Duration> {
		if self.call_count == 0 {
			return None;
		}
		let mean = self.wall_time.as_nanos() / u128::from(self.call_count);
		Some(Duration::from_nanos(u64::try_from(mean).unwrap_or(u64::MAX)))
	}
}
