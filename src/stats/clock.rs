//! Clock sources for per-call measurement
//!
//! Wall time comes from the monotonic clock (`Instant`), CPU time from the
//! calling thread's CPU clock. The CPU clock is a syscall, so its reads
//! bracket the wall reads and stay out of the wall window; the CPU time of
//! a call is clamped to its wall time.

use nix::time::{ClockId, clock_gettime};
use std::time::{Duration, Instant};

/// Time spent in one forwarded call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Measurement {
	pub wall: Duration,
	pub cpu: Option<Duration>,
}

/// Running measurement of one forwarded call
#[derive(Debug)]
pub struct CallTimer {
	wall_start: Instant,
	cpu_start: Option<Duration>,
}

impl CallTimer {
	/// Start timing; `track_cpu` also samples the thread CPU clock
	#[inline]
	#[must_use]
	pub fn start(track_cpu: bool) -> Self {
		let cpu_start = if track_cpu { thread_cpu_time() } else { None };
		let wall_start = Instant::now();
		Self { wall_start, cpu_start }
	}

	/// Stop timing
	#[inline]
	#[must_use]
	pub fn stop(self) -> Measurement {
		let wall = self.wall_start.elapsed();
		let cpu_end = self.cpu_start.and_then(|_| thread_cpu_time());
		let cpu = match (self.cpu_start, cpu_end) {
			(Some(start), Some(end)) => Some(end.saturating_sub(start).min(wall)),
			_ => None,
		};
		Measurement { wall, cpu }
	}
}

/// CPU time consumed so far by the calling thread
#[must_use]
pub fn thread_cpu_time() -> Option<Duration> {
	let now = clock_gettime(ClockId::CLOCK_THREAD_CPUTIME_ID).ok()?;
	let secs = u64::try_from(now.tv_sec()).ok()?;
	let nanos = u32::try_from(now.tv_nsec()).ok()?;
	Some(Duration::new(secs, nanos))
}
