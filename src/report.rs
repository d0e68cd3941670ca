//! Exit-time reporting
//!
//! The report is a human-readable diagnostic written to stdout once the
//! process is done with the intercepted function. Its layout is not a
//! machine-readable contract.

use crate::stats::StatsSnapshot;
use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

const RULE: &str = "--------------------------------";

/// Summary of one shim's statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
	/// Name of the intercepted function
	pub function: String,
	/// Statistics at report time
	pub stats: StatsSnapshot,
	/// Whether CPU time was measured
	pub cpu_tracked: bool,
}

impl Report {
	#[must_use]
	pub fn new(function: impl Into<String>, stats: StatsSnapshot, cpu_tracked: bool) -> Self {
		Self {
			function: function.into(),
			stats,
			cpu_tracked,
		}
	}

	/// Write the report to `out`
	pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
		write!(out, "{self}")?;
		out.flush()
	}

	/// Print the report to stdout
	///
	/// Runs at process teardown, so write errors are dropped.
	pub fn print(&self) {
		let stdout = io::stdout();
		let mut out = stdout.lock();
		let _ = self.write_to(&mut out);
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{RULE}")?;
		writeln!(f, "RESULTS FOR FUNCTION : {}", self.function)?;
		writeln!(f, "Call count = {}", self.stats.call_count)?;
		if self.cpu_tracked {
			writeln!(f, "Cpu time consumed = {}", HumanDuration(self.stats.cpu_time))?;
		}
		writeln!(f, "Real time consumed = {}", HumanDuration(self.stats.wall_time))?;
		if let Some(mean) = self.stats.mean_wall_time() {
			writeln!(f, "Mean time per call = {}", HumanDuration(mean))?;
		}
		writeln!(f, "{RULE}")
	}
}

/// `Display` adapter printing a duration in the largest fitting unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl fmt::Display for HumanDuration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let nanos = self.0.as_nanos();
		if nanos < 1_000 {
			write!(f, "{nanos} ns")
		} else if nanos < 1_000_000 {
			write!(f, "{:.3} µs", nanos as f64 / 1e3)
		} else if nanos < 1_000_000_000 {
			write!(f, "{:.3} ms", nanos as f64 / 1e6)
		} else {
			write!(f, "{:.3} s", self.0.as_secs_f64())
		}
	}
}
