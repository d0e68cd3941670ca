//! specprof-rs - A framework for building profiling interposer shims
//!
//! A shim is a small shared library that exports a function under the
//! same symbol as a function in another library. Once the dynamic loader
//! resolves callers to the shim (for example through `LD_PRELOAD`), every
//! call is forwarded unchanged to the original while the shim counts it
//! and times it, and a summary is printed when the process exits.
//!
//! # Getting Started
//!
//! Build a `cdylib` containing:
//!
//! ```ignore
//! #[specprof_rs::interpose(library = "libm.so.6")]
//! unsafe extern "C" {
//!     fn cos(x: f64) -> f64;
//! }
//! ```
//!
//! and run the program under `LD_PRELOAD=path/to/libshim.so`.
//!
//! Without the macro, a `Shim` is an ordinary value:
//!
//! ```no_run
//! use specprof_rs::{Shim, TargetDescriptor};
//!
//! let target = TargetDescriptor::builder("libm.so.6", "cos")
//!     .param("double")
//!     .returns("double")
//!     .build()?;
//! let shim: Shim<unsafe extern "C" fn(f64) -> f64> = Shim::new(target);
//!
//! let y = shim.try_call(|cos| unsafe { cos(0.0) })?;
//! assert_eq!(y, 1.0);
//! assert_eq!(shim.stats().call_count, 1);
//! # Ok::<(), specprof_rs::ShimError>(())
//! ```

pub mod report;
pub mod resolver;
pub mod shim;
pub mod stats;
pub mod target;
pub mod util;

pub use specprof_macros::interpose;

pub use report::{HumanDuration, Report};
pub use resolver::{Library, ResolvedHandle, Resolver, Signature, resolve};
pub use shim::{ENV_NO_REPORT, ENV_TRACE_CALLS, Result, Shim, ShimConfig, ShimError};
pub use stats::{Statistics, StatsSnapshot};
pub use target::{Language, TargetBuilder, TargetDescriptor, TypeDescriptor};
