//! Interposer for a C++ member function
//!
//! Intercepts `double VectorWithoutMoveSem::computeSum() const` from
//! `libvector.so`, found through the loader search path. The receiver is
//! passed as the first argument, as the Itanium C++ ABI does for
//! non-virtual members.
//!
//! ```bash
//! cargo build --example vector_compute_sum
//! LD_LIBRARY_PATH=/path/to/vector/lib \
//!     LD_PRELOAD=target/debug/examples/libvector_compute_sum.so ./move_semantics_bench
//! ```

use std::ffi::c_void;

#[specprof_rs::interpose(
	library = "libvector.so",
	symbol = "_ZNK19move_semantics_test20VectorWithoutMoveSem10computeSumEv",
	owner = "move_semantics_test::VectorWithoutMoveSem",
	lazy,
	trace
)]
unsafe extern "C" {
	fn compute_sum(this: *const c_void) -> f64;
}
