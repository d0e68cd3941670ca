//! Interposer for `cos` from libm
//!
//! Build and run it against any program calling `cos`:
//! ```bash
//! cargo build --example libm_cos
//! LD_PRELOAD=target/debug/examples/liblibm_cos.so python3 -c 'import math; [math.cos(x) for x in range(1000)]'
//! ```

#[specprof_rs::interpose(library = "libm.so.6")]
unsafe extern "C" {
	fn cos(x: f64) -> f64;
}
