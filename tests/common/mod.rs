//! Helpers shared by the integration tests

#![allow(dead_code)]

use specprof_rs::{Shim, TargetDescriptor};
use std::process::{Command, Output};

/// System math library, present on every glibc system
pub const LIBM: &str = "libm.so.6";

/// System C library
pub const LIBC: &str = "libc.so.6";

/// Path of the fixture library built by `build.rs`, if a C compiler was found
pub fn libmath() -> Option<&'static str> {
	let path = option_env!("SPECPROF_LIBMATH");
	if path.is_none() {
		eprintln!("libmath.so fixture not built, skipping");
	}
	path
}

pub type AddFn = unsafe extern "C" fn(i32, i32) -> i32;

/// Shim for `int add(int, int)` in `library`
pub fn add_shim(library: &str) -> Shim<AddFn> {
	let target = TargetDescriptor::builder(library, "add")
		.params(["int", "int"])
		.returns("int")
		.build()
		.unwrap();
	Shim::new(target)
}

/// Names the scenario a re-executed test binary should run
pub const CHILD_ENV: &str = "SPECPROF_TEST_CHILD";

/// Re-run this test binary with only `test_name` selected and `scenario` set
pub fn run_child(test_name: &str, scenario: &str) -> Output {
	Command::new(std::env::current_exe().unwrap())
		.args(["--exact", test_name, "--nocapture", "--test-threads=1"])
		.env(CHILD_ENV, scenario)
		.env_remove(specprof_rs::ENV_NO_REPORT)
		.output()
		.unwrap()
}

/// The scenario this process was started for, if it is a child
pub fn child_scenario() -> Option<String> {
	std::env::var(CHILD_ENV).ok()
}
