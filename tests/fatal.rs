//! Fatal initialization failures
//!
//! `Shim::call` terminates the process when the original cannot be
//! resolved, so each scenario re-runs this test binary as a child process
//! with `SPECPROF_TEST_CHILD` naming the scenario.

mod common;

use common::{LIBM, add_shim, child_scenario, run_child};
use specprof_rs::{Shim, TargetDescriptor, TypeDescriptor};
use std::ffi::c_int;
use std::os::unix::process::ExitStatusExt;

const FORWARDED: &str = "FORWARDED-CALL";

#[test]
fn missing_library_exits_before_forwarding() {
	if child_scenario().as_deref() == Some("library") {
		let shim = add_shim("/nonexistent/specprof/libmath.so");
		let sum = shim.call(|add| {
			println!("{FORWARDED}");
			unsafe { add(2, 3) }
		});
		println!("{FORWARDED} returned {sum}");
		let _ = shim.shutdown();
		return;
	}

	let output = run_child("missing_library_exits_before_forwarding", "library");
	let stdout = String::from_utf8_lossy(&output.stdout);
	let stderr = String::from_utf8_lossy(&output.stderr);

	assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
	assert!(stderr.contains("target library not found"), "stderr: {stderr}");
	assert!(!stdout.contains(FORWARDED));
	assert!(!stdout.contains("Call count"));
}

#[test]
fn missing_symbol_aborts_before_forwarding() {
	if child_scenario().as_deref() == Some("symbol") {
		let target = TargetDescriptor::builder(LIBM, "specprof_no_such_symbol")
			.returns("int")
			.build()
			.unwrap();
		let shim: Shim<unsafe extern "C" fn() -> c_int> = Shim::new(target);
		let value = shim.call(|missing| {
			println!("{FORWARDED}");
			unsafe { missing() }
		});
		println!("{FORWARDED} returned {value}");
		return;
	}

	let output = run_child("missing_symbol_aborts_before_forwarding", "symbol");
	let stdout = String::from_utf8_lossy(&output.stdout);
	let stderr = String::from_utf8_lossy(&output.stderr);

	assert_eq!(output.status.signal(), Some(libc::SIGABRT), "stderr: {stderr}");
	assert!(stderr.contains("target symbol not found"), "stderr: {stderr}");
	assert!(!stdout.contains(FORWARDED));
}

#[test]
fn eager_load_hook_fails_fast() {
	if child_scenario().as_deref() == Some("eager") {
		let shim = add_shim("/nonexistent/specprof/libmath.so");
		shim.on_load();
		println!("{FORWARDED}");
		return;
	}

	let output = run_child("eager_load_hook_fails_fast", "eager");
	let stdout = String::from_utf8_lossy(&output.stdout);
	let stderr = String::from_utf8_lossy(&output.stderr);

	assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
	assert!(stderr.contains("target library not found"), "stderr: {stderr}");
	assert!(!stdout.contains(FORWARDED));
}

#[test]
fn unusable_descriptor_is_not_blamed_on_the_library() {
	if child_scenario().as_deref() == Some("descriptor") {
		let target = TargetDescriptor::from_static(LIBM, "cos\0sin", "cos", &[], TypeDescriptor::VOID, None);
		let shim: Shim<unsafe extern "C" fn()> = Shim::new(target);
		shim.call(|f| {
			println!("{FORWARDED}");
			unsafe { f() }
		});
		return;
	}

	let output = run_child("unusable_descriptor_is_not_blamed_on_the_library", "descriptor");
	let stdout = String::from_utf8_lossy(&output.stdout);
	let stderr = String::from_utf8_lossy(&output.stderr);

	assert_eq!(output.status.code(), Some(1), "stderr: {stderr}");
	assert!(stderr.contains("unusable target for cos"), "stderr: {stderr}");
	assert!(stderr.contains("interior NUL"), "stderr: {stderr}");
	assert!(!stderr.contains("unable to access target library"), "stderr: {stderr}");
	assert!(!stdout.contains(FORWARDED));
}
