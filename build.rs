//! Build script for specprof
//!
//! This script compiles the C fixture library the integration tests
//! interpose on. A missing C compiler only disables those tests.

use std::env;
use std::path::PathBuf;

fn main() {
	println!("cargo:rerun-if-changed=tests/fixtures/libmath.c");

	let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
	let library = out_dir.join("libmath.so");

	let compiler = match cc::Build::new().try_get_compiler() {
		Ok(compiler) => compiler,
		Err(e) => {
			println!("cargo:warning=No C compiler, fixture tests disabled: {}", e);
			return;
		},
	};

	let status = compiler
		.to_command()
		.args(["-shared", "-fPIC", "-O0", "-o"])
		.arg(&library)
		.arg("tests/fixtures/libmath.c")
		.status();

	match status {
		Ok(status) if status.success() => {
			println!("cargo:rustc-env=SPECPROF_LIBMATH={}", library.display());
		},
		Ok(status) => println!("cargo:warning=Building libmath.so failed ({}), fixture tests disabled", status),
		Err(e) => println!("cargo:warning=Could not run the C compiler, fixture tests disabled: {}", e),
	}
}
