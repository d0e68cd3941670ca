//! Forwarding, counting and timing through a `Shim`

mod common;

use common::{LIBC, LIBM, add_shim, libmath};
use specprof_rs::{Resolver, Shim, ShimConfig, ShimError, TargetDescriptor, resolve};
use std::ffi::{c_int, c_long, c_void};
use std::hint::black_box;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn cos_shim() -> Shim<unsafe extern "C" fn(f64) -> f64> {
	let target = TargetDescriptor::builder(LIBM, "cos")
		.param("double")
		.returns("double")
		.build()
		.unwrap();
	Shim::new(target)
}

#[test]
fn forwards_to_libm() {
	let shim = cos_shim();
	assert!(!shim.is_resolved());

	for x in [0.0, 0.5, 1.0, -2.25, 3.0e5] {
		let intercepted = shim.try_call(|cos| unsafe { cos(x) }).unwrap();
		let direct = black_box(x).cos();
		assert_eq!(intercepted.to_bits(), direct.to_bits(), "cos({x})");
	}

	assert!(shim.is_resolved());
	assert_eq!(shim.stats().call_count, 5);
	assert_eq!(shim.resolution_count(), 1);
}

#[test]
fn pointer_side_effects_pass_through() {
	let target = TargetDescriptor::builder(LIBM, "frexp")
		.params(["double", "int *"])
		.returns("double")
		.build()
		.unwrap();
	let shim: Shim<unsafe extern "C" fn(f64, *mut c_int) -> f64> = Shim::new(target);

	let mut exponent: c_int = 0;
	let mantissa = shim.try_call(|frexp| unsafe { frexp(8.0, &mut exponent) }).unwrap();
	assert_eq!(mantissa, 0.5);
	assert_eq!(exponent, 4);
}

#[test]
fn add_scenario_counts_five_calls() {
	let Some(library) = libmath() else { return };
	let shim = add_shim(library);

	for _ in 0..5 {
		assert_eq!(shim.try_call(|add| unsafe { add(2, 3) }).unwrap(), 5);
	}

	let stats = shim.stats();
	assert_eq!(stats.call_count, 5);
	assert!(stats.cpu_time <= stats.wall_time);

	// The original's own global side effect happened once per call.
	let handle = shim.try_initialize().unwrap();
	let counter = handle.library().symbol("libmath_add_calls").unwrap();
	let calls = unsafe { *counter.as_ptr().cast::<c_int>() };
	assert_eq!(calls, 5);
}

#[test]
fn void_function_writes_through_pointers() {
	let Some(library) = libmath() else { return };
	let target = TargetDescriptor::builder(library, "split")
		.params(["double", "long *", "double *"])
		.build()
		.unwrap();
	assert!(target.return_type().is_void());
	let shim: Shim<unsafe extern "C" fn(f64, *mut c_long, *mut f64)> = Shim::new(target);

	let mut whole: c_long = 0;
	let mut frac = 0.0;
	shim.try_call(|split| unsafe { split(7.25, &mut whole, &mut frac) }).unwrap();
	assert_eq!(whole, 7);
	assert_eq!(frac, 0.25);
	assert_eq!(shim.stats().call_count, 1);
}

#[repr(C)]
struct Vector {
	data: *const f64,
	len: usize,
}

#[test]
fn member_function_receives_this() {
	let Some(library) = libmath() else { return };
	let target = TargetDescriptor::builder(library, "_ZNK6Vector10computeSumEv")
		.owner("Vector")
		.display_name("computeSum")
		.returns("double")
		.build()
		.unwrap();
	assert!(target.is_member_function());
	let shim: Shim<unsafe extern "C" fn(*const Vector) -> f64> = Shim::new(target);

	let values = [1.5, 2.5, 4.0];
	let vector = Vector {
		data: values.as_ptr(),
		len: values.len(),
	};
	let sum = shim.try_call(|compute_sum| unsafe { compute_sum(&vector) }).unwrap();
	assert_eq!(sum, 8.0);
	assert!(shim.report().to_string().contains("RESULTS FOR FUNCTION : computeSum"));
}

#[test]
fn concurrent_calls_are_all_counted() {
	const THREADS: usize = 8;
	const CALLS: usize = 1_000;

	let target = TargetDescriptor::builder(LIBC, "abs")
		.param("int")
		.returns("int")
		.build()
		.unwrap();
	let shim: Arc<Shim<unsafe extern "C" fn(c_int) -> c_int>> = Arc::new(Shim::new(target));
	let barrier = Arc::new(Barrier::new(THREADS));

	let workers: Vec<_> = (0..THREADS)
		.map(|t| {
			let shim = Arc::clone(&shim);
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				for i in 0..CALLS {
					let n = -((t * CALLS + i) as c_int);
					assert_eq!(shim.try_call(|abs| unsafe { abs(n) }).unwrap(), -n);
				}
			})
		})
		.collect();
	for worker in workers {
		worker.join().unwrap();
	}

	assert_eq!(shim.stats().call_count, (THREADS * CALLS) as u64);
	assert_eq!(shim.resolution_count(), 1);
}

#[test]
fn racing_first_calls_resolve_once() {
	const THREADS: usize = 16;

	let shim = Arc::new(cos_shim());
	let barrier = Arc::new(Barrier::new(THREADS));
	let workers: Vec<_> = (0..THREADS)
		.map(|_| {
			let shim = Arc::clone(&shim);
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				shim.try_initialize().unwrap().address() as usize
			})
		})
		.collect();
	let addresses: Vec<usize> = workers.into_iter().map(|worker| worker.join().unwrap()).collect();

	assert_eq!(shim.resolution_count(), 1);
	assert!(addresses.iter().all(|&a| a == addresses[0] && a != 0));
	assert_eq!(shim.stats().call_count, 0);
}

#[test]
fn times_are_monotonic_and_wall_bounds_cpu() {
	let Some(library) = libmath() else { return };
	let target = TargetDescriptor::builder(library, "spin")
		.param("unsigned long")
		.returns("unsigned long")
		.build()
		.unwrap();
	let shim: Shim<unsafe extern "C" fn(u64) -> u64> = Shim::new(target);

	let mut previous = shim.stats();
	for _ in 0..10 {
		shim.try_call(|spin| unsafe { spin(200_000) }).unwrap();
		let current = shim.stats();
		assert!(current.wall_time >= previous.wall_time);
		assert!(current.cpu_time >= previous.cpu_time);
		assert!(current.cpu_time <= current.wall_time);
		previous = current;
	}
	assert_eq!(previous.call_count, 10);
	assert!(previous.wall_time > Duration::ZERO);
}

#[test]
fn wall_time_only_when_cpu_disabled() {
	let target = TargetDescriptor::builder(LIBM, "cos")
		.param("double")
		.returns("double")
		.build()
		.unwrap();
	let shim: Shim<unsafe extern "C" fn(f64) -> f64> = Shim::with_config(target, ShimConfig::new().cpu_time(false));

	for _ in 0..3 {
		shim.try_call(|cos| unsafe { cos(1.0) }).unwrap();
	}
	let stats = shim.stats();
	assert_eq!(stats.call_count, 3);
	assert_eq!(stats.cpu_time, Duration::ZERO);
	assert!(!shim.report().to_string().contains("Cpu time"));
}

fn abs_shim(config: ShimConfig) -> Shim<unsafe extern "C" fn(c_int) -> c_int> {
	let target = TargetDescriptor::builder(LIBC, "abs")
		.param("int")
		.returns("int")
		.build()
		.unwrap();
	Shim::with_config(target, config)
}

/// Lowest mean wall time per call over a few rounds of `abs`
fn best_mean_wall(config: ShimConfig) -> Duration {
	const ROUNDS: usize = 5;
	const CALLS: i32 = 20_000;

	(0..ROUNDS)
		.map(|_| {
			let shim = abs_shim(config);
			for i in 0..CALLS {
				black_box(shim.try_call(|abs| unsafe { abs(black_box(-i)) }).unwrap());
			}
			let stats = shim.stats();
			assert_eq!(stats.call_count, CALLS as u64);
			stats.mean_wall_time().unwrap()
		})
		.min()
		.unwrap()
}

#[test]
fn cpu_tracking_does_not_inflate_wall_time() {
	let wall_only = best_mean_wall(ShimConfig::new().cpu_time(false));
	let with_cpu = best_mean_wall(ShimConfig::new().cpu_time(true));

	// Thread CPU clock reads cost a syscall each; none may land in the wall window.
	let bound = wall_only * 3 + Duration::from_nanos(250);
	assert!(with_cpu <= bound, "wall-only mean {wall_only:?}, with cpu tracking {with_cpu:?}");
}

#[test]
fn zero_calls_report_and_single_shutdown() {
	let shim = cos_shim();
	let report = shim.report();
	assert_eq!(report.stats.call_count, 0);
	assert_eq!(report.stats.wall_time, Duration::ZERO);
	assert_eq!(report.stats.cpu_time, Duration::ZERO);

	assert!(!shim.is_shut_down());
	let printed = shim.shutdown();
	assert!(shim.is_shut_down());
	assert!(!shim.shutdown());
	// `SPECPROF_NO_REPORT` in the environment legitimately suppresses it.
	assert_eq!(printed, shim.config().report);
}

#[test]
fn missing_library_is_reported_and_nothing_is_forwarded() {
	let shim = add_shim("/nonexistent/specprof/libmath.so");

	let mut forwarded = false;
	let err = shim
		.try_call(|add| {
			forwarded = true;
			unsafe { add(2, 3) }
		})
		.unwrap_err();

	assert_eq!(
		err,
		ShimError::LibraryNotFound {
			path: "/nonexistent/specprof/libmath.so".to_string()
		}
	);
	assert!(err.to_string().contains("library not found"));
	assert!(!forwarded);
	assert!(!shim.is_resolved());
	assert_eq!(shim.stats().call_count, 0);
}

#[test]
fn missing_bare_library_is_reported_as_not_found() {
	let shim = add_shim("libspecprof-does-not-exist.so");
	let err = shim.try_initialize().unwrap_err();
	assert!(err.is_load_failure());
}

#[test]
fn missing_symbol_is_reported() {
	let target = TargetDescriptor::builder(LIBM, "specprof_no_such_symbol")
		.returns("int")
		.build()
		.unwrap();
	let shim: Shim<unsafe extern "C" fn() -> c_int> = Shim::new(target);

	let err = shim.try_initialize().unwrap_err();
	assert!(matches!(err, ShimError::SymbolNotFound { ref symbol, .. } if symbol == "specprof_no_such_symbol"));
	assert!(err.is_symbol_failure());
	assert_eq!(shim.stats().call_count, 0);

	// A failed attempt publishes nothing; a retry runs the resolver again.
	assert!(shim.try_initialize().is_err());
	assert_eq!(shim.resolution_count(), 2);
}

#[test]
fn handle_arity_must_match_descriptor() {
	let target = TargetDescriptor::builder(LIBM, "cos")
		.param("double")
		.returns("double")
		.build()
		.unwrap();
	let shim: Shim<unsafe extern "C" fn(f64, *mut c_void) -> f64> = Shim::new(target);

	let err = shim.try_initialize().unwrap_err();
	assert_eq!(
		err,
		ShimError::ArityMismatch {
			symbol: "cos".to_string(),
			declared: 1,
			handle: 2,
		}
	);
}

#[test]
fn resolver_can_be_used_without_a_shim() {
	let target = TargetDescriptor::builder(LIBM, "ldexp")
		.params(["double", "int"])
		.returns("double")
		.build()
		.unwrap();

	let handle = resolve::<unsafe extern "C" fn(f64, c_int) -> f64>(&target).unwrap();
	assert_eq!(unsafe { (handle.get())(0.75, 3) }, 6.0);
	assert_eq!(handle.library().path(), LIBM);

	let again = Resolver::new(&target).resolve::<unsafe extern "C" fn(f64, c_int) -> f64>().unwrap();
	assert_eq!(again.address(), handle.address());
}
