//! Binding resolved addresses to typed function pointers
//!
//! This is the one place where an opaque code address becomes a callable.
//! It runs once, at resolution time; forwarded calls only copy the
//! already-typed pointer.

use crate::shim::{Result, ShimError};
use std::ffi::c_void;
use std::mem::{MaybeUninit, size_of};
use std::ptr::{self, NonNull};

/// A function pointer type a shim can forward through
///
/// Implemented for `extern "C"` and `unsafe extern "C"` function pointers
/// of up to twelve parameters. A C++ member function is bound as a
/// function whose first parameter is the receiver (`this`), which is how
/// the Itanium ABI passes it for non-virtual members.
///
/// # Safety
///
/// Implementors must be plain code pointers: `Copy`, pointer-sized, and
/// valid to construct from the address of a function with a matching ABI.
pub unsafe trait Signature: Copy + Send + Sync + 'static {
	/// Number of parameters, receiver included
	const ARITY: usize;
}

macro_rules! count {
	() => { 0usize };
	($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_signature {
	($($arg:ident),*) => {
		unsafe impl<R: 'static, $($arg: 'static),*> Signature for unsafe extern "C" fn($($arg),*) -> R {
			const ARITY: usize = count!($($arg)*);
		}

		unsafe impl<R: 'static, $($arg: 'static),*> Signature for extern "C" fn($($arg),*) -> R {
			const ARITY: usize = count!($($arg)*);
		}
	};
}

impl_signature!();
impl_signature!(A1);
impl_signature!(A1, A2);
impl_signature!(A1, A2, A3);
impl_signature!(A1, A2, A3, A4);
impl_signature!(A1, A2, A3, A4, A5);
impl_signature!(A1, A2, A3, A4, A5, A6);
impl_signature!(A1, A2, A3, A4, A5, A6, A7);
impl_signature!(A1, A2, A3, A4, A5, A6, A7, A8);
impl_signature!(A1, A2, A3, A4, A5, A6, A7, A8, A9);
impl_signature!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
impl_signature!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);
impl_signature!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12);

/// Bind a resolved address to the function pointer type `F`
///
/// The address bytes are copied into an `F` rather than cast, so the
/// result never depends on how the compiler represents `F`.
///
/// # Safety
///
/// `address` must be the entry point of a function whose parameters,
/// return type and calling convention are exactly those of `F`.
pub unsafe fn bind<F: Signature>(address: NonNull<c_void>) -> Result<F> {
	let expected = size_of::<*const c_void>();
	let actual = size_of::<F>();
	if actual != expected {
		return Err(ShimError::SignatureMismatch { expected, actual });
	}

	let raw: *const c_void = address.as_ptr();
	let mut function = MaybeUninit::<F>::uninit();
	unsafe {
		ptr::copy_nonoverlapping(
			ptr::from_ref(&raw).cast::<u8>(),
			function.as_mut_ptr().cast::<u8>(),
			expected,
		);
		Ok(function.assume_init())
	}
}
