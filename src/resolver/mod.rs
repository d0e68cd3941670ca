//! Symbol resolution
//!
//! The resolver opens the target library, looks up the target symbol and
//! binds it to the shim's function pointer type. It runs at most once per
//! shim; the `Shim` publishes its result.

mod bind;
mod library;

pub use bind::{Signature, bind};
pub use library::Library;

use crate::shim::{Result, ShimError};
use crate::target::TargetDescriptor;
use std::ffi::c_void;
use tracing::info;

/// A callable bound to the original implementation
#[derive(Debug)]
pub struct ResolvedHandle<F> {
	function: F,
	address: usize,
	library: Library,
}

impl<F: Signature> ResolvedHandle<F> {
	/// The typed pointer to the original implementation
	#[inline]
	#[must_use]
	pub fn get(&self) -> F {
		self.function
	}

	/// The raw address of the original implementation
	#[must_use]
	pub fn address(&self) -> *const c_void {
		self.address as *const c_void
	}

	/// The library the original was found in
	#[must_use]
	pub const fn library(&self) -> &Library {
		&self.library
	}
}

/// Resolves one target descriptor
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
	target: &'a TargetDescriptor,
}

impl<'a> Resolver<'a> {
	#[must_use]
	pub const fn new(target: &'a TargetDescriptor) -> Self {
		Self { target }
	}

	/// Open the library, look the symbol up and bind it to `F`
	pub fn resolve<F: Signature>(&self) -> Result<ResolvedHandle<F>> {
		let target = self.target;
		target.validate()?;

		let declared = target.parameter_types().len() + usize::from(target.is_member_function());
		if declared != F::ARITY {
			return Err(ShimError::ArityMismatch {
				symbol: target.symbol_name().to_string(),
				declared,
				handle: F::ARITY,
			});
		}

		let library = Library::open(target.library_path())?;
		info!(
			"Library {} found and opened successfully, looking up {} symbol {}",
			library.path(),
			target.language().name(),
			target.symbol_name()
		);

		let address = library.symbol_cstr(&target.symbol_cstring()?)?;
		// SAFETY: the descriptor and `F` describe the same function; that is
		// the contract a shim is generated under.
		let function = unsafe { bind::<F>(address)? };
		info!("Symbol {} original address: {:p}", target.symbol_name(), address);

		Ok(ResolvedHandle {
			function,
			address: address.as_ptr() as usize,
			library,
		})
	}
}

/// Resolve `target` to a handle typed as `F`
pub fn resolve<F: Signature>(target: &TargetDescriptor) -> Result<ResolvedHandle<F>> {
	Resolver::new(target).resolve()
}
