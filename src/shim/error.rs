//! Error types for shims
//!
//! This module contains the error taxonomy for resolving and binding an
//! intercepted symbol, and a result type for shim operations.

use thiserror::Error;

/// Result type for shim operations
pub type Result<T> = std::result::Result<T, ShimError>;

/// Error type for shim operations
///
/// Failures of the forwarded call itself never show up here: they belong
/// to the original implementation and reach the caller untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShimError {
	/// The target library path does not exist
	#[error("target library not found: {path}")]
	LibraryNotFound { path: String },

	/// The dynamic loader could not open the target library
	#[error("unable to access target library {path}: {reason}")]
	LoadFailure { path: String, reason: String },

	/// The target symbol is absent from the opened library
	#[error("target symbol not found: {symbol}: {reason}")]
	SymbolNotFound { symbol: String, reason: String },

	/// The handle type cannot hold a code address
	#[error("handle type is {actual} bytes wide, a code address needs {expected}")]
	SignatureMismatch { expected: usize, actual: usize },

	/// The handle's parameter count disagrees with the descriptor
	#[error("{symbol} is declared with {declared} parameters but bound to a handle taking {handle}")]
	ArityMismatch { symbol: String, declared: usize, handle: usize },

	/// A library path or symbol name contains an interior NUL byte
	#[error("name contains an interior NUL byte: {name:?}")]
	InvalidName { name: String },

	/// The target descriptor is incomplete
	#[error("invalid target descriptor: {0}")]
	InvalidDescriptor(String),
}

impl ShimError {
	/// Whether the error happened while locating or opening the library
	#[must_use]
	pub const fn is_load_failure(&self) -> bool {
		matches!(self, Self::LibraryNotFound { .. } | Self::LoadFailure { .. })
	}

	/// Whether the error happened while looking up or binding the symbol
	#[must_use]
	pub const fn is_symbol_failure(&self) -> bool {
		matches!(
			self,
			Self::SymbolNotFound { .. } | Self::SignatureMismatch { .. } | Self::ArityMismatch { .. }
		)
	}

	/// Whether the descriptor itself is unusable, before any lookup happens
	#[must_use]
	pub const fn is_descriptor_failure(&self) -> bool {
		matches!(self, Self::InvalidName { .. } | Self::InvalidDescriptor(_))
	}
}

impl From<&str> for ShimError {
	fn from(s: &str) -> Self {
		Self::InvalidDescriptor(s.to_string())
	}
}

impl From<String> for ShimError {
	fn from(s: String) -> Self {
		Self::InvalidDescriptor(s)
	}
}
