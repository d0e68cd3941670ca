//! Dynamic library handles
//!
//! Thin wrapper over `dlopen`/`dlsym` that turns `dlerror()` reports into
//! `ShimError`s.

use crate::shim::{Result, ShimError};
use std::ffi::{CStr, CString, c_void};
use std::io;
use std::path::Path;
use std::ptr::NonNull;
use tracing::{debug, warn};

/// An opened target library
///
/// The handle is never closed: forwarded calls may run until the very end
/// of the process, after every destructor we could hook.
#[derive(Debug)]
pub struct Library {
	handle: NonNull<c_void>,
	path: String,
}

// SAFETY: a dlopen handle is a process-wide token; dlsym on it is thread-safe.
unsafe impl Send for Library {}
unsafe impl Sync for Library {}

impl Library {
	/// Open `path` with lazy binding
	pub fn open(path: &str) -> Result<Self> {
		check_path(path)?;
		let c_path = CString::new(path).map_err(|_| ShimError::InvalidName { name: path.to_string() })?;

		debug!("Trying to open the target library {}...", path);
		let handle = unsafe {
			take_dlerror();
			libc::dlopen(c_path.as_ptr(), libc::RTLD_LAZY)
		};

		match NonNull::new(handle) {
			Some(handle) => {
				debug!("Library {} found and opened successfully", path);
				Ok(Self {
					handle,
					path: path.to_string(),
				})
			},
			None => {
				let reason = take_dlerror().unwrap_or_else(|| "unknown dlopen error".to_string());
				Err(classify_open_error(path, reason))
			},
		}
	}

	/// Look up `symbol` in this library and its dependencies
	pub fn symbol(&self, symbol: &str) -> Result<NonNull<c_void>> {
		let c_symbol = CString::new(symbol).map_err(|_| ShimError::InvalidName { name: symbol.to_string() })?;
		self.symbol_cstr(&c_symbol)
	}

	pub(crate) fn symbol_cstr(&self, symbol: &CStr) -> Result<NonNull<c_void>> {
		let name = symbol.to_string_lossy();
		debug!("Trying to acquire the target symbol {}...", name);

		// A null address is a legal symbol value, so dlerror() is the authority.
		let address = unsafe {
			take_dlerror();
			libc::dlsym(self.handle.as_ptr(), symbol.as_ptr())
		};
		let error = take_dlerror();

		match (NonNull::new(address), error) {
			(Some(address), None) => Ok(address),
			(_, Some(reason)) => Err(ShimError::SymbolNotFound {
				symbol: name.into_owned(),
				reason,
			}),
			(None, None) => Err(ShimError::SymbolNotFound {
				symbol: name.into_owned(),
				reason: "symbol resolves to a null address".to_string(),
			}),
		}
	}

	/// The path the library was opened with
	#[must_use]
	pub fn path(&self) -> &str {
		&self.path
	}
}

/// Fetch and clear the calling thread's pending `dlerror()` message
fn take_dlerror() -> Option<String> {
	let error = unsafe { libc::dlerror() };
	if error.is_null() {
		None
	} else {
		Some(unsafe { CStr::from_ptr(error) }.to_string_lossy().into_owned())
	}
}

fn classify_open_error(path: &str, reason: String) -> ShimError {
	// "<path>: cannot open shared object file: No such file or directory".
	// The same text naming another file means a dependency is missing.
	if reason.starts_with(&format!("{path}: ")) && reason.contains("No such file") {
		ShimError::LibraryNotFound { path: path.to_string() }
	} else {
		ShimError::LoadFailure {
			path: path.to_string(),
			reason,
		}
	}
}

/// Reject explicit paths that cannot be a library before asking the loader
///
/// Bare names are left to the loader's search path.
fn check_path(path: &str) -> Result<()> {
	if path.trim().is_empty() {
		return Err(ShimError::InvalidDescriptor("empty library path".into()));
	}
	if !path.contains('/') {
		return Ok(());
	}

	let file = Path::new(path);
	match std::fs::metadata(file) {
		Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ShimError::LibraryNotFound { path: path.to_string() }),
		Err(e) => Err(ShimError::LoadFailure {
			path: path.to_string(),
			reason: e.to_string(),
		}),
		Ok(meta) if !meta.is_file() => Err(ShimError::LoadFailure {
			path: path.to_string(),
			reason: "exists but is not a file".to_string(),
		}),
		Ok(_) => {
			let looks_shared = file
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(|name| name.contains(".so"));
			if !looks_shared {
				warn!("{} does not look like a shared object (.so file)", path);
			}
			Ok(())
		},
	}
}
