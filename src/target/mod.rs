//! Target descriptors
//!
//! A `TargetDescriptor` fixes which function, in which library, with which
//! signature, a shim intercepts. It is baked into the shim when the shim
//! is built and never changes at runtime.

mod builder;

pub use builder::TargetBuilder;

use crate::shim::{Result, ShimError};
use std::borrow::Cow;
use std::ffi::CString;
use std::fmt;

/// Type of a parameter or return value, as written in the target's source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
	name: Cow<'static, str>,
}

impl TypeDescriptor {
	/// The "no value" type
	pub const VOID: Self = Self::from_static("void");

	/// Create a type descriptor from a static type name
	#[must_use]
	pub const fn from_static(name: &'static str) -> Self {
		Self {
			name: Cow::Borrowed(name),
		}
	}

	/// Create a type descriptor from an owned type name
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: Cow::Owned(name.into()),
		}
	}

	/// The type name
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Whether this type carries no value
	#[must_use]
	pub fn is_void(&self) -> bool {
		matches!(self.name.trim(), "" | "void" | "()")
	}
}

impl fmt::Display for TypeDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)
	}
}

/// Source language of the target library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
	/// Plain C linkage
	C,
	/// C++ with Itanium name mangling
	Cpp,
}

impl Language {
	/// Infer the language from the export name and owning type
	#[must_use]
	pub const fn infer(symbol: &str, has_owner: bool) -> Self {
		if has_owner || is_mangled(symbol) { Self::Cpp } else { Self::C }
	}

	/// Human-readable language name
	#[must_use]
	pub const fn name(self) -> &'static str {
		match self {
			Self::C => "c",
			Self::Cpp => "c++",
		}
	}
}

/// Whether a symbol looks like an Itanium-mangled C++ name
#[must_use]
pub const fn is_mangled(symbol: &str) -> bool {
	let bytes = symbol.as_bytes();
	bytes.len() > 2 && bytes[0] == b'_' && bytes[1] == b'Z'
}

/// Fixed description of the intercepted function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
	library_path: Cow<'static, str>,
	symbol_name: Cow<'static, str>,
	display_name: Cow<'static, str>,
	parameter_types: Cow<'static, [TypeDescriptor]>,
	return_type: TypeDescriptor,
	owner: Option<Cow<'static, str>>,
	headers: Vec<String>,
}

impl TargetDescriptor {
	/// Create a descriptor entirely from static data
	///
	/// This is what `#[interpose]` expands to, so that a shim can be
	/// stored in a `static`.
	#[must_use]
	pub const fn from_static(
		library_path: &'static str,
		symbol_name: &'static str,
		display_name: &'static str,
		parameter_types: &'static [TypeDescriptor],
		return_type: TypeDescriptor,
		owner: Option<&'static str>,
	) -> Self {
		Self {
			library_path: Cow::Borrowed(library_path),
			symbol_name: Cow::Borrowed(symbol_name),
			display_name: Cow::Borrowed(display_name),
			parameter_types: Cow::Borrowed(parameter_types),
			return_type,
			owner: match owner {
				Some(owner) => Some(Cow::Borrowed(owner)),
				None => None,
			},
			headers: Vec::new(),
		}
	}

	/// Start building a descriptor at runtime
	#[must_use]
	pub fn builder(library_path: impl Into<String>, symbol_name: impl Into<String>) -> TargetBuilder {
		TargetBuilder::new(library_path, symbol_name)
	}

	pub(crate) fn from_parts(
		library_path: String,
		symbol_name: String,
		display_name: Option<String>,
		parameter_types: Vec<TypeDescriptor>,
		return_type: TypeDescriptor,
		owner: Option<String>,
		headers: Vec<String>,
	) -> Self {
		let display_name = display_name.unwrap_or_else(|| symbol_name.clone());
		Self {
			library_path: Cow::Owned(library_path),
			symbol_name: Cow::Owned(symbol_name),
			display_name: Cow::Owned(display_name),
			parameter_types: Cow::Owned(parameter_types),
			return_type,
			owner: owner.filter(|o| !o.is_empty()).map(Cow::Owned),
			headers,
		}
	}

	/// Path (or loader-resolvable name) of the library holding the original
	#[must_use]
	pub fn library_path(&self) -> &str {
		&self.library_path
	}

	/// Exact export name of the original, mangled if it is C++
	#[must_use]
	pub fn symbol_name(&self) -> &str {
		&self.symbol_name
	}

	/// Name shown in the report
	#[must_use]
	pub fn display_name(&self) -> &str {
		&self.display_name
	}

	#[must_use]
	pub fn parameter_types(&self) -> &[TypeDescriptor] {
		&self.parameter_types
	}

	#[must_use]
	pub const fn return_type(&self) -> &TypeDescriptor {
		&self.return_type
	}

	/// Owning type of a member function
	#[must_use]
	pub fn owner(&self) -> Option<&str> {
		self.owner.as_deref()
	}

	#[must_use]
	pub const fn is_member_function(&self) -> bool {
		self.owner.is_some()
	}

	/// Headers the parameter and return types come from
	#[must_use]
	pub fn headers(&self) -> &[String] {
		&self.headers
	}

	#[must_use]
	pub fn language(&self) -> Language {
		Language::infer(&self.symbol_name, self.owner.is_some())
	}

	/// Render a C-like prototype, e.g. `double Vector::computeSum()`
	#[must_use]
	pub fn signature(&self) -> String {
		let params = self
			.parameter_types
			.iter()
			.map(TypeDescriptor::name)
			.collect::<Vec<_>>()
			.join(", ");
		match self.owner() {
			Some(owner) => format!("{} {}::{}({})", self.return_type, owner, self.display_name, params),
			None => format!("{} {}({})", self.return_type, self.display_name, params),
		}
	}

	/// Check that the descriptor can be handed to the dynamic loader
	pub fn validate(&self) -> Result<()> {
		if self.library_path.trim().is_empty() {
			return Err(ShimError::InvalidDescriptor("empty library path".into()));
		}
		if self.symbol_name.trim().is_empty() {
			return Err(ShimError::InvalidDescriptor("empty symbol name".into()));
		}
		if self.parameter_types.iter().any(TypeDescriptor::is_void) {
			return Err(ShimError::InvalidDescriptor(format!(
				"parameter list of {} contains a void type",
				self.symbol_name
			)));
		}
		self.library_cstring()?;
		self.symbol_cstring()?;

		if self.is_member_function() && !is_mangled(&self.symbol_name) {
			tracing::warn!(
				"member function {} is looked up by the unmangled name {}",
				self.display_name,
				self.symbol_name
			);
		}
		Ok(())
	}

	pub(crate) fn library_cstring(&self) -> Result<CString> {
		to_cstring(&self.library_path)
	}

	pub(crate) fn symbol_cstring(&self) -> Result<CString> {
		to_cstring(&self.symbol_name)
	}
}

impl fmt::Display for TargetDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} [{}]", self.signature(), self.library_path)
	}
}

fn to_cstring(name: &str) -> Result<CString> {
	CString::new(name).map_err(|_| ShimError::InvalidName { name: name.to_string() })
}
