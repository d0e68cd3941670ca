//! Builder for target descriptors
//!
//! Runtime counterpart of the descriptors `#[interpose]` bakes in at
//! compile time. Mostly useful for tests and for shims whose descriptor
//! is assembled by hand.

use crate::shim::Result;
use crate::target::{TargetDescriptor, TypeDescriptor};

/// Builder for creating target descriptors
#[derive(Debug, Clone)]
pub struct TargetBuilder {
	library_path: String,
	symbol_name: String,
	display_name: Option<String>,
	parameter_types: Vec<TypeDescriptor>,
	return_type: TypeDescriptor,
	owner: Option<String>,
	headers: Vec<String>,
}

impl TargetBuilder {
	/// Create a builder for `symbol_name` in `library_path`, returning void
	#[must_use]
	pub fn new(library_path: impl Into<String>, symbol_name: impl Into<String>) -> Self {
		Self {
			library_path: library_path.into(),
			symbol_name: symbol_name.into(),
			display_name: None,
			parameter_types: Vec::new(),
			return_type: TypeDescriptor::VOID,
			owner: None,
			headers: Vec::new(),
		}
	}

	/// Append a parameter type
	#[must_use]
	pub fn param(mut self, ty: impl Into<String>) -> Self {
		self.parameter_types.push(TypeDescriptor::new(ty));
		self
	}

	/// Append several parameter types, in order
	#[must_use]
	pub fn params<I, S>(mut self, types: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.parameter_types.extend(types.into_iter().map(TypeDescriptor::new));
		self
	}

	/// Set the return type
	#[must_use]
	pub fn returns(mut self, ty: impl Into<String>) -> Self {
		self.return_type = TypeDescriptor::new(ty);
		self
	}

	/// Mark the target as a member function of `owner`
	#[must_use]
	pub fn owner(mut self, owner: impl Into<String>) -> Self {
		self.owner = Some(owner.into());
		self
	}

	/// Set the name shown in the report
	#[must_use]
	pub fn display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());
		self
	}

	/// Record a header the parameter or return types come from
	#[must_use]
	pub fn header(mut self, header: impl Into<String>) -> Self {
		self.headers.push(header.into());
		self
	}

	/// Build and validate the descriptor
	pub fn build(self) -> Result<TargetDescriptor> {
		let target = TargetDescriptor::from_parts(
			self.library_path,
			self.symbol_name,
			self.display_name,
			self.parameter_types,
			self.return_type,
			self.owner,
			self.headers,
		);
		target.validate()?;
		Ok(target)
	}
}
