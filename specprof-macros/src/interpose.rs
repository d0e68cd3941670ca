//! Implementation of the `interpose` attribute
//!
//! Expands a one-function `extern "C"` block into a `static` shim, the
//! exported forwarding function, and the `.init_array`/`.fini_array`
//! hooks that drive the shim's lifecycle.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
	Error, Expr, ExprLit, FnArg, ForeignItem, ForeignItemFn, GenericArgument, Ident, ItemForeignMod, Lit, LitStr, Pat,
	PathArguments, ReturnType, Type, TypePath, parse_macro_input,
};

/// Arguments of `#[interpose(...)]`
#[derive(Default)]
struct InterposeArgs {
	library: Option<LitStr>,
	symbol: Option<LitStr>,
	owner: Option<LitStr>,
	lazy: bool,
	no_report: bool,
	trace: bool,
}

pub fn expand_interpose(attr: TokenStream, item: TokenStream) -> TokenStream {
	let mut args = InterposeArgs::default();
	let parser = syn::meta::parser(|meta| {
		if meta.path.is_ident("library") {
			args.library = Some(meta.value()?.parse()?);
		} else if meta.path.is_ident("symbol") {
			args.symbol = Some(meta.value()?.parse()?);
		} else if meta.path.is_ident("owner") {
			args.owner = Some(meta.value()?.parse()?);
		} else if meta.path.is_ident("lazy") {
			args.lazy = true;
		} else if meta.path.is_ident("no_report") {
			args.no_report = true;
		} else if meta.path.is_ident("trace") {
			args.trace = true;
		} else {
			return Err(meta.error("unsupported interpose argument"));
		}
		Ok(())
	});
	parse_macro_input!(attr with parser);
	let block = parse_macro_input!(item as ItemForeignMod);

	match generate(&args, &block) {
		Ok(output) => output.into(),
		Err(err) => err.to_compile_error().into(),
	}
}

fn generate(args: &InterposeArgs, block: &ItemForeignMod) -> syn::Result<TokenStream2> {
	let library = args
		.library
		.as_ref()
		.ok_or_else(|| Error::new_spanned(&block.abi, "missing `library = \"...\"`"))?;
	if library.value().trim().is_empty() {
		return Err(Error::new_spanned(library, "library path must not be empty"));
	}

	if let Some(abi) = &block.abi.name {
		if abi.value() != "C" {
			return Err(Error::new_spanned(abi, "only extern \"C\" functions can be interposed"));
		}
	}

	let function = single_function(block)?;
	let sig = &function.sig;
	if sig.variadic.is_some() {
		return Err(Error::new_spanned(sig, "variadic functions cannot be forwarded"));
	}
	if !sig.generics.params.is_empty() {
		return Err(Error::new_spanned(&sig.generics, "interposed functions cannot be generic"));
	}

	let name = &sig.ident;
	let display_name = name.to_string();
	let symbol = match (&args.symbol, link_name(function)?) {
		(Some(_), Some(link)) => {
			return Err(Error::new_spanned(link, "use either `symbol = ...` or `#[link_name]`, not both"));
		},
		(Some(symbol), None) => symbol.value(),
		(None, Some(link)) => link.value(),
		(None, None) => display_name.clone(),
	};

	let (arg_names, arg_types) = parameters(function)?;

	// The receiver is part of the call, not of the declared parameter list.
	let declared_types = if let Some(owner) = &args.owner {
		match arg_types.first() {
			Some(Type::Ptr(_)) => {},
			Some(other) => return Err(Error::new_spanned(other, "the receiver (`this`) must be a raw pointer")),
			None => return Err(Error::new_spanned(owner, "a member function takes its receiver as first parameter")),
		}
		&arg_types[1..]
	} else {
		&arg_types[..]
	};
	let declared_names = declared_types.iter().map(type_name);
	let param_count = declared_types.len();

	let (return_type, return_name) = match &sig.output {
		ReturnType::Default => (quote!(()), "void".to_string()),
		ReturnType::Type(_, ty) => (quote!(#ty), type_name(ty)),
	};

	let owner = match &args.owner {
		Some(owner) => quote!(::core::option::Option::Some(#owner)),
		None => quote!(::core::option::Option::None),
	};
	let eager = !args.lazy;
	let report = !args.no_report;
	let trace = args.trace;

	let upper = display_name.to_uppercase();
	let shim_ident = format_ident!("{}_SHIM", upper);
	let params_ident = format_ident!("__SPECPROF_{}_PARAMS", upper);
	let attrs = function.attrs.iter().filter(|attr| !attr.path().is_ident("link_name"));

	Ok(quote! {
		#[doc(hidden)]
		static #params_ident: [::specprof_rs::TypeDescriptor; #param_count] = [
			#(::specprof_rs::TypeDescriptor::from_static(#declared_names)),*
		];

		/// Interception state for this shim
		pub static #shim_ident: ::specprof_rs::Shim<unsafe extern "C" fn(#(#arg_types),*) -> #return_type> =
			::specprof_rs::Shim::with_config(
				::specprof_rs::TargetDescriptor::from_static(
					#library,
					#symbol,
					#display_name,
					&#params_ident,
					::specprof_rs::TypeDescriptor::from_static(#return_name),
					#owner,
				),
				::specprof_rs::ShimConfig::new()
					.eager(#eager)
					.report(#report)
					.trace_calls(#trace),
			);

		#(#attrs)*
		#[unsafe(export_name = #symbol)]
		pub unsafe extern "C" fn #name(#(#arg_names: #arg_types),*) -> #return_type {
			#shim_ident.call(move |original| unsafe { original(#(#arg_names),*) })
		}

		const _: () = {
			#[unsafe(link_section = ".init_array")]
			#[used]
			static CONSTRUCTOR: extern "C" fn() = on_load;

			extern "C" fn on_load() {
				#shim_ident.on_load();
			}

			#[unsafe(link_section = ".fini_array")]
			#[used]
			static DESTRUCTOR: extern "C" fn() = on_unload;

			extern "C" fn on_unload() {
				let _ = #shim_ident.shutdown();
			}
		};
	})
}

/// The one function declared in the block
fn single_function(block: &ItemForeignMod) -> syn::Result<&ForeignItemFn> {
	let mut functions = block.items.iter().filter_map(|item| match item {
		ForeignItem::Fn(function) => Some(function),
		_ => None,
	});

	let first = functions
		.next()
		.ok_or_else(|| Error::new_spanned(&block.abi, "expected one function declaration"))?;
	if let Some(extra) = functions.next() {
		return Err(Error::new_spanned(&extra.sig, "a shim intercepts exactly one function"));
	}
	if let Some(other) = block.items.iter().find(|item| !matches!(item, ForeignItem::Fn(_))) {
		return Err(Error::new_spanned(other, "only a function declaration is allowed here"));
	}
	Ok(first)
}

/// The symbol named by `#[link_name = "..."]` on the declaration
fn link_name(function: &ForeignItemFn) -> syn::Result<Option<LitStr>> {
	let mut found = None;
	for attr in function.attrs.iter().filter(|attr| attr.path().is_ident("link_name")) {
		if found.is_some() {
			return Err(Error::new_spanned(attr, "duplicate `#[link_name]`"));
		}
		let value = &attr.meta.require_name_value()?.value;
		let Expr::Lit(ExprLit { lit: Lit::Str(name), .. }) = value else {
			return Err(Error::new_spanned(value, "`#[link_name]` takes a string literal"));
		};
		if name.value().is_empty() {
			return Err(Error::new_spanned(name, "symbol name must not be empty"));
		}
		found = Some(name.clone());
	}
	Ok(found)
}

/// Parameter names and types; unnamed (`_`) parameters get generated names
fn parameters(function: &ForeignItemFn) -> syn::Result<(Vec<Ident>, Vec<Type>)> {
	let mut names = Vec::new();
	let mut types = Vec::new();

	for (index, input) in function.sig.inputs.iter().enumerate() {
		let FnArg::Typed(arg) = input else {
			return Err(Error::new_spanned(input, "interposed functions cannot take `self`"));
		};
		let name = match &*arg.pat {
			Pat::Ident(pat) => pat.ident.clone(),
			Pat::Wild(_) => format_ident!("arg{}", index),
			other => return Err(Error::new_spanned(other, "parameters must be plain identifiers")),
		};
		names.push(name);
		types.push((*arg.ty).clone());
	}

	Ok((names, types))
}

/// Source-like spelling of a type, e.g. `*mut c_void` or `std::ffi::c_int`
fn type_name(ty: &Type) -> String {
	match ty {
		Type::Ptr(ptr) => {
			let mutability = if ptr.mutability.is_some() { "mut" } else { "const" };
			format!("*{} {}", mutability, type_name(&ptr.elem))
		},
		Type::Reference(reference) => {
			let mut name = String::from("&");
			if let Some(lifetime) = &reference.lifetime {
				name.push_str(&format!("{lifetime} "));
			}
			if reference.mutability.is_some() {
				name.push_str("mut ");
			}
			name + &type_name(&reference.elem)
		},
		Type::Path(path) if path.qself.is_none() => path_name(path),
		Type::Array(array) => {
			let len = &array.len;
			format!("[{}; {}]", type_name(&array.elem), quote!(#len))
		},
		Type::Slice(slice) => format!("[{}]", type_name(&slice.elem)),
		Type::Tuple(tuple) => {
			let elems: Vec<_> = tuple.elems.iter().map(type_name).collect();
			if elems.len() == 1 {
				format!("({},)", elems[0])
			} else {
				format!("({})", elems.join(", "))
			}
		},
		Type::Paren(paren) => type_name(&paren.elem),
		Type::Group(group) => type_name(&group.elem),
		other => quote!(#other).to_string(),
	}
}

fn path_name(path: &TypePath) -> String {
	let mut name = String::new();
	if path.path.leading_colon.is_some() {
		name.push_str("::");
	}
	let segments: Vec<_> = path
		.path
		.segments
		.iter()
		.map(|segment| {
			let mut segment_name = segment.ident.to_string();
			if let PathArguments::AngleBracketed(generics) = &segment.arguments {
				let args: Vec<_> = generics
					.args
					.iter()
					.map(|arg| match arg {
						GenericArgument::Type(ty) => type_name(ty),
						other => quote!(#other).to_string(),
					})
					.collect();
				segment_name.push_str(&format!("<{}>", args.join(", ")));
			} else if let PathArguments::Parenthesized(args) = &segment.arguments {
				segment_name.push_str(&quote!(#args).to_string());
			}
			segment_name
		})
		.collect();
	name + &segments.join("::")
}
