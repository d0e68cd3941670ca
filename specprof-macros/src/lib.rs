extern crate proc_macro;

use proc_macro::TokenStream;

mod interpose;

use interpose::expand_interpose;

/// Turn a foreign function declaration into an interposer shim
///
/// The `extern` block must declare exactly one function, with the exact
/// parameter list and return type of the original. The macro exports a
/// function under the original's symbol name that forwards every call to
/// the original in `library`, counting and timing it, and prints a report
/// when the library is unloaded. The shim state is exposed as a
/// `pub static <NAME>_SHIM`.
///
/// Arguments:
/// - `library = "..."` (required) path or loader name of the original's library
/// - `symbol = "..."` export name, when it differs from the function name;
///   `#[link_name = "..."]` on the declaration does the same
/// - `owner = "..."` marks a C++ member function; the first parameter is `this`
/// - `lazy` resolve on the first call instead of at load time
/// - `no_report` skip the exit report
/// - `trace` emit a trace event around every call
///
/// # Reentrancy
///
/// The forwarding path itself resolves symbols, reads clocks, takes a
/// one-time lock and writes to stderr/stdout. Interposing a function that
/// path depends on (`malloc`, `write`, `clock_gettime`, `dlsym`, ...) makes
/// the shim call itself: it recurses, or deadlocks inside the first
/// resolution. Such functions cannot be shimmed.
///
/// # Example
///
/// ```ignore
/// #[specprof_rs::interpose(library = "libm.so.6")]
/// unsafe extern "C" {
///     fn cos(x: f64) -> f64;
/// }
/// ```
#[proc_macro_attribute]
pub fn interpose(attr: TokenStream, item: TokenStream) -> TokenStream {
	expand_interpose(attr, item)
}
