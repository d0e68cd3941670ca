//! Utility modules for specprof

pub mod logging;

pub use logging::init_logging;
