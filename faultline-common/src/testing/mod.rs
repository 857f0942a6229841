//! Test support shared by the Faultline crates.

pub mod log;

pub use log::init_global_test_logging;
