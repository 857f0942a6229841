#[path = "../common/mod.rs"]
mod common;

mod cli_tests;
#[cfg(unix)]
mod soak_tests;

#[ctor::ctor]
fn setup() {
    faultline_common::testing::init_global_test_logging();
}
