#[path = "../common/mod.rs"]
mod common;

mod cli_tests;
mod server_tests;

#[ctor::ctor]
fn setup() {
    faultline_common::testing::init_global_test_logging();
}
