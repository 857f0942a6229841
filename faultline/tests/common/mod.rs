pub mod assertions;
pub mod logging;

pub use assertions::{assert_contains, assert_path_exists};
pub use logging::init_test_logging;

use std::process::{Command, Output};

/// Run `faultline` with `args`, scrubbing FAULTLINE_ variables from the environment.
pub fn run_faultline(args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_faultline"));
    for (key, _) in std::env::vars() {
        if key.starts_with("FAULTLINE_") {
            cmd.env_remove(key);
        }
    }
    cmd.args(args).output().expect("Failed to run faultline")
}
