use std::process::Command;

use crate::common::init_test_logging;

#[test]
fn test_faultlined_help_includes_usage() {
    init_test_logging();
    crate::test_log!("TEST START: test_faultlined_help_includes_usage");

    let output = Command::new(env!("CARGO_BIN_EXE_faultlined"))
        .arg("--help")
        .output()
        .expect("Failed to run faultlined --help");

    assert!(output.status.success(), "faultlined --help failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("faultlined"), "Expected usage, got: {stdout}");
    assert!(stdout.contains("--port"), "Expected --port, got: {stdout}");

    crate::test_log!("TEST PASS: test_faultlined_help_includes_usage");
}

#[test]
fn test_faultlined_version() {
    init_test_logging();

    let output = Command::new(env!("CARGO_BIN_EXE_faultlined"))
        .arg("--version")
        .output()
        .expect("Failed to run faultlined --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "got: {stdout}");
}

#[test]
fn test_faultlined_rejects_bad_port() {
    init_test_logging();

    let output = Command::new(env!("CARGO_BIN_EXE_faultlined"))
        .args(["--port", "not-a-port"])
        .output()
        .expect("Failed to run faultlined");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--port"), "got: {stderr}");
}
