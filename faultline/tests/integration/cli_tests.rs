use crate::common::{assert_contains, init_test_logging, run_faultline};

#[test]
fn test_faultline_help_includes_usage() {
    init_test_logging();
    crate::test_log!("TEST START: test_faultline_help_includes_usage");

    let output = run_faultline(&["--help"]);
    assert!(output.status.success(), "faultline --help failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "--iterations");
    assert_contains(&stdout, "--timeout");
    assert_contains(&stdout, "{i}");

    crate::test_log!("TEST PASS: test_faultline_help_includes_usage");
}

#[test]
fn test_faultline_version() {
    init_test_logging();

    let output = run_faultline(&["--version"]);
    assert!(output.status.success());
    assert_contains(&String::from_utf8_lossy(&output.stdout), env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_empty_command_exits_two() {
    init_test_logging();
    crate::test_log!("TEST START: test_empty_command_exits_two");

    let output = run_faultline(&["--iterations", "3"]);
    assert_eq!(output.status.code(), Some(2));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "No command provided");
    assert!(
        !String::from_utf8_lossy(&output.stdout).contains("Summary:"),
        "nothing should run without a command"
    );

    crate::test_log!("TEST PASS: test_empty_command_exits_two");
}

#[test]
fn test_negative_sleep_is_rejected() {
    init_test_logging();

    let output = run_faultline(&["--sleep=-1", "--", "balances"]);
    assert!(!output.status.success());
    assert_contains(&String::from_utf8_lossy(&output.stderr), "--sleep");
}

#[test]
fn test_missing_program_counts_as_crash() {
    init_test_logging();

    let output = run_faultline(&[
        "--exec",
        "faultline-no-such-client",
        "--iterations",
        "2",
        "--sleep",
        "0",
        "--",
        "balances",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "[001] FAIL exit=-1");
    assert_contains(&stdout, "[002] FAIL exit=-1");
    assert_contains(&stdout, "crashes (non-zero or timeout): 2");
}
