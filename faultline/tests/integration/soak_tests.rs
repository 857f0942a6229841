use crate::common::{assert_contains, assert_path_exists, init_test_logging, run_faultline};

#[test]
fn test_clean_runs_exit_zero() {
    init_test_logging();
    crate::test_log!("TEST START: test_clean_runs_exit_zero");

    let output = run_faultline(&[
        "--exec", "sh", "--iterations", "5", "--sleep", "0", "--", "-c", "echo Balances OK",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "stdout: {stdout}");
    for i in 1..=5 {
        assert_contains(&stdout, &format!("[{i:03}] OK exit=0"));
    }
    assert_contains(&stdout, "successes: 5");
    assert_contains(&stdout, "rate_limits: 0");
    assert_contains(&stdout, "retriable_seen: 0");
    assert_contains(&stdout, "crashes (non-zero or timeout): 0");

    crate::test_log!("TEST PASS: test_clean_runs_exit_zero");
}

#[test]
fn test_markers_are_tallied() {
    init_test_logging();

    let output = run_faultline(&[
        "--exec",
        "sh",
        "--iterations",
        "2",
        "--sleep",
        "0",
        "--",
        "-c",
        "echo 'Retriable error: 503'; echo 'Rate limit exceeded' 1>&2",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "stdout: {stdout}");
    assert_contains(&stdout, "[001] RATE_LIMIT exit=0");
    assert_contains(&stdout, "retriable=Y");
    assert_contains(&stdout, "successes: 0");
    assert_contains(&stdout, "rate_limits: 2");
    assert_contains(&stdout, "retriable_seen: 2");
}

#[test]
fn test_timeout_exits_two() {
    init_test_logging();
    crate::test_log!("TEST START: test_timeout_exits_two");

    let output = run_faultline(&[
        "--exec", "sh", "--iterations", "1", "--timeout", "0.5", "--", "-c", "sleep 5",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(2), "stdout: {stdout}");
    assert_contains(&stdout, "[001] TIMEOUT after 0.5s");
    assert_contains(&stdout, "crashes (non-zero or timeout): 1");
    assert_contains(&stdout, "max: 0.00");

    crate::test_log!("TEST PASS: test_timeout_exits_two");
}

#[test]
fn test_log_dir_receives_raw_output() {
    init_test_logging();

    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("raw");
    let log_dir_arg = log_dir.to_string_lossy().to_string();
    let output = run_faultline(&[
        "--exec",
        "echo",
        "--iterations",
        "2",
        "--sleep",
        "0",
        "--log-dir",
        &log_dir_arg,
        "--",
        "order-{i}",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let first = log_dir.join("order-i-0001.log");
    assert_path_exists(&first);
    assert_eq!(std::fs::read_to_string(&first).unwrap().trim(), "order-1");
    let second = log_dir.join("order-i-0002.log");
    assert_eq!(std::fs::read_to_string(&second).unwrap().trim(), "order-2");
}
