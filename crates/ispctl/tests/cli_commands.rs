#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::Command;

fn ispctl() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ispctl"));
    cmd.arg("--log-level").arg("error");
    cmd
}

/// A /tmp path that is guaranteed not to exist and is never created.
fn missing_device_path(tag: &str) -> PathBuf {
    PathBuf::from(format!(
        "/tmp/ispctl-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

#[test]
fn version_prints_package_version() {
    let output = ispctl()
        .arg("version")
        .output()
        .expect("version command should run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    assert_eq!(stdout, format!("ispctl {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn extended_version_reports_build_target() {
    let output = ispctl()
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version command should run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    assert!(stdout.contains("target_os:"));
    assert!(stdout.contains("features:"));
}

#[test]
fn unknown_feature_is_a_usage_error() {
    let output = ispctl()
        .arg("get")
        .arg("saturation")
        .output()
        .expect("get command should run");

    // clap reports bad values on its own exit code, before any device I/O.
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr should be utf-8");
    assert!(stderr.contains("invalid value"));
}

#[test]
fn missing_device_exits_with_failure() {
    let device = missing_device_path("no-such-node");
    let output = ispctl()
        .arg("get")
        .arg("aec")
        .arg("-d")
        .arg(&device)
        .output()
        .expect("get command should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr should be utf-8");
    assert!(stderr.contains("open device"));
}

#[test]
fn zero_timeout_is_rejected_before_device_open() {
    let device = missing_device_path("timeout-check");
    let output = ispctl()
        .arg("get")
        .arg("aec")
        .arg("-d")
        .arg(&device)
        .arg("--timeout")
        .arg("0s")
        .output()
        .expect("get command should run");

    // Duration validation fires first, so the nonexistent device is never
    // touched and the usage code wins over the open failure.
    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8(output.stderr).expect("stderr should be utf-8");
    assert!(stderr.contains("duration"));
}

#[test]
fn set_requires_a_feature_subcommand() {
    let output = ispctl()
        .arg("set")
        .output()
        .expect("set command should run");

    assert_eq!(output.status.code(), Some(2));
}
