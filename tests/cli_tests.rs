//! CLI integration tests

use std::process::Command;

fn fileclip_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fileclip"));
    // Keep the user's config file out of the picture
    cmd.env("XDG_CONFIG_HOME", "/nonexistent");
    cmd
}

#[test]
fn help_output() {
    let output = fileclip_bin()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("clipboard"));
    assert!(stdout.contains("--dir"));
    assert!(stdout.contains("--use-watcher"));
    assert!(stdout.contains("--no-watcher"));
    assert!(stdout.contains("--watcher-timeout"));
    assert!(stdout.contains("--ping-timeout"));
    assert!(stdout.contains("--force-polling"));
    assert!(stdout.contains("--log-level"));
    assert!(stdout.contains("watch"));
}

#[test]
fn version_output() {
    let output = fileclip_bin()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fileclip"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_command() {
    let output = fileclip_bin()
        .args(["config", "path"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fileclip"));
    assert!(stdout.contains("config.toml"));
}

#[test]
fn config_help() {
    let output = fileclip_bin()
        .args(["config", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("init"));
    assert!(stdout.contains("set"));
    assert!(stdout.contains("get"));
    assert!(stdout.contains("list"));
    assert!(stdout.contains("path"));
}

#[test]
fn watch_help() {
    let output = fileclip_bin()
        .args(["watch", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--force-polling"));
    assert!(stdout.contains("--log-level"));
}

#[test]
fn config_roundtrip_in_temp_home() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let run = |args: &[&str]| {
        Command::new(env!("CARGO_BIN_EXE_fileclip"))
            .env("XDG_CONFIG_HOME", tmp.path())
            .env("HOME", tmp.path())
            .args(args)
            .output()
            .expect("Failed to execute command")
    };

    let set = run(&["config", "set", "watcher_timeout", "20s"]);
    assert!(set.status.success(), "{}", String::from_utf8_lossy(&set.stderr));

    let get = run(&["config", "get", "watcher_timeout"]);
    assert!(get.status.success());
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), "20s");

    let list = run(&["config", "list"]);
    let stdout = String::from_utf8_lossy(&list.stdout);
    assert!(stdout.contains("host_workspace"));
    assert!(stdout.contains("(not set)"));
}
