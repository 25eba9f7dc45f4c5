//! Integration tests for the `hostwatch` CLI binary.
//!
//! Every test gets its own temp directory for the registry document and the
//! config directories, so nothing touches the user's real files.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn data_file(&self) -> PathBuf {
        self.dir.path().join("ipList.json")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// `hostwatch` with env isolation and the sandbox registry.
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = bare_cmd(self.dir.path());
        cmd.arg("--data-file").arg(self.data_file());
        cmd
    }

    fn add(&self, name: &str, ip: &str) {
        self.cmd()
            .args(["devices", "add", name, ip])
            .assert()
            .success();
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().args(["-o", "json"]).args(args).output().unwrap();
        assert!(
            output.status.success(),
            "{args:?} failed:\n{}",
            combined_output(&output)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

/// Build a [`Command`] for the `hostwatch` binary with env isolation.
///
/// Clears the `HOSTWATCH_*` variables the CLI reads and points the home and
/// config directories into `home`.
fn bare_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("hostwatch");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("HOSTWATCH_CONFIG")
        .env_remove("HOSTWATCH_DATA_FILE")
        .env_remove("HOSTWATCH_OUTPUT")
        .env_remove("HOSTWATCH_TIMEOUT_MS")
        .env_remove("HOSTWATCH_POLL_INTERVAL_SECS")
        .env_remove("HOSTWATCH_PROBE_TIMEOUT_MS")
        .env_remove("HOSTWATCH_PROBE_ATTEMPTS")
        .env_remove("HOSTWATCH_MAX_CONCURRENT_PROBES")
        .env_remove("HOSTWATCH_MAX_ROUND_TRIP_MS");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn ips(list: &serde_json::Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|d| d["ip"].as_str().unwrap().to_owned())
        .collect()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let sandbox = Sandbox::new();
    let output = bare_cmd(sandbox.dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let sandbox = Sandbox::new();
    bare_cmd(sandbox.dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("devices")
                .and(predicate::str::contains("trash"))
                .and(predicate::str::contains("poll"))
                .and(predicate::str::contains("watch")),
        );
}

#[test]
fn test_version_flag() {
    let sandbox = Sandbox::new();
    bare_cmd(sandbox.dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hostwatch"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_zsh() {
    let sandbox = Sandbox::new();
    bare_cmd(sandbox.dir.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    let sandbox = Sandbox::new();
    bare_cmd(sandbox.dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Devices ─────────────────────────────────────────────────────────

#[test]
fn test_empty_registry_lists_nothing() {
    let sandbox = Sandbox::new();
    assert_eq!(sandbox.json(&["devices", "list"]), serde_json::json!([]));
    assert!(!sandbox.data_file().exists());
}

#[test]
fn test_add_persists_pending_device() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["devices", "add", "Router1", "10.0.0.1", "--site", "HQ"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Added Router1 (10.0.0.1)"));

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(sandbox.data_file()).unwrap()).unwrap();
    assert_eq!(doc["ipList"][0]["ip"], "10.0.0.1");
    assert_eq!(doc["ipList"][0]["status"], "Pending");
    assert_eq!(doc["ipList"][0]["site"], "HQ");
    assert_eq!(doc["deletedIps"], serde_json::json!([]));
}

#[test]
fn test_list_keeps_insertion_order() {
    let sandbox = Sandbox::new();
    sandbox.add("B", "10.0.0.2");
    sandbox.add("A", "10.0.0.1");
    sandbox.add("C", "10.0.0.3");

    let list = sandbox.json(&["devices", "list"]);
    assert_eq!(ips(&list), ["10.0.0.2", "10.0.0.1", "10.0.0.3"]);

    sandbox
        .cmd()
        .args(["-o", "plain", "devices", "list"])
        .assert()
        .success()
        .stdout("10.0.0.2\n10.0.0.1\n10.0.0.3\n");
}

#[test]
fn test_duplicate_ip_exits_with_conflict() {
    let sandbox = Sandbox::new();
    sandbox.add("Router1", "10.0.0.1");

    let output = sandbox
        .cmd()
        .args(["devices", "add", "Other", "10.0.0.1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("already registered"));
    assert_eq!(sandbox.json(&["devices", "list"]).as_array().unwrap().len(), 1);
}

#[test]
fn test_invalid_ip_is_a_usage_error() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["devices", "add", "Broken", "not-an-ip"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!sandbox.data_file().exists());
}

#[test]
fn test_get_unknown_device_exits_not_found() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["devices", "get", "10.9.9.9"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("devices list"));
}

#[test]
fn test_edit_changes_fields_and_keeps_the_rest() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["devices", "add", "Router1", "10.0.0.1", "--site", "HQ"])
        .args(["--location", "Rack 2"])
        .assert()
        .success();

    sandbox
        .cmd()
        .args(["devices", "edit", "10.0.0.1", "--name", "Core", "--clear-site"])
        .assert()
        .success();

    let device = sandbox.json(&["devices", "get", "10.0.0.1"]);
    assert_eq!(device["name"], "Core");
    assert!(device.get("site").is_none());
    assert_eq!(device["location"], "Rack 2");
    assert_eq!(device["status"], "Pending");
}

// ── Trash ───────────────────────────────────────────────────────────

#[test]
fn test_delete_and_restore_round_trip() {
    let sandbox = Sandbox::new();
    sandbox.add("A", "10.0.0.1");
    sandbox.add("B", "10.0.0.2");

    sandbox
        .cmd()
        .args(["devices", "delete", "10.0.0.1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("trash restore 10.0.0.1"));

    assert_eq!(ips(&sandbox.json(&["devices", "list"])), ["10.0.0.2"]);
    assert_eq!(ips(&sandbox.json(&["trash", "list"])), ["10.0.0.1"]);

    sandbox
        .cmd()
        .args(["trash", "restore", "10.0.0.1"])
        .assert()
        .success();

    // restored devices go to the end
    assert_eq!(
        ips(&sandbox.json(&["devices", "list"])),
        ["10.0.0.2", "10.0.0.1"]
    );
    assert_eq!(sandbox.json(&["trash", "list"]), serde_json::json!([]));
}

#[test]
fn test_purge_requires_confirmation_without_a_terminal() {
    let sandbox = Sandbox::new();
    sandbox.add("A", "10.0.0.1");
    sandbox
        .cmd()
        .args(["devices", "delete", "10.0.0.1"])
        .assert()
        .success();

    let output = sandbox
        .cmd()
        .args(["trash", "purge", "10.0.0.1"])
        .write_stdin("")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
    assert_eq!(ips(&sandbox.json(&["trash", "list"])), ["10.0.0.1"]);

    sandbox
        .cmd()
        .args(["-y", "trash", "purge", "10.0.0.1"])
        .assert()
        .success();
    assert_eq!(sandbox.json(&["trash", "list"]), serde_json::json!([]));
}

#[test]
fn test_restore_unknown_ip_points_at_trash_list() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["trash", "restore", "10.0.0.1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("trash list"));
}

#[test]
fn test_empty_trash_with_yes() {
    let sandbox = Sandbox::new();
    sandbox.add("A", "10.0.0.1");
    sandbox.add("B", "10.0.0.2");
    for ip in ["10.0.0.1", "10.0.0.2"] {
        sandbox
            .cmd()
            .args(["devices", "delete", ip])
            .assert()
            .success();
    }

    sandbox
        .cmd()
        .args(["--yes", "trash", "empty"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Purged 2 device(s)"));
    assert_eq!(sandbox.json(&["trash", "list"]), serde_json::json!([]));
}

// ── Import / export ─────────────────────────────────────────────────

#[test]
fn test_import_reports_bad_rows_and_keeps_good_ones() {
    let sandbox = Sandbox::new();
    let csv = sandbox.path("devices.csv");
    std::fs::write(
        &csv,
        "name,ip,site\nRouter1,10.0.0.1,HQ\nBroken,nope,HQ\nSwitch,10.0.0.2,\n",
    )
    .unwrap();

    let report = sandbox.json(&["import", csv.to_str().unwrap()]);
    assert_eq!(report["added"].as_array().unwrap().len(), 2);
    assert_eq!(report["rejected"][0]["line"], 3);

    assert_eq!(
        ips(&sandbox.json(&["devices", "list"])),
        ["10.0.0.1", "10.0.0.2"]
    );
}

#[test]
fn test_export_writes_header_and_rows() {
    let sandbox = Sandbox::new();
    sandbox.add("Router1", "10.0.0.1");

    sandbox
        .cmd()
        .arg("export")
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("Name,IP,Site,Location,Type,Status")
                .and(predicate::str::contains("Router1,10.0.0.1")),
        );

    let out = sandbox.path("out.csv");
    sandbox
        .cmd()
        .arg("export")
        .arg(&out)
        .assert()
        .success();
    assert!(std::fs::read_to_string(out).unwrap().contains("Pending"));
}

// ── Polling ─────────────────────────────────────────────────────────

#[test]
fn test_poll_empty_registry() {
    let sandbox = Sandbox::new();
    assert_eq!(sandbox.json(&["poll"]), serde_json::json!([]));
}

#[test]
fn test_poll_settles_every_device() {
    let sandbox = Sandbox::new();
    sandbox.add("Loopback", "127.0.0.1");

    // Connected with ICMP permissions, Disconnected without; never Pending
    let polled = sandbox.json(&["--timeout-ms", "500", "poll"]);
    assert_ne!(polled[0]["status"], "Pending");

    let stored = sandbox.json(&["devices", "get", "127.0.0.1"]);
    assert_eq!(stored["status"], polled[0]["status"]);
}

#[test]
fn test_zero_timeout_is_rejected() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["--timeout-ms", "0", "poll"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    let sandbox = Sandbox::new();
    let path = sandbox.path("custom.toml");
    sandbox
        .cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_defaults_then_refuses_overwrite() {
    let sandbox = Sandbox::new();
    let path = sandbox.path("config.toml");

    sandbox
        .cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "init", "--defaults"])
        .assert()
        .success();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("poll_interval_secs = 5"));

    let output = sandbox
        .cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "init", "--defaults"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("--force"));
}

#[test]
fn test_config_file_sets_default_output() {
    let sandbox = Sandbox::new();
    let path = sandbox.path("config.toml");
    std::fs::write(&path, "[defaults]\noutput = \"plain\"\n").unwrap();
    sandbox.add("A", "10.0.0.1");

    sandbox
        .cmd()
        .arg("--config")
        .arg(&path)
        .args(["devices", "list"])
        .assert()
        .success()
        .stdout("10.0.0.1\n");
}

#[test]
fn test_invalid_config_value_is_reported() {
    let sandbox = Sandbox::new();
    let path = sandbox.path("config.toml");
    std::fs::write(&path, "probe_timeout_ms = 0\n").unwrap();

    let output = sandbox
        .cmd()
        .arg("--config")
        .arg(&path)
        .args(["devices", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("probe_timeout_ms"));
}
