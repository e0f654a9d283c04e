#![cfg(unix)]

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

use stark_harness::config::PERMUTATION_CMD_ENV;
use stark_harness::scratch::ScratchDir;

use common::{mock_stark, write_script};

const CONSTANT_PERMUTATION: &str = r#"cat >/dev/null; echo '{"output":["0x1","0x2","0x3","0x4"]}'"#;

fn harness() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_stark-harness"));
    command.env_remove(PERMUTATION_CMD_ENV).env_remove("RUST_LOG");
    command
}

fn permutation_script(dir: &Path) -> PathBuf {
    write_script(dir, "permutation", CONSTANT_PERMUTATION)
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("file written")).expect("valid json")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn ziggy_keys_writes_private_and_public_inputs() {
    let scratch = ScratchDir::new("cli-keys").expect("scratch");
    let out_dir = scratch.file("out");
    let output = harness()
        .arg("--permutation-cmd")
        .arg(permutation_script(scratch.path()))
        .args(["ziggy-keys", "--private_key", "0x01", "--out-dir"])
        .arg(&out_dir)
        .output()
        .expect("harness runs");
    assert!(output.status.success(), "{}", stderr(&output));

    let public = read(&out_dir.join("ziggy_public_input.json"));
    assert_eq!(public["message"], "Hello World!");
    assert_eq!(public["public_key"], serde_json::json!(["0x1", "0x2", "0x3", "0x4"]));

    let private = read(&out_dir.join("ziggy_private_input.json"));
    let key = private["private_key"].as_str().expect("hex private key");
    assert_eq!(key.len(), 2 + 64);
    assert!(key.ends_with("01"));
}

#[test]
fn ziggy_keys_without_permutation_fails() {
    let scratch = ScratchDir::new("cli-nokeys").expect("scratch");
    let output = harness()
        .args(["ziggy-keys", "--out-dir"])
        .arg(scratch.path())
        .output()
        .expect("harness runs");
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("no permutation command configured"));
}

#[test]
fn rescue_input_rejects_chain_length_off_instance_boundary() {
    let scratch = ScratchDir::new("cli-chain").expect("scratch");
    let output = harness()
        .arg("--permutation-cmd")
        .arg(permutation_script(scratch.path()))
        .args(["rescue-input", "--chain_length", "4", "--out-dir"])
        .arg(scratch.path())
        .output()
        .expect("harness runs");
    assert_eq!(output.status.code(), Some(2));
    assert!(!scratch.file("rescue_public_input.json").exists());
}

#[test]
fn rescue_input_writes_witness_and_claim() {
    let scratch = ScratchDir::new("cli-rescue").expect("scratch");
    let output = harness()
        .arg("--permutation-cmd")
        .arg(permutation_script(scratch.path()))
        .args(["rescue-input", "--chain_length", "6", "--out-dir"])
        .arg(scratch.path())
        .output()
        .expect("harness runs");
    assert!(output.status.success(), "{}", stderr(&output));

    let public = read(&scratch.file("rescue_public_input.json"));
    assert_eq!(public["chain_length"], 6);
    assert_eq!(public["output"], serde_json::json!(["0x1", "0x2", "0x3", "0x4"]));
    assert!(scratch.file("rescue_private_input.json").is_file());
}

#[test]
fn unknown_scheme_is_rejected() {
    let output = harness()
        .args(["run", "--scheme", "sha256"])
        .output()
        .expect("harness runs");
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unknown scheme"));
}

#[test]
fn run_against_missing_build_tree_fails() {
    let output = harness()
        .args(["run", "--scheme", "ziggy", "--build-dir", "/nonexistent/build"])
        .output()
        .expect("harness runs");
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("executable not found"));
}

/// Lays out `<build>/Release/src/starkware/main/<scheme>/<scheme>_{prover,verifier}`
/// as wrappers around the mock binary.
fn mock_build_tree(build_dir: &Path) {
    let exec_mock = format!("exec {} \"$@\"", mock_stark().display());
    for scheme in ["rescue", "ziggy"] {
        let dir = build_dir.join("Release/src/starkware/main").join(scheme);
        fs::create_dir_all(&dir).expect("build tree");
        write_script(&dir, &format!("{scheme}_prover"), &exec_mock);
        write_script(&dir, &format!("{scheme}_verifier"), &exec_mock);
    }
}

#[test]
fn run_all_against_mock_build_tree_writes_report() {
    let scratch = ScratchDir::new("cli-run").expect("scratch");
    let build_dir = scratch.file("build");
    mock_build_tree(&build_dir);
    let report_path = scratch.file("report.json");

    let output = harness()
        .arg("--permutation-cmd")
        .arg(permutation_script(scratch.path()))
        .args(["run", "--scheme", "all", "--jobs", "4", "--seed", "11", "--build-dir"])
        .arg(&build_dir)
        .arg("--report")
        .arg(&report_path)
        .output()
        .expect("harness runs");
    assert!(output.status.success(), "{}", stderr(&output));

    let report = read(&report_path);
    let suites = report.as_array().expect("one entry per scheme");
    assert_eq!(suites.len(), 2);
    assert_eq!(suites[0]["scheme"], "rescue");
    assert_eq!(suites[1]["scheme"], "ziggy");
    for suite in suites {
        assert_eq!(suite["seed"], 11);
        for result in suite["results"].as_array().expect("results") {
            assert_eq!(result["passed"], true, "{result}");
        }
    }
}
