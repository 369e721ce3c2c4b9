#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::fs;
use std::process::{Command, Output};

fn apigen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_apigen"))
        .args(args)
        .env_remove("APIGEN_LOG")
        .output()
        .expect("run apigen")
}

#[test]
fn test_cli_prints_to_stdout() {
    let (_tmp, dir) = common::source_dir(&[("api.rs", common::API), ("model.rs", common::MODEL)]);
    let output = apigen(&["-o", "-", dir.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("// !!! Do not change this code !!!"));
    assert!(stdout.contains("impl Service {"));
    assert!(!dir.join("service_apigen.rs").exists());
}

#[test]
fn test_cli_writes_default_output_from_files() {
    let (_tmp, dir) = common::source_dir(&[("api.rs", common::API), ("model.rs", common::MODEL)]);
    let api = dir.join("api.rs");
    let model = dir.join("model.rs");
    let output = apigen(&[api.to_str().unwrap(), model.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let generated = fs::read_to_string(dir.join("service_apigen.rs")).unwrap();
    assert!(generated.contains("impl DeleteUser {"));

    let check = apigen(&["--check", dir.to_str().unwrap()]);
    assert!(check.status.success());
}

#[test]
fn test_cli_reports_positioned_error() {
    let (_tmp, dir) = common::source_dir(&[("api.rs", common::API)]);
    let output = apigen(&[dir.to_str().unwrap()]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("api.rs:8:"), "{stderr}");
    assert!(stderr.contains("param struct CreateUser not found"), "{stderr}");
    assert!(!dir.join("service_apigen.rs").exists());
}

#[test]
fn test_cli_rejects_files_from_different_directories() {
    let (_tmp_a, a) = common::source_dir(&[("api.rs", common::API)]);
    let (_tmp_b, b) = common::source_dir(&[("model.rs", common::MODEL)]);
    let output = apigen(&[
        a.join("api.rs").to_str().unwrap(),
        b.join("model.rs").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("all files must be in the same directory"), "{stderr}");
}

#[test]
fn test_cli_package_selection() {
    let other = "//! apigen:package billing\n#[derive(Default)]\npub struct Invoice {}\n";
    let (_tmp, dir) = common::source_dir(&[
        ("api.rs", common::API),
        ("model.rs", common::MODEL),
        ("billing.rs", other),
    ]);
    let path = dir.to_str().unwrap();

    let output = apigen(&["-o", "-", path]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("detected more than one package"), "{stderr}");

    let output = apigen(&["-o", "-", "-p", "service", path]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = apigen(&["-o", "-", "-p", "shipping", path]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("shipping package not found"), "{stderr}");
}
