//! Binary-level tests for the `hubhook` command.

use assert_cmd::Command;
use predicates::prelude::*;

const SECRET: &str = "It's a Secret to Everybody";
const SIGNATURE: &str = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";

fn hubhook() -> Command {
    let mut cmd = Command::cargo_bin("hubhook").unwrap();
    cmd.env_remove("HUBHOOK_CONFIG_FILE");
    cmd
}

#[test]
fn test_sign_from_stdin() {
    hubhook()
        .args(["sign", "--secret", SECRET, "-"])
        .write_stdin("Hello, World!")
        .assert()
        .success()
        .stdout(predicate::str::contains(SIGNATURE));
}

#[test]
fn test_verify_success_prints_payload() {
    let body = r#"{"zen":"Keep it logically awesome."}"#;
    let signature = hubhook()
        .args(["sign", "--secret", SECRET, "-"])
        .write_stdin(body)
        .output()
        .unwrap()
        .stdout;
    let signature = String::from_utf8(signature).unwrap();

    hubhook()
        .args([
            "verify",
            "--secret",
            SECRET,
            "--signature",
            signature.trim(),
            "--event",
            "ping",
            "-",
        ])
        .write_stdin(body)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("signature: match"))
        .stdout(predicate::str::contains("Keep it logically awesome."));
}

#[test]
fn test_bad_signature_exit_code() {
    hubhook()
        .args(["verify", "--secret", SECRET, "--signature", SIGNATURE, "-"])
        .write_stdin("Goodbye, World!")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_unsupported_content_type_exit_code() {
    hubhook()
        .args(["verify", "--content-type", "text/xml", "-"])
        .write_stdin("<a/>")
        .assert()
        .code(3);
}

#[test]
fn test_malformed_payload_exit_code() {
    hubhook()
        .args(["verify", "-"])
        .write_stdin("not json")
        .assert()
        .code(4);
}

#[test]
fn test_config_missing_file_fails() {
    hubhook()
        .args(["config", "--file", "/nonexistent/hubhook.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CLI error"));
}

#[test]
fn test_help_lists_commands() {
    hubhook()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sign"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("config"));
}
