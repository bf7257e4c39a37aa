//! End-to-end tests for the regguard binary

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn regguard(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_regguard"))
        .args(args)
        .env_remove("REGGUARD_CONFIG")
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_clean_input_exits_zero() {
    let output = regguard(&["check"], "hello world");
    assert_eq!(output.status.code(), Some(0));

    let report = stdout_json(&output);
    assert_eq!(report["overallCompliant"], true);
    assert_eq!(report["moduleResults"].as_object().unwrap().len(), 6);
}

#[test]
fn test_non_compliant_input_exits_two() {
    let output = regguard(&["check"], "Contact jane.doe@gmail.com about the invoice");
    assert_eq!(output.status.code(), Some(2));

    let report = stdout_json(&output);
    assert_eq!(report["overallCompliant"], false);
    assert_eq!(report["moduleResults"]["data_protection"]["compliant"], false);
}

#[test]
fn test_disable_removes_module_from_round() {
    let output = regguard(
        &["check", "--disable", "data_protection"],
        "Contact jane.doe@gmail.com about the invoice",
    );
    assert_eq!(output.status.code(), Some(0));

    let report = stdout_json(&output);
    assert!(report["moduleResults"].get("data_protection").is_none());
}

#[test]
fn test_context_reaches_modules() {
    let output = regguard(&["check", "--context", "recipient_country=KP"], "invoice");
    assert_eq!(output.status.code(), Some(2));

    let report = stdout_json(&output);
    assert_eq!(
        report["moduleResults"]["sanctions"]["violations"][0]["type"],
        "SANCTIONED_RECIPIENT"
    );
}

#[test]
fn test_config_file_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("regguard.yaml");
    std::fs::write(
        &config,
        "modules:\n  - kind: sanctions\n  - name: gdpr\n    kind: data_protection\n    enabled: false\n",
    )
    .unwrap();

    let output = regguard(&["--config", config.to_str().unwrap(), "list"], "");
    assert_eq!(output.status.code(), Some(0));

    let text = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = text.lines().map(|l| l.split_whitespace().collect::<Vec<_>>()).collect();
    assert_eq!(lines, vec![vec!["sanctions", "enabled"], vec!["gdpr", "disabled"]]);
}

#[test]
fn test_requirements_lists_enabled_modules() {
    let output = regguard(&["requirements"], "");
    assert_eq!(output.status.code(), Some(0));

    let requirements = stdout_json(&output);
    assert_eq!(requirements["sanctions"]["nonCompliantAt"], "CRITICAL");
    assert_eq!(requirements["fuel_efficiency"]["nonCompliantAt"], "HIGH");
}

#[test]
fn test_audit_log_chain() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit.jsonl");
    let log_arg = log.to_str().unwrap();

    regguard(&["check", "--audit-log", log_arg], "hello world");
    regguard(&["check", "--audit-log", log_arg], "ship the parts to Iran");

    let verified = regguard(&["verify-audit", log_arg], "");
    assert_eq!(verified.status.code(), Some(0));
    assert!(String::from_utf8(verified.stdout).unwrap().contains("2 events, chain intact"));

    let content = std::fs::read_to_string(&log).unwrap();
    let mut lines: Vec<_> = content.lines().map(str::to_string).collect();
    lines.swap(0, 1);
    std::fs::write(&log, lines.join("\n")).unwrap();

    let tampered = regguard(&["verify-audit", log_arg], "");
    assert_eq!(tampered.status.code(), Some(1));
}

#[test]
fn test_text_format() {
    let output = regguard(&["check", "--format", "text"], "hello world");
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.starts_with("<stdin>: COMPLIANT"));
    assert!(text.contains("[pass] sanctions"));
}
