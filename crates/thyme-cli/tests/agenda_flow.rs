//! End-to-end tests for the agenda flow.
//!
//! Drives the built binary: agenda file → `thyme show`, spans file →
//! `thyme shape`, with configuration coming from files and the environment.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn thyme_binary() -> String {
    env!("CARGO_BIN_EXE_thyme").to_string()
}

/// Run thyme with an isolated HOME so no user config leaks in.
fn thyme(home: &Path, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut command = Command::new(thyme_binary());
    command
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    for (key, value) in envs {
        command.env(key, value);
    }
    command.args(args).output().expect("failed to run thyme")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "thyme should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

const AGENDA: &str = r#"
end = "17:00"

[[block]]
name = "focus"
start = "09:00"
items = [
    { name = "design", minutes = 60 },
    { name = "code", minutes = 120 },
]

[[block]]
name = "lunch"
start = "12:00"

[[block]]
name = "admin"
start = "13:00"
items = [
    { name = "email", minutes = 30 },
    { name = "expenses", minutes = 30 },
    { name = "planning", minutes = 30 },
]
"#;

fn write_agenda(temp: &TempDir) -> String {
    let path = temp.path().join("agenda.toml");
    std::fs::write(&path, AGENDA).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_show_prints_agenda() {
    let temp = TempDir::new().unwrap();
    let agenda = write_agenda(&temp);

    let output = stdout(&thyme(temp.path(), &["show", &agenda], &[]));
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "09:00  focus",
            "  09:00  design",
            "  10:00  code",
            "12:00  lunch",
            "13:00  admin",
            "  13:00  email",
            "  14:20  expenses",
            "  15:40  planning",
            "17:00  <END>",
        ]
    );
}

#[test]
fn test_env_minimum_rolls_items_over() {
    let temp = TempDir::new().unwrap();
    let agenda = write_agenda(&temp);

    let output = stdout(&thyme(
        temp.path(),
        &["show", &agenda],
        &[("THYME_MIN_MINUTES", "100")],
    ));
    assert!(output.contains("  13:00  email"), "{output}");
    assert!(output.contains("  15:00  expenses"), "{output}");
    assert!(output.contains("  focus: code (120 min)"), "{output}");
    assert!(
        output.contains("  admin: planning (30 min)"),
        "planning should be left over: {output}"
    );
}

#[test]
fn test_config_file_sets_time_format() {
    let temp = TempDir::new().unwrap();
    let agenda = write_agenda(&temp);
    let config = temp.path().join("thyme.toml");
    std::fs::write(&config, "time_format = \"%H%M\"\n").unwrap();

    let output = stdout(&thyme(
        temp.path(),
        &["--config", &config.to_string_lossy(), "show", &agenda],
        &[],
    ));
    assert!(output.starts_with("0900  focus\n"), "{output}");
}

#[test]
fn test_show_json() {
    let temp = TempDir::new().unwrap();
    let agenda = write_agenda(&temp);

    let output = stdout(&thyme(temp.path(), &["show", &agenda, "--json"], &[]));
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["agenda"].as_array().unwrap().len(), 8);
    assert!(json["unscheduled"].as_array().unwrap().is_empty());
}

#[test]
fn test_shape_pipeline() {
    let temp = TempDir::new().unwrap();
    let spans = temp.path().join("spans.toml");
    std::fs::write(
        &spans,
        r#"
[[span]]
name = "standup"
start = "09:00"
end = "09:15"

[[span]]
name = "pairing"
start = "10:00"
end = "11:00"
"#,
    )
    .unwrap();

    let output = stdout(&thyme(
        temp.path(),
        &[
            "shape",
            &spans.to_string_lossy(),
            "--step",
            "stack=forward@08:30",
        ],
        &[],
    ));
    assert_eq!(output, "08:30 - 08:45  standup\n08:45 - 09:45  pairing\n");
}

#[test]
fn test_bad_step_fails_with_message() {
    let temp = TempDir::new().unwrap();
    let spans = temp.path().join("spans.toml");
    std::fs::write(&spans, "[[span]]\nstart = \"09:00\"\nend = \"10:00\"\n").unwrap();

    let output = thyme(
        temp.path(),
        &["shape", &spans.to_string_lossy(), "--step", "stack=sideways"],
        &[],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid mode for 'stack': 'sideways'"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_missing_agenda_fails() {
    let temp = TempDir::new().unwrap();
    let output = thyme(temp.path(), &["show", "/nonexistent/agenda.toml"], &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}
