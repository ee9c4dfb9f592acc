use anyhow::Result;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Helper to run aiterm with piped stdin and capture output
fn run_aiterm(args: &[&str], stdin: &str, home: &Path, api_key: Option<&str>) -> Result<Output> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_aiterm"));
    cmd.args(args);

    // Enable mock mode for deterministic testing
    cmd.env("AITERM_USE_MOCK", "1");
    // Keep the user's real config file out of the way
    cmd.env("HOME", home);
    cmd.env_remove("RUST_LOG");
    match api_key {
        Some(key) => cmd.env("OPENAI_KEY", key),
        None => cmd.env_remove("OPENAI_KEY"),
    };

    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())?;
    Ok(child.wait_with_output()?)
}

fn home() -> TempDir {
    tempfile::tempdir().expect("temp home")
}

#[test]
fn test_missing_prompt_is_a_clean_no_op() -> Result<()> {
    let home = home();
    let output = run_aiterm(&[], "", home.path(), Some("sk-test"))?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No prompt was provided."));

    Ok(())
}

#[test]
fn test_candidate_is_shown_and_quit_exits_cleanly() -> Result<()> {
    let home = home();
    let output = run_aiterm(&["list files"], "q\n", home.path(), Some("sk-test"))?;

    assert!(output.status.success(), "Quit should exit cleanly");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--> ls -la <--"), "Stdout: {}", stdout);

    Ok(())
}

#[test]
fn test_execute_runs_command_and_shows_output() -> Result<()> {
    let home = home();
    let output = run_aiterm(&["say hello"], "y\n", home.path(), Some("sk-test"))?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let printed = stdout
        .lines()
        .any(|line| line.ends_with("hello") && !line.contains("echo"));
    assert!(printed, "Should show command output. Stdout: {}", stdout);

    Ok(())
}

#[test]
fn test_failed_command_exits_non_zero() -> Result<()> {
    let home = home();
    let output = run_aiterm(&["make it fail"], "y\n", home.path(), Some("sk-test"))?;

    assert!(!output.status.success(), "Failing command should fail the run");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("command exited"), "Stderr: {}", stderr);

    Ok(())
}

#[test]
fn test_missing_key_and_empty_answer_exits_cleanly() -> Result<()> {
    let home = home();
    let output = run_aiterm(&["list files"], "\n", home.path(), None)?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Enter your OpenAI API key"));
    assert!(stdout.contains("No API key was provided"));
    assert!(!stdout.contains("Here is the command"));

    Ok(())
}

#[test]
fn test_invalid_key_is_replaced_and_request_retried() -> Result<()> {
    let home = home();
    let output = run_aiterm(
        &["--key", "invalid-key", "list files"],
        "sk-good\nq\n",
        home.path(),
        Some("sk-from-env"),
    )?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Please set the correct API key"));
    assert!(stdout.contains("--> ls -la <--"), "Stdout: {}", stdout);

    Ok(())
}

#[test]
fn test_not_a_command_asks_for_a_new_prompt() -> Result<()> {
    let home = home();
    let output = run_aiterm(&["make a sandwich"], "list files\nq\n", home.path(), Some("sk-test"))?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Please retry with a different prompt"));
    assert!(stdout.contains("--> ls -la <--"));

    Ok(())
}

#[test]
fn test_closed_stdin_fails_the_run() -> Result<()> {
    let home = home();
    let output = run_aiterm(&["list files"], "", home.path(), Some("sk-test"))?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed reading input"), "Stderr: {}", stderr);

    Ok(())
}

#[test]
fn test_set_api_key_is_reported_by_config() -> Result<()> {
    let home = home();

    let before = run_aiterm(&["--config"], "", home.path(), None)?;
    assert!(before.status.success());
    assert!(String::from_utf8_lossy(&before.stdout).contains("Status: Not found"));

    let saved = run_aiterm(&["--set-api-key", "sk-saved"], "", home.path(), None)?;
    assert!(saved.status.success());
    assert!(home.path().join(".aiterm").join("config.toml").exists());

    let after = run_aiterm(&["--config"], "", home.path(), None)?;
    let stdout = String::from_utf8_lossy(&after.stdout);
    assert!(stdout.contains("Status: Found"));
    assert!(stdout.contains("API Key: Set"));

    Ok(())
}

#[test]
fn test_saved_key_is_used_without_prompting() -> Result<()> {
    let home = home();
    run_aiterm(&["--set-api-key", "sk-saved"], "", home.path(), None)?;

    let output = run_aiterm(&["list files"], "q\n", home.path(), None)?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Enter your OpenAI API key"));
    assert!(stdout.contains("--> ls -la <--"));

    Ok(())
}
