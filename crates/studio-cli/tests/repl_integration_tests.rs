//! End-to-end tests driving the built `studio` binary over stdin

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn run_studio(root: &Path, user_id: &str, script: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_studio"))
        .current_dir(root)
        .args(["--root", root.to_str().unwrap(), "--user-id", user_id])
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn write_users(root: &Path, content: &str) {
    fs::create_dir_all(root.join("Data")).unwrap();
    fs::write(root.join("Data/users_config.json"), content).unwrap();
}

#[test]
fn test_artist_session() {
    let temp = TempDir::new().unwrap();
    let output = run_studio(temp.path(), "artist000001", "pwd\nrnd\nfoobar\nexit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stdout.contains("Your assigned role is artist. You cannot switch roles."));
    assert!(stdout.contains("[artist][studio]$ "));
    assert!(stderr.contains("Error: Permission denied: 'switch role' requires the master role"));
    assert!(stderr.contains("Error: Command not found: foobar"));
    assert!(temp.path().join("Data/roles/artist000001").is_dir());
}

#[test]
fn test_master_switches_role_and_assigns() {
    let temp = TempDir::new().unwrap();
    write_users(temp.path(), r#"{"master000001": "master"}"#);

    let output = run_studio(
        temp.path(),
        "master000001",
        "rnd\nassign aaaa00000000 --role pipe\nmaster\nassign aaaa00000000 --role pipe\nexit\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stdout.contains("You have the master role. You can switch to any role."));
    assert!(stdout.contains("Switched to rnd role."));
    assert!(stdout.contains("[rnd][studio]$ "));
    assert!(stderr.contains("requires the master role"));
    assert!(stdout.contains("Successfully assigned role 'pipe' to user 'aaaa00000000'."));

    let saved = fs::read_to_string(temp.path().join("Data/users_config.json")).unwrap();
    assert!(saved.contains("\"aaaa00000000\": \"pipe\""));
}

#[cfg(unix)]
#[test]
fn test_background_job_lifecycle() {
    let temp = TempDir::new().unwrap();
    write_users(temp.path(), r#"{"rnd000000001": "rnd"}"#);

    let output = run_studio(
        temp.path(),
        "rnd000000001",
        "run sleep 30 &\njobs\nquit\nquit\njobs\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stdout.contains("[1] "));
    assert!(stdout.contains("Running"));
    assert!(stdout.contains("Job [1]"));
    assert!(stdout.contains("Terminated"));
    assert!(stderr.contains("Error: Job 1 is already terminated"));
}

#[test]
fn test_invalid_config_warns_but_starts() {
    let temp = TempDir::new().unwrap();
    write_users(temp.path(), "{ broken");

    let output = run_studio(temp.path(), "user00000001", "exit\n");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Warning:"));
}

#[test]
fn test_end_of_input_exits_cleanly() {
    let temp = TempDir::new().unwrap();
    let output = run_studio(temp.path(), "user00000002", "pwd\n");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Exiting terminal. Goodbye!"));
}
