use assert_cmd::prelude::*; // Add methods on commands
use assert_fs::prelude::*;
use predicates::prelude::*; // Used for writing assertions
use std::process::Command;

/// Runs the binary against an empty settings file so the user's own settings never leak in.
fn reconcile_cmd(temp: &assert_fs::TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let settings = temp.child("config.toml");
    settings.write_str("")?;

    let mut cmd = Command::cargo_bin("ch-reconcile")?;
    cmd.arg("--config").arg(settings.path());
    Ok(cmd)
}

#[test]
fn can_show_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("ch-reconcile")?;

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("named-collection"))
        .stdout(predicate::str::contains("grant"));

    Ok(())
}

#[test]
fn cannot_run_role_without_name() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("ch-reconcile")?;

    cmd.arg("role");
    cmd.assert().code(2).stderr(predicate::str::contains(
        "the following required arguments were not provided:",
    ));

    Ok(())
}

#[test]
fn grant_without_privileges_or_roles_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let mut cmd = reconcile_cmd(&temp)?;

    cmd.args(["grant", "--role", "test_role"]);
    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains(r#""failed":true"#))
        .stdout(predicate::str::contains("'privs' or 'grant_to'"));

    Ok(())
}

#[test]
fn invalid_identifier_is_rejected_before_connecting() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let mut cmd = reconcile_cmd(&temp)?;

    // Nothing listens on port 1: a connection attempt would exit with 1 instead
    cmd.args(["--port", "1", "database", "--name", "test_db; DROP DATABASE x"]);
    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains(r#""changed":false"#));

    Ok(())
}

#[test]
fn unreachable_server_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let mut cmd = reconcile_cmd(&temp)?;

    cmd.args(["--host", "127.0.0.1", "--port", "1", "role", "--name", "analyst"]);
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains(r#""failed":true"#))
        .stderr(predicate::str::contains("✗ Role"));

    Ok(())
}

#[test]
fn missing_params_file_is_a_configuration_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let mut cmd = reconcile_cmd(&temp)?;

    cmd.arg("apply")
        .arg("--params")
        .arg(temp.child("missing.json").path());
    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains(r#""failed":true"#));

    Ok(())
}

#[test]
fn unknown_kind_in_params_file_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let params = temp.child("params.json");
    params.write_str(r#"{"kind": "dictionary", "name": "d1"}"#)?;

    let mut cmd = reconcile_cmd(&temp)?;
    cmd.arg("apply").arg("--params").arg(params.path());
    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains(r#""failed":true"#));

    Ok(())
}

#[test]
fn params_file_can_be_read_from_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let settings = temp.child("config.toml");
    settings.write_str("")?;

    // Only assert_cmd's Command can feed stdin
    let mut cmd = assert_cmd::Command::cargo_bin("ch-reconcile")?;
    cmd.arg("--config")
        .arg(settings.path())
        .args(["apply", "--params", "-"])
        .write_stdin(r#"{"kind": "grant", "role": "test_role"}"#);
    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains("'privs' or 'grant_to'"));

    Ok(())
}

#[test]
fn missing_settings_file_is_a_configuration_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let mut cmd = Command::cargo_bin("ch-reconcile")?;

    cmd.arg("--config")
        .arg(temp.child("nope.toml").path())
        .args(["role", "--name", "analyst"]);
    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains(r#""failed":true"#));

    Ok(())
}
