use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn isp_chat(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("isp-chat").unwrap();
    cmd.env("ISP_CHAT_DB_PATH", dir.path().join("chat_history.db"))
        .env_remove("DATABASE_URL")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("isp-chat").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ISP customer-support chat assistant"));
}

#[test]
fn test_cli_serve_help() {
    let mut cmd = Command::cargo_bin("isp-chat").unwrap();
    cmd.arg("serve").arg("--help").assert().success().stdout(predicate::str::contains("port"));
}

#[test]
fn test_purge_requires_confirm() {
    let dir = TempDir::new().unwrap();
    isp_chat(&dir)
        .arg("purge")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--confirm"));
}

#[test]
fn test_purge_empty_database() {
    let dir = TempDir::new().unwrap();
    isp_chat(&dir)
        .args(["purge", "--confirm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"conversations\": 0"));
}

#[test]
fn test_conversations_on_empty_database() {
    let dir = TempDir::new().unwrap();
    isp_chat(&dir)
        .args(["conversations", "--limit", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 0"))
        .stdout(predicate::str::contains("\"per_page\": 5"));
}

#[test]
fn test_stats_on_empty_database() {
    let dir = TempDir::new().unwrap();
    isp_chat(&dir).arg("stats").assert().success().stdout(predicate::str::contains("[]"));
}

#[test]
fn test_search_term_too_short() {
    let dir = TempDir::new().unwrap();
    isp_chat(&dir)
        .args(["search", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 2 characters"));
}

#[test]
fn test_stats_rejects_bad_date() {
    let dir = TempDir::new().unwrap();
    isp_chat(&dir).args(["stats", "--date", "13/01/2024"]).assert().failure();
}
