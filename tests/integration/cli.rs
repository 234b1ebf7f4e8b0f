//! End-to-end tests of the `repro-check` and `repro-sync` binaries

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use super::common::git_fixtures::{descriptor_for, TestRepo};
use super::common::registry_server::MockRegistry;

/// Run a binary inside `repo` with an isolated data directory
fn tool(bin: &str, repo: &TestRepo, home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(bin).unwrap();
    cmd.current_dir(&repo.path)
        .env("HOME", home.path())
        .env("PRUVA_HOME", home.path().join(".pruva"))
        .env_remove("PRUVA_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_check_passes_ready_branches() {
    let repo = TestRepo::new();
    repo.add_repro_branch(
        "REPRO-2026-00001",
        Some(&descriptor_for("REPRO-2026-00001")),
        1_700_000_000,
    );
    let registry = MockRegistry::new()
        .with_ready_reproduction("REPRO-2026-00001", "X", 42)
        .start();
    let home = TempDir::new().unwrap();

    tool("repro-check", &repo, &home)
        .args(["--all", "--api-url", &registry.base_url])
        .assert()
        .success()
        .stdout(predicate::str::contains("[PASS] repro/REPRO-2026-00001 (X)"))
        .stdout(predicate::str::contains(format!(
            "Registry: {}",
            registry.base_url
        )))
        .stdout(predicate::str::contains("ALL BRANCHES READY"));

    assert!(home.path().join(".pruva/logs/repro-check.log").exists());
}

#[test]
fn test_check_exits_one_on_failure() {
    let repo = TestRepo::new();
    repo.add_repro_branch(
        "REPRO-2026-00001",
        Some(&descriptor_for("REPRO-2026-99999")),
        1_700_000_000,
    );
    let registry = MockRegistry::new()
        .with_ready_reproduction("REPRO-2026-99999", "X", 42)
        .start();
    let home = TempDir::new().unwrap();

    tool("repro-check", &repo, &home)
        .args(["--branch", "repro/REPRO-2026-00001", "--no-download"])
        .env("PRUVA_API_URL", &registry.base_url)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[FAIL] repro/REPRO-2026-00001"))
        .stdout(predicate::str::contains("SOME BRANCHES FAILED"));
}

#[test]
fn test_check_json_report() {
    let repo = TestRepo::new();
    repo.add_repro_branch(
        "CVE-2024-3094",
        Some(&descriptor_for("CVE-2024-3094")),
        1_700_000_000,
    );
    let registry = MockRegistry::new()
        .with_ready_reproduction("CVE-2024-3094", "xz", 64)
        .start();
    let home = TempDir::new().unwrap();

    let output = tool("repro-check", &repo, &home)
        .args([
            "--repro-ids",
            "CVE-2024-3094,bogus",
            "--json",
            "--api-url",
            &registry.base_url,
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["api_url"], registry.base_url.as_str());
    assert_eq!(json["summary"]["total"], 2);
    assert_eq!(json["summary"]["passed"], 1);
    assert_eq!(json["branches"][0]["verdict"], "pass");
    assert_eq!(json["branches"][1]["branch"], "bogus");
}

#[test]
fn test_check_selection_flags_conflict() {
    let repo = TestRepo::new();
    let home = TempDir::new().unwrap();

    tool("repro-check", &repo, &home)
        .args(["--latest", "3", "--all"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_check_with_no_branches_succeeds() {
    let repo = TestRepo::new();
    let registry = MockRegistry::new().start();
    let home = TempDir::new().unwrap();

    tool("repro-check", &repo, &home)
        .args(["--api-url", &registry.base_url])
        .assert()
        .success()
        .stdout(predicate::str::contains("No reproduction branches selected."));
}

#[test]
fn test_check_outside_repository_fails() {
    let not_a_repo = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    Command::cargo_bin("repro-check")
        .unwrap()
        .current_dir(not_a_repo.path())
        .env("HOME", home.path())
        .env("PRUVA_HOME", home.path().join(".pruva"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not usable as a reproduction repository"));
}

#[test]
fn test_sync_prints_one_line_per_id() {
    let repo = TestRepo::new();
    repo.add_repro_branch(
        "REPRO-2026-00001",
        Some(&descriptor_for("REPRO-2026-00001")),
        1_700_000_000,
    );
    let registry = MockRegistry::new()
        .with_listed_id("REPRO-2026-00001")
        .with_listed_id("REPRO-2026-00002")
        .with_listed_id("../escape")
        .start();
    let home = TempDir::new().unwrap();

    tool("repro-sync", &repo, &home)
        .env("PRUVA_API_URL", &registry.base_url)
        .assert()
        .success()
        .stdout(predicate::str::contains("exists    repro/REPRO-2026-00001"))
        .stdout(predicate::str::contains("created   repro/REPRO-2026-00002"))
        .stdout(predicate::str::contains("skipped   ../escape"))
        .stdout(predicate::str::contains(
            "1 created, 0 published, 1 already present, 1 skipped, 0 failed",
        ));

    assert!(repo
        .remote_branches()
        .contains(&"repro/REPRO-2026-00002".to_string()));
}

#[test]
fn test_sync_always_exits_zero() {
    let not_a_repo = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    Command::cargo_bin("repro-sync")
        .unwrap()
        .current_dir(not_a_repo.path())
        .env("HOME", home.path())
        .env("PRUVA_HOME", home.path().join(".pruva"))
        .env("PRUVA_API_URL", "http://127.0.0.1:9/v1")
        .assert()
        .success()
        .stderr(predicate::str::contains("repro-sync:"));
}
