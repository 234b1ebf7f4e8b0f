//! Integration tests for readiness validation against real git and HTTP

use std::time::Duration;

use super::common::git_fixtures::{descriptor_for, TestRepo};
use super::common::registry_server::MockRegistry;
use pruva_branches::readiness::CheckStep;
use pruva_branches::{
    GitBranchRepository, HttpRegistry, ReadinessOptions, ReadinessValidator, Selection, Verdict,
};
use serde_json::json;

fn http_registry(base_url: &str) -> HttpRegistry {
    HttpRegistry::new(base_url, Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_ready_branch_passes_end_to_end() {
    let repo = TestRepo::new();
    repo.add_repro_branch(
        "REPRO-2026-00001",
        Some(&descriptor_for("REPRO-2026-00001")),
        1_700_000_000,
    );
    let registry = MockRegistry::new()
        .with_ready_reproduction("REPRO-2026-00001", "X", 42)
        .start();

    let git = GitBranchRepository::open(&repo.path).unwrap();
    let client = http_registry(&registry.base_url);
    let report = ReadinessValidator::new(&git, &client, ReadinessOptions::default())
        .run(&Selection::Branch("REPRO-2026-00001".into()))
        .await
        .unwrap();

    assert!(report.is_success(), "{}", report.render_text());
    assert_eq!(report.branches[0].verdict, Verdict::Pass);
    let download = report.branches[0]
        .checks
        .iter()
        .find(|c| c.step == CheckStep::ScriptDownload)
        .unwrap();
    assert!(download.detail.starts_with("42 bytes, sha256 "));
}

#[tokio::test]
async fn test_mismatched_descriptor_fails() {
    let repo = TestRepo::new();
    repo.add_repro_branch(
        "REPRO-2026-00001",
        Some(&descriptor_for("REPRO-2026-99999")),
        1_700_000_000,
    );
    let registry = MockRegistry::new()
        .with_ready_reproduction("REPRO-2026-99999", "X", 42)
        .start();

    let git = GitBranchRepository::open(&repo.path).unwrap();
    let client = http_registry(&registry.base_url);
    let report = ReadinessValidator::new(&git, &client, ReadinessOptions::default())
        .run(&Selection::All)
        .await
        .unwrap();

    assert!(!report.is_success());
    match &report.branches[0].verdict {
        Verdict::Fail { errors, .. } => assert!(*errors >= 1),
        other => panic!("expected fail, got {other:?}"),
    }
}

#[tokio::test]
async fn test_latest_checks_newest_branches_and_continues() {
    let repo = TestRepo::new();
    repo.add_repro_branch(
        "REPRO-2026-00001",
        Some(&descriptor_for("REPRO-2026-00001")),
        1_700_000_000,
    );
    repo.add_repro_branch("REPRO-2026-00002", None, 1_700_000_300);
    repo.add_repro_branch(
        "CVE-2024-3094",
        Some(&descriptor_for("CVE-2024-3094")),
        1_700_000_200,
    );
    let registry = MockRegistry::new()
        .with_ready_reproduction("REPRO-2026-00001", "First", 42)
        .with_reproduction(
            "CVE-2024-3094",
            json!({
                "title": "xz backdoor",
                "status": "draft",
                "artifacts": [{"category": "reproduction_script", "path": "scripts/run.sh", "size": 12}]
            }),
        )
        .with_artifact("CVE-2024-3094", "scripts/run.sh", b"#!/bin/sh\nexit 0\n")
        .start();

    let git = GitBranchRepository::open(&repo.path).unwrap();
    let client = http_registry(&registry.base_url);
    let report = ReadinessValidator::new(&git, &client, ReadinessOptions::default())
        .run(&Selection::Latest(2))
        .await
        .unwrap();

    let branches: Vec<&str> = report.branches.iter().map(|b| b.branch.as_str()).collect();
    assert_eq!(branches, vec!["repro/REPRO-2026-00002", "repro/CVE-2024-3094"]);
    assert!(report.branches[0].verdict.is_fail());
    assert_eq!(report.branches[1].verdict, Verdict::Warn { warnings: 1 });
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.passed, 1);
    assert_eq!(report.summary.warned, 1);
    assert_eq!(report.summary.failed, 1);
}

#[tokio::test]
async fn test_unknown_id_is_unreachable() {
    let repo = TestRepo::new();
    repo.add_repro_branch(
        "REPRO-2026-00004",
        Some(&descriptor_for("REPRO-2026-00004")),
        1_700_000_000,
    );
    let registry = MockRegistry::new().start();

    let git = GitBranchRepository::open(&repo.path).unwrap();
    let client = http_registry(&registry.base_url);
    let report = ReadinessValidator::new(
        &git,
        &client,
        ReadinessOptions::default().without_download(),
    )
    .run(&Selection::Ids(vec!["REPRO-2026-00004".into()]))
    .await
    .unwrap();

    let branch = &report.branches[0];
    assert!(branch.verdict.is_fail());
    assert_eq!(
        branch.checks.last().map(|c| c.step),
        Some(CheckStep::RegistryReachable)
    );
}
