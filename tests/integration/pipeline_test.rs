// tests/integration/pipeline_test.rs

//! Sequencing and mutual exclusion of the backup and update pipelines.

use super::test_helpers::{BACKUP_SCRIPT, TestContext, UPDATE_SCRIPT};
use opsrelay::core::handler::DispatchOutcome;
use std::time::Duration;

fn backup_line() -> String {
    format!("bash {BACKUP_SCRIPT}")
}

fn update_line() -> String {
    format!("bash {UPDATE_SCRIPT}")
}

#[tokio::test]
async fn test_backup_runs_the_script_once() {
    let ctx = TestContext::new();
    ctx.runner.succeed(&backup_line(), "Backup written to n8n_backup_20240501.tar.gz\n");

    let outcome = ctx.command("/backup").await;
    assert_eq!(
        outcome,
        DispatchOutcome::Executed {
            keyword: "backup",
            success: true
        }
    );
    assert_eq!(ctx.runner.invocations(), vec![backup_line()]);
    let text = ctx.single_response().text().to_string();
    assert!(text.starts_with("✅"));
    assert!(text.contains("n8n_backup_20240501.tar.gz"));
}

#[tokio::test]
async fn test_update_runs_backup_then_deploy() {
    let ctx = TestContext::new();
    let outcome = ctx.command("/update").await;
    assert_eq!(
        outcome,
        DispatchOutcome::Executed {
            keyword: "update",
            success: true
        }
    );
    assert_eq!(ctx.runner.invocations(), vec![backup_line(), update_line()]);
}

#[tokio::test]
async fn test_update_stops_when_backup_fails() {
    let ctx = TestContext::new();
    ctx.runner.fail(&backup_line(), 1, "tar: No space left on device");

    let outcome = ctx.command("/update").await;
    assert_eq!(
        outcome,
        DispatchOutcome::Executed {
            keyword: "update",
            success: false
        }
    );
    assert_eq!(ctx.runner.count(&update_line()), 0);

    let text = ctx.single_response().text().to_string();
    assert!(text.starts_with("❌"));
    assert!(text.contains("step 1/2: backup"));
    assert!(text.contains("No space left on device"));
}

#[tokio::test]
async fn test_update_reports_deploy_failure_as_step_two() {
    let ctx = TestContext::new();
    ctx.runner.fail(&update_line(), 2, "docker compose pull failed");

    ctx.command("/update").await;
    let text = ctx.single_response().text().to_string();
    assert!(text.contains("step 2/2: deploy"));
    assert!(text.contains("docker compose pull failed"));
}

#[tokio::test]
async fn test_step_timeout_is_reported() {
    let ctx = TestContext::new();
    ctx.runner.time_out(&backup_line());
    ctx.command("/backup").await;
    let text = ctx.single_response().text().to_string();
    assert!(text.contains("timed out after 600s"));
}

#[tokio::test]
async fn test_overlapping_backups_are_mutually_exclusive() {
    let ctx = TestContext::new();
    ctx.runner
        .succeed_after(&backup_line(), "ok", Duration::from_millis(300));

    let (first, second) = tokio::join!(ctx.command("/backup"), ctx.command("/backup"));
    let successes = [&first, &second]
        .iter()
        .filter(|o| matches!(o, DispatchOutcome::Executed { success: true, .. }))
        .count();
    assert_eq!(successes, 1, "outcomes: {first:?}, {second:?}");
    assert_eq!(ctx.runner.count(&backup_line()), 1);

    let sent = ctx.sent();
    assert_eq!(sent.len(), 2);
    assert!(
        sent.iter()
            .any(|s| s.text().contains("already in progress"))
    );
}

#[tokio::test]
async fn test_backups_alias_shares_the_backup_guard() {
    let ctx = TestContext::new();
    ctx.runner
        .succeed_after(&backup_line(), "ok", Duration::from_millis(300));

    tokio::join!(ctx.command("/backup"), ctx.command("/backups"));
    assert_eq!(ctx.runner.count(&backup_line()), 1);
}

#[tokio::test]
async fn test_guard_is_released_after_a_run() {
    let ctx = TestContext::new();
    ctx.runner.fail(&backup_line(), 1, "first run fails");
    ctx.command("/backup").await;
    ctx.command("/backup").await;
    assert_eq!(ctx.runner.count(&backup_line()), 2);
    assert!(!ctx.state.pipelines.is_running("backup"));
}

#[tokio::test]
async fn test_backup_may_run_while_update_deploys() {
    let ctx = TestContext::new();
    ctx.runner
        .succeed_after(&update_line(), "ok", Duration::from_millis(300));

    let (update, backup) = tokio::join!(ctx.command("/update"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        ctx.command("/backup").await
    });
    assert!(matches!(update, DispatchOutcome::Executed { success: true, .. }));
    assert!(matches!(backup, DispatchOutcome::Executed { success: true, .. }));
    assert_eq!(ctx.runner.count(&backup_line()), 2);
}

#[tokio::test]
async fn test_update_does_not_start_while_a_backup_runs() {
    let ctx = TestContext::new();
    ctx.runner
        .succeed_after(&backup_line(), "ok", Duration::from_millis(300));

    let (backup, update) = tokio::join!(ctx.command("/backup"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctx.command("/update").await
    });
    assert!(matches!(backup, DispatchOutcome::Executed { success: true, .. }));
    assert_eq!(
        update,
        DispatchOutcome::Executed {
            keyword: "update",
            success: false
        }
    );
    assert_eq!(ctx.runner.count(&backup_line()), 1);
    assert_eq!(ctx.runner.count(&update_line()), 0);

    let refusal = ctx
        .sent()
        .into_iter()
        .find(|s| s.text().starts_with("❌"))
        .expect("a refusal for /update");
    assert!(refusal.text().contains("'backup' is already in progress"));
    assert!(!ctx.state.pipelines.is_running("update"));
}

#[tokio::test]
async fn test_backup_is_refused_during_the_update_backup_step() {
    let ctx = TestContext::new();
    ctx.runner
        .succeed_after(&backup_line(), "ok", Duration::from_millis(300));

    let (update, backup) = tokio::join!(ctx.command("/update"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctx.command("/backup").await
    });
    assert!(matches!(update, DispatchOutcome::Executed { success: true, .. }));
    assert!(matches!(backup, DispatchOutcome::Executed { success: false, .. }));
    assert_eq!(ctx.runner.count(&backup_line()), 1);
    assert_eq!(ctx.runner.count(&update_line()), 1);
}
