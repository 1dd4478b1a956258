// tests/integration/backups_listing_test.rs

//! The read-only backup listing.

use super::test_helpers::TestContext;
use opsrelay::core::handler::DispatchOutcome;

fn write_backup(ctx: &TestContext, name: &str, bytes: usize) {
    std::fs::create_dir_all(ctx.backup_dir()).unwrap();
    std::fs::write(ctx.backup_dir().join(name), vec![0u8; bytes]).unwrap();
}

#[tokio::test]
async fn test_missing_directory_is_an_empty_result() {
    let ctx = TestContext::new();
    let outcome = ctx.command("/list_backups").await;
    assert_eq!(
        outcome,
        DispatchOutcome::Executed {
            keyword: "list-backups",
            success: true
        }
    );
    let text = ctx.single_response().text().to_string();
    assert!(text.starts_with("✅"));
    assert!(text.contains("No backups found"));
}

#[tokio::test]
async fn test_empty_directory_is_an_empty_result() {
    let ctx = TestContext::new();
    std::fs::create_dir_all(ctx.backup_dir()).unwrap();
    ctx.command("/list-backups").await;
    assert!(ctx.single_response().text().contains("No backups found"));
}

#[tokio::test]
async fn test_lists_newest_names_first_with_sizes() {
    let ctx = TestContext::new();
    write_backup(&ctx, "n8n_backup_20240101_030000.tar.gz", 2048);
    write_backup(&ctx, "n8n_backup_20240301_030000.tar.gz", 100);
    write_backup(&ctx, "n8n_backup_20240201_030000.tar.gz", 10);
    write_backup(&ctx, "README.txt", 10);

    ctx.command("/list_backups").await;
    let text = ctx.single_response().text().to_string();

    let march = text.find("n8n_backup_20240301").expect("march listed");
    let february = text.find("n8n_backup_20240201").expect("february listed");
    let january = text.find("n8n_backup_20240101").expect("january listed");
    assert!(march < february && february < january);
    assert!(text.contains("2.0 KiB"));
    assert!(!text.contains("README"));
}

#[tokio::test]
async fn test_listing_respects_the_limit() {
    let ctx = TestContext::with_overrides(&[("RELAY_BACKUP_LIST_LIMIT", "2")]);
    for day in 1..=5 {
        write_backup(&ctx, &format!("n8n_backup_2024010{day}_000000.tar.gz"), 1);
    }

    ctx.command("/list_backups").await;
    let text = ctx.single_response().text().to_string();
    assert!(text.contains("20240105"));
    assert!(text.contains("20240104"));
    assert!(!text.contains("20240103"));
    assert!(text.contains("Latest 2 backup"));
}

#[tokio::test]
async fn test_listing_never_spawns_processes() {
    let ctx = TestContext::new();
    write_backup(&ctx, "n8n_backup_20240101_000000.tar.gz", 1);
    ctx.command("/list_backups").await;
    assert!(ctx.runner.invocations().is_empty());
}
