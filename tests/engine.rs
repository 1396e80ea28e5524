use std::sync::Arc;

use mirror_status::common::config::AppConfig;
use mirror_status::engine::http::{file_name_from_url, numbered_file_name};
use mirror_status::engine::{EngineError, HttpEngine, HttpTransfer, SimulatedEngine, SimulatedTransfer};
use mirror_status::status::{StatusCategory, TaskContext, TaskRegistry, TaskStatus, TransferTask};

#[test]
fn test_file_name_from_url() {
    assert_eq!(file_name_from_url("https://example.com/files/a.iso").unwrap(), "a.iso");
    assert_eq!(file_name_from_url("http://example.com/dir/b.zip?token=1#x").unwrap(), "b.zip");
    assert_eq!(file_name_from_url("https://example.com/dir/").unwrap(), "dir");
    assert_eq!(file_name_from_url("https://example.com").unwrap(), "index.html");
    assert!(matches!(file_name_from_url("ftp://example.com/a"), Err(EngineError::InvalidUrl(_))));
    assert!(matches!(file_name_from_url("not a url"), Err(EngineError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_http_transfer_status() {
    let ctx = TaskContext::new(5, "@me", "Mirror");
    let transfer = HttpTransfer::new("g1".to_string(), "https://example.com/a.iso", "/tmp/a.iso".into(), 1000, ctx);
    assert_eq!(transfer.name(), "a.iso");
    assert_eq!(transfer.status(), TaskStatus::QueuedDownload.label());
    assert_eq!(transfer.speed(), 0);
    assert_eq!(transfer.eta(), None);
    assert_eq!(transfer.progress().await.unwrap(), 0.0);
    assert!(transfer.as_refresh().is_none());
}

#[tokio::test]
async fn test_http_engine_rejects_invalid_url() {
    let registry = TaskRegistry::default();
    let engine = HttpEngine::new(registry.clone(), &AppConfig::default()).unwrap();
    let result = engine.add_task("mailto:someone", TaskContext::new(1, "@me", "Mirror")).await;
    assert!(matches!(result, Err(EngineError::InvalidUrl(_))));
    assert!(registry.is_empty().await);
    assert_eq!(engine.active(), 0);
    assert!(!engine.cancel("nope"));
}

#[tokio::test]
async fn test_simulated_engine_lifecycle() {
    let registry = TaskRegistry::default();
    let engine = SimulatedEngine::new(registry.clone());
    let gids = engine.spawn(14, 1).await.unwrap();
    assert_eq!(gids.len(), 14);
    assert_eq!(registry.len().await, 14);

    // 第 10 个任务暂停，归入下载分类
    let downloading = registry.tasks_for(TaskStatus::Downloading.into(), None).await;
    assert_eq!(downloading.len(), 3);
    let own = registry.tasks_for(StatusCategory::All, Some(1)).await;
    assert_eq!(own.len(), 7);

    // 做种任务支持刷新
    let seeding = registry.tasks_for(TaskStatus::Seeding.into(), None).await;
    assert_eq!(seeding.len(), 1);
    assert!(seeding[0].as_refresh().is_some());
    assert!(registry.lookup(&seeding[0].gid()).await.is_some());

    assert!(engine.cancel(&gids[0]).await);
    assert!(!engine.cancel(&gids[0]).await);
    assert_eq!(registry.len().await, 13);

    // 推进足够长时间后，只剩做种任务
    let finished = engine.tick(1_000_000).await;
    assert_eq!(finished, 12);
    let remaining = registry.snapshot().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].status(), TaskStatus::Seeding.label());
}

#[tokio::test]
async fn test_simulated_transfer_progress() {
    let transfer = Arc::new(SimulatedTransfer::new(
        "x.mkv",
        TaskStatus::Downloading.label(),
        1000,
        100,
        TaskContext::new(1, "@me", "Leech"),
    ));
    assert_eq!(transfer.eta(), Some(10));
    transfer.advance(3);
    assert_eq!(transfer.processed_bytes(), 300);
    assert_eq!(transfer.progress().await.unwrap(), 30.0);
    transfer.advance(100);
    assert!(transfer.is_finished());
    assert_eq!(transfer.progress().await.unwrap(), 100.0);

    transfer.set_status(TaskStatus::Seeding.label());
    let refresher = transfer.as_refresh().unwrap();
    refresher.refresh().await.unwrap();
    assert!(transfer.uploaded() > 0);
    assert!(!transfer.is_finished());
}

#[test]
fn test_numbered_file_name() {
    assert_eq!(numbered_file_name("file.zip", 0), "file.zip");
    assert_eq!(numbered_file_name("file.zip", 2), "file (2).zip");
    assert_eq!(numbered_file_name("archive.tar.gz", 1), "archive.tar (1).gz");
    assert_eq!(numbered_file_name("README", 1), "README (1)");
}

#[tokio::test]
async fn test_same_file_name_gets_distinct_output_paths() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        download_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let engine = HttpEngine::new(TaskRegistry::default(), &config).unwrap();

    let first = file_name_from_url("https://a.example.com/x/file.zip").unwrap();
    let second = file_name_from_url("https://b.example.com/y/file.zip").unwrap();
    assert_eq!(first, second);

    let first_path = engine.claim_output_path(&first, "gid-a");
    let second_path = engine.claim_output_path(&second, "gid-b");
    assert_eq!(first_path, dir.path().join("file.zip"));
    assert_eq!(second_path, dir.path().join("file (1).zip"));
    assert_eq!(engine.claim_output_path("file.zip", "gid-c"), dir.path().join("file (2).zip"));
}

struct BrokenLabel;

impl From<BrokenLabel> for String {
    fn from(_: BrokenLabel) -> String {
        panic!("状态标签生成失败");
    }
}

#[test]
fn test_simulated_status_survives_poisoned_lock() {
    let transfer = Arc::new(SimulatedTransfer::new(
        "y.mkv",
        TaskStatus::Seeding.label(),
        1000,
        100,
        TaskContext::new(1, "@me", "Leech"),
    ));

    // 持有写锁时 panic，锁被污染
    let writer = Arc::clone(&transfer);
    assert!(std::thread::spawn(move || writer.set_status(BrokenLabel)).join().is_err());

    assert_eq!(transfer.status(), TaskStatus::Seeding.label());
    assert!(transfer.is_seeding());
    transfer.set_status(TaskStatus::Uploading.label());
    assert_eq!(transfer.status(), TaskStatus::Uploading.label());
}
