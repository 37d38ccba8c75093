//! Integration tests for xfmirror
//!
//! These tests drive the whole pipeline, configuration to files on disk,
//! against in-memory and directory-backed postboxes.

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use proptest::prelude::*;
use xfmirror_config::ConfigLoader;
use xfmirror_engine::{
    transport_from_config, CancellationToken, DownloadOptions, Orchestrator, RunContext, ScanMode,
};
use xfmirror_tests::test_utils::{
    create_postbox_dir, expected_selection_bytes, fs_config, generate_test_data, list_files,
    memory_postbox, sorted_expected_selection, EXPECTED_SELECTION,
};
use xfmirror_transport::MemoryTransport;
use xfmirror_types::{DownloadOutcome, DownloadTask, NullProgressSink, ProgressSink, WorkerCount};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn memory_orchestrator(transport: &MemoryTransport) -> Orchestrator {
    Orchestrator::from_config(
        Arc::new(transport.clone()),
        &xfmirror_config::Config::default(),
    )
}

#[tokio::test]
async fn test_memory_sync_selects_expected_files() -> TestResult {
    let transport = memory_postbox();
    let destination = TempDir::new()?;
    let options = DownloadOptions::new(destination.path()).with_workers(WorkerCount::new(3)?);

    let report = memory_orchestrator(&transport)
        .sync(&options, &RunContext::silent())
        .await?;

    assert_eq!(report.scan.tasks.len(), EXPECTED_SELECTION.len());
    assert_eq!(report.scan.packages_scanned, 6);
    assert_eq!(report.stats.completed, EXPECTED_SELECTION.len());
    assert_eq!(report.stats.failed, 0);
    assert_eq!(report.stats.bytes_transferred, expected_selection_bytes());
    assert_eq!(list_files(destination.path())?, sorted_expected_selection());

    for path in EXPECTED_SELECTION {
        let size = fs::metadata(destination.path().join(path))?.len() as usize;
        assert_eq!(
            fs::read(destination.path().join(path))?,
            generate_test_data(path, size)
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_resync_skips_without_transfer() -> TestResult {
    let transport = memory_postbox();
    let destination = TempDir::new()?;
    let options = DownloadOptions::new(destination.path());
    let orchestrator = memory_orchestrator(&transport);

    orchestrator.sync(&options, &RunContext::silent()).await?;
    let transfers = transport.transfer_count();

    let report = orchestrator.sync(&options, &RunContext::silent()).await?;
    assert_eq!(report.stats.skipped, EXPECTED_SELECTION.len());
    assert_eq!(report.stats.completed, 0);
    assert_eq!(transport.transfer_count(), transfers);
    Ok(())
}

#[tokio::test]
async fn test_truncated_local_file_is_downloaded_again() -> TestResult {
    let transport = memory_postbox();
    let destination = TempDir::new()?;
    let options = DownloadOptions::new(destination.path());
    let orchestrator = memory_orchestrator(&transport);
    orchestrator.sync(&options, &RunContext::silent()).await?;

    let victim = destination.path().join("Products/V5Loader_Linux/V5Loader.tar.gz");
    fs::write(&victim, b"partial")?;

    let report = orchestrator.sync(&options, &RunContext::silent()).await?;
    assert_eq!(report.stats.completed, 1);
    assert_eq!(report.stats.skipped, EXPECTED_SELECTION.len() - 1);
    assert_eq!(fs::metadata(&victim)?.len(), 7000);
    Ok(())
}

#[tokio::test]
async fn test_failed_transfer_recovers_on_next_run() -> TestResult {
    let transport = memory_postbox();
    transport.set_chunk_size(1024);
    transport.fail_transfer("Products/P1/P1_Full_20240201_1.zip");
    let destination = TempDir::new()?;
    let options = DownloadOptions::new(destination.path());

    let report = memory_orchestrator(&transport)
        .sync(&options, &RunContext::silent())
        .await?;
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.completed, EXPECTED_SELECTION.len() - 1);

    let partial = destination.path().join("Products/P1/P1_Full_20240201_1.zip");
    assert_eq!(fs::metadata(&partial)?.len(), 1024);

    let healthy = memory_postbox();
    let report = memory_orchestrator(&healthy)
        .sync(&options, &RunContext::silent())
        .await?;
    assert_eq!(report.stats.completed, 1);
    assert_eq!(fs::metadata(&partial)?.len(), 5000);
    Ok(())
}

struct CancelAfterFirst(CancellationToken);

impl ProgressSink for CancelAfterFirst {
    fn task_finished(&self, _task: &DownloadTask, _outcome: &DownloadOutcome) {
        self.0.cancel();
    }
}

#[tokio::test]
async fn test_cancellation_leaves_rest_not_started() -> TestResult {
    let transport = memory_postbox();
    let destination = TempDir::new()?;
    let options = DownloadOptions::new(destination.path()).with_workers(WorkerCount::new(1)?);

    let token = CancellationToken::new();
    let ctx = RunContext::with_token(token.clone(), Arc::new(CancelAfterFirst(token)));
    let report = memory_orchestrator(&transport).sync(&options, &ctx).await?;

    assert_eq!(report.stats.completed, 1);
    assert_eq!(report.stats.not_started, EXPECTED_SELECTION.len() - 1);
    assert_eq!(report.stats.total(), EXPECTED_SELECTION.len());
    assert_eq!(list_files(destination.path())?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_fs_postbox_end_to_end() -> TestResult {
    let remote = TempDir::new()?;
    let destination = TempDir::new()?;
    create_postbox_dir(remote.path())?;

    let config = fs_config(remote.path(), destination.path());
    config.require_remote()?;
    let transport = transport_from_config(&config.remote, config.transfer.buffer_size)?;
    let orchestrator = Orchestrator::from_config(transport, &config);
    let options = DownloadOptions::from_config(&config)?;

    let report = orchestrator.sync(&options, &RunContext::silent()).await?;
    assert_eq!(report.stats.completed, EXPECTED_SELECTION.len());
    assert_eq!(list_files(destination.path())?, sorted_expected_selection());
    for dir in ["Products", "Inbox", "Outbox", "Xpressfeed"] {
        assert!(destination.path().join(dir).is_dir());
    }
    assert!(destination.path().join("Products/Empty").is_dir());

    for path in EXPECTED_SELECTION {
        assert_eq!(
            fs::read(destination.path().join(path))?,
            fs::read(remote.path().join(path))?
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_estimate_matches_selection() -> TestResult {
    let remote = TempDir::new()?;
    let destination = TempDir::new()?;
    create_postbox_dir(remote.path())?;

    let config = fs_config(remote.path(), destination.path());
    let transport = transport_from_config(&config.remote, config.transfer.buffer_size)?;
    let report = Orchestrator::from_config(transport, &config)
        .estimate(&RunContext::silent())
        .await?;

    assert_eq!(report.rows.len(), EXPECTED_SELECTION.len());
    assert_eq!(report.total_bytes(), expected_selection_bytes());
    assert_eq!(report.rows_with_total().last().map(|r| r.size), Some(18_240));
    assert!(list_files(destination.path())?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_optional_area_missing_is_not_an_error() -> TestResult {
    let remote = TempDir::new()?;
    let destination = TempDir::new()?;
    create_postbox_dir(remote.path())?;
    fs::remove_dir_all(remote.path().join("Xpressfeed"))?;

    let config = fs_config(remote.path(), destination.path());
    let transport = transport_from_config(&config.remote, config.transfer.buffer_size)?;
    let outcome = Orchestrator::from_config(transport, &config)
        .scan(ScanMode::Dry, &RunContext::silent())
        .await?;

    assert_eq!(outcome.areas_skipped, vec!["Xpressfeed".to_string()]);
    assert!(outcome.tasks.iter().all(|t| t.area == "Products"));
    assert_eq!(outcome.tasks.len(), 8);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_remote_halts_run() -> TestResult {
    let missing = TempDir::new()?.path().join("gone");
    let destination = TempDir::new()?;

    let config = fs_config(&missing, destination.path());
    let transport = transport_from_config(&config.remote, config.transfer.buffer_size)?;
    let options = DownloadOptions::from_config(&config)?;
    let result = Orchestrator::from_config(transport, &config)
        .sync(&options, &RunContext::silent())
        .await;

    match result {
        Err(e) => assert!(e.halts_run()),
        Ok(_) => panic!("sync against a missing remote should fail"),
    }
    Ok(())
}

#[tokio::test]
async fn test_config_file_drives_sync() -> TestResult {
    let remote = TempDir::new()?;
    let workspace = TempDir::new()?;
    create_postbox_dir(remote.path())?;

    let destination = workspace.path().join("mirror");
    let config_path = workspace.path().join("xfmirror.yaml");
    let mut config = fs_config(remote.path(), &destination);
    config.categories.change = false;
    config.workers.count = Some(2);
    ConfigLoader::save_to_file(&config, &config_path)?;

    let loaded = ConfigLoader::load_from_file(&config_path)?;
    assert_eq!(loaded.workers.count, Some(2));
    assert!(!loaded.categories.change);

    let transport = transport_from_config(&loaded.remote, loaded.transfer.buffer_size)?;
    let report = Orchestrator::from_config(transport, &loaded)
        .sync(&DownloadOptions::from_config(&loaded)?, &RunContext::silent())
        .await?;

    let changes = [
        "Products/P1/P1_Change_20240201.zip",
        "Products/P1/P1_Change_20240210.zip",
        "Xpressfeed/aBANK01/t_aBANK01_20240102.txt",
    ];
    assert_eq!(report.stats.completed, EXPECTED_SELECTION.len() - changes.len());
    for change in changes {
        assert!(!destination.join(change).exists());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_sync_downloads_changes_since_snapshot(
        snapshot_day in 1u32..28,
        change_days in prop::collection::btree_set(1u32..28, 0..8),
    ) {
        let transport = MemoryTransport::new();
        let snapshot = format!("P_Full_202403{:02}.zip", snapshot_day);
        transport.add_file(&format!("Products/P/{}", snapshot), "full");
        for day in &change_days {
            transport.add_file(&format!("Products/P/P_Change_202403{:02}.zip", day), "change");
        }

        let destination = TempDir::new().unwrap();
        let options = DownloadOptions::new(destination.path());
        let ctx = RunContext::new(Arc::new(NullProgressSink));
        let report =
            tokio_test::block_on(memory_orchestrator(&transport).sync(&options, &ctx)).unwrap();

        let mut expected: Vec<String> = change_days
            .iter()
            .filter(|day| **day >= snapshot_day)
            .map(|day| format!("Products/P/P_Change_202403{:02}.zip", day))
            .collect();
        expected.push(format!("Products/P/{}", snapshot));
        expected.sort();

        prop_assert_eq!(list_files(destination.path()).unwrap(), expected);
        prop_assert_eq!(report.stats.failed, 0);
    }
}
