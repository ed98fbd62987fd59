mod common;

use common::write_file;
use media_catalog::config::{Config, ScannerConfig};
use media_catalog::db::Store;
use media_catalog::models::scan::{ScanItem, ScanSnapshot, ScanStatus};
use media_catalog::services::scanner::ScanOptions;
use media_catalog::services::{FileSystemManager, LibraryScanner, MetadataExtractor};
use std::path::Path;
use std::time::Duration;

async fn scanner_for(root: &Path, scanner: ScannerConfig) -> LibraryScanner {
    let mut config = Config::default();
    config.library.allowed_base_paths = vec![root.display().to_string()];
    config.library.recycle_path = root.join("recycle").display().to_string();

    let db_url = format!("sqlite:{}?mode=rwc", root.join("scan.db").display());
    let store = Store::new(&db_url).await.unwrap();
    let fs = FileSystemManager::new(config.library.clone());
    let extractor = MetadataExtractor::new(config.tools.clone(), scanner.clone());
    LibraryScanner::new(scanner, fs, extractor, store)
}

async fn wait_finished(scanner: &LibraryScanner, scan_id: &str) -> ScanSnapshot {
    for _ in 0..200 {
        let snapshot = scanner.get_scan_status(scan_id).await.unwrap();
        if snapshot.status.is_finished() {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("scan {scan_id} did not finish");
}

fn seed_library(media: &Path) {
    write_file(&media.join("Movies/Heat (1995)/Heat.1995.1080p.mkv"), b"heat");
    write_file(&media.join("Movies/Heat (1995)/Heat.1995.1080p.en.srt"), b"subs");
    write_file(&media.join("Shows/Dark/Dark.S01E01.mkv"), b"dark");
    write_file(&media.join(".hidden/secret.mkv"), b"hidden");
    write_file(&media.join("@eaDir/thumb.mkv"), b"nas junk");
    write_file(&media.join("readme.txt"), b"skip me");
}

#[tokio::test]
async fn test_scan_lifecycle_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let media = root.join("media");
    seed_library(&media);

    let scanner = scanner_for(&root, ScannerConfig::default()).await;
    let library = media.display().to_string();

    let scan_id = scanner
        .start_scan(&library, ScanOptions::default())
        .await
        .unwrap();
    let snapshot = wait_finished(&scanner, &scan_id).await;

    assert_eq!(snapshot.status, ScanStatus::Completed);
    assert_eq!(snapshot.files_found, 3);
    assert!(snapshot.errors.is_empty());

    let results = scanner.get_scan_results(&scan_id).await.unwrap();
    let files: Vec<_> = results
        .items
        .iter()
        .filter_map(|i| match i {
            ScanItem::File(f) => Some(f),
            ScanItem::Directory(_) => None,
        })
        .collect();
    assert!(files.iter().all(|f| !f.path.contains(".hidden")));
    assert!(files.iter().all(|f| !f.path.contains("@eaDir")));

    let episode = files
        .iter()
        .find(|f| f.name == "Dark.S01E01.mkv")
        .unwrap();
    assert_eq!(episode.media_type, "episode");
    assert_eq!(episode.parsed_info.season, Some(1));
    assert_eq!(episode.parsed_info.episode, Some(1));

    let movie = files
        .iter()
        .find(|f| f.name == "Heat.1995.1080p.mkv")
        .unwrap();
    assert_eq!(movie.media_type, "movie");
    assert_eq!(movie.parsed_info.year, Some(1995));

    assert!(!scanner.stop_scan(&scan_id).await);
    assert_eq!(scanner.cleanup_completed_scans(u64::MAX).await, 0);
    assert_eq!(scanner.cleanup_completed_scans(24).await, 0);
    scanner.cleanup_scan(&scan_id).await.unwrap();
    assert!(scanner.get_scan_status(&scan_id).await.is_none());
}

#[tokio::test]
async fn test_rescan_reports_persisted_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let media = root.join("media");
    seed_library(&media);

    let scanner = scanner_for(&root, ScannerConfig::default()).await;
    let library = media.display().to_string();

    let first = scanner
        .start_scan(&library, ScanOptions::default())
        .await
        .unwrap();
    wait_finished(&scanner, &first).await;

    let options = ScanOptions {
        check_duplicates: true,
        user_id: Some("user-1".to_string()),
        ..ScanOptions::default()
    };
    let second = scanner.start_scan(&library, options).await.unwrap();
    let snapshot = wait_finished(&scanner, &second).await;

    let report = snapshot.duplicate_report.unwrap();
    assert!(report.duplicates_found >= 3);

    let results = scanner.get_scan_results(&second).await.unwrap();
    assert!(results.items.iter().all(|i| !matches!(i, ScanItem::File(_))));
}

#[tokio::test]
async fn test_max_concurrent_scans_and_rejections() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let media = root.join("media");
    for i in 0..200 {
        write_file(&media.join(format!("batch/Film.{i}.2001.mkv")), b"x");
    }

    let scanner = scanner_for(
        &root,
        ScannerConfig {
            max_concurrent_scans: 1,
            ..ScannerConfig::default()
        },
    )
    .await;
    let library = media.display().to_string();

    let first = scanner
        .start_scan(&library, ScanOptions::default())
        .await
        .unwrap();
    let second = scanner.start_scan(&library, ScanOptions::default()).await;

    // The first scan may already be done on a fast machine.
    if scanner.active_scan_count().await == 1 {
        assert!(second.is_err());
    }

    assert!(scanner.start_scan("/etc", ScanOptions::default()).await.is_err());
    assert!(
        scanner
            .start_scan(&root.join("missing").display().to_string(), ScanOptions::default())
            .await
            .is_err()
    );

    wait_finished(&scanner, &first).await;
    assert!(scanner.get_scan_results("unknown").await.is_err());
}
