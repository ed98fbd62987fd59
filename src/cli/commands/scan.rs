use crate::config::Config;
use crate::models::scan::ScanStatus;
use crate::services::scanner::ScanOptions;
use crate::state::SharedState;
use std::time::Duration;

pub async fn cmd_scan_library(config: &Config, path: &str, metadata: bool) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;

    let options = ScanOptions {
        extract_metadata: metadata,
        save_results: Some(true),
        ..ScanOptions::default()
    };
    let scan_id = state.scanner.start_scan(path, options).await?;
    println!("Scan {scan_id} started for {path}");

    let snapshot = loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let Some(snapshot) = state.scanner.get_scan_status(&scan_id).await else {
            anyhow::bail!("Scan {scan_id} disappeared");
        };
        if snapshot.status.is_finished() {
            break snapshot;
        }
        println!(
            "  {:>5.1}%  {}",
            snapshot.percentage, snapshot.current_path
        );
    };

    println!();
    println!("{:-<70}", "");
    match snapshot.status {
        ScanStatus::Completed => println!("Scan complete!"),
        other => println!("Scan ended: {}", other.as_str()),
    }
    println!("  Files:       {}", snapshot.files_found);
    println!("  Directories: {}", snapshot.directories_found);
    println!("  Elapsed:     {:.1}s", snapshot.elapsed_time);
    for err in &snapshot.errors {
        println!("  ! {} {}", err.kind, err.message);
    }

    Ok(())
}
