use crate::config::Config;
use crate::parser::size::format_size;
use crate::services::FileSystemManager;
use crate::services::filesystem::ListingEntry;
use std::path::Path;

pub async fn cmd_list_directory(config: &Config, dir: &str) -> anyhow::Result<()> {
    let fs = FileSystemManager::new(config.library.clone());
    let entries = fs.list_directory(Path::new(dir)).await?;

    for entry in &entries {
        match entry {
            ListingEntry::Item(meta) if meta.is_directory => println!("{:>12}  {}/", "-", meta.name),
            ListingEntry::Item(meta) => println!("{:>12}  {}", format_size(meta.size), meta.name),
            ListingEntry::Unreadable { name, error, .. } => println!("{:>12}  {name} ({error})", "?"),
        }
    }
    println!();
    println!("{} entries", entries.len());

    Ok(())
}
