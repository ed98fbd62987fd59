use crate::config::Config;
use crate::services::MetadataExtractor;
use std::path::Path;

pub async fn cmd_probe(config: &Config, file: &str) -> anyhow::Result<()> {
    let extractor = MetadataExtractor::new(config.tools.clone(), config.scanner.clone());
    let metadata = extractor.extract_video_metadata(Path::new(file)).await?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
