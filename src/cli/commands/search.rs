use crate::clients::omdb::OmdbClient;
use crate::config::Config;
use crate::constants::limits::MAX_SEARCH_RESULTS;
use crate::state::build_shared_http_client;

pub async fn cmd_search_movies(config: &Config, query: &str) -> anyhow::Result<()> {
    println!("Searching OMDB for: {query}");

    let client = OmdbClient::with_shared_client(
        build_shared_http_client(config.omdb.request_timeout_seconds)?,
        config.omdb.base_url.clone(),
        config.omdb.api_key.clone(),
    );
    let results = client.search_by_text(query).await?;

    if results.is_empty() {
        println!("No results for '{query}'");
        return Ok(());
    }

    println!();
    println!("{:-<60}", "");
    for (i, item) in results.iter().enumerate().take(MAX_SEARCH_RESULTS) {
        println!("[{}] {} ({})", i + 1, item.title, item.year);
        println!("    {} | {}", item.imdb_id, item.media_type);
    }
    println!();
    println!("Add one with: media-catalog add <imdb id>");

    Ok(())
}
