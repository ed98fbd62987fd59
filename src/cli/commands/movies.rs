use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_movies(config: &Config, limit: u64, offset: u64) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let total = store.count_movies().await?;
    let movies = store.list_movies(limit, offset).await?;

    if movies.is_empty() {
        println!("No movies in catalog.");
        println!("Add one with: media-catalog add <imdb id>");
        return Ok(());
    }

    println!("{:<38} {:<6} TITLE", "ID", "YEAR");
    println!("{:-<70}", "");
    for movie in &movies {
        println!(
            "{:<38} {:<6} {}",
            movie.id,
            movie.year.as_deref().unwrap_or("-"),
            movie.title
        );
    }
    println!();
    println!("Showing {} of {total}", movies.len());

    Ok(())
}
