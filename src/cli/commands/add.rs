use crate::config::Config;
use crate::services::movie_form::{MovieForm, SelectOutcome, SubmitOutcome};
use crate::state::SharedState;

pub async fn cmd_add_movie(config: &Config, imdb_id: &str) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;

    let form = match state
        .movie_form
        .select_result(MovieForm::default(), imdb_id)
        .await?
    {
        SelectOutcome::Duplicate { existing } => {
            println!("Already in catalog: {} (id {})", existing.title, existing.id);
            return Ok(());
        }
        SelectOutcome::Populated { form } => form,
    };

    match state.movie_form.submit(&form).await? {
        SubmitOutcome::Saved { movie, .. } => {
            println!("✓ Added {} ({})", movie.title, movie.year.as_deref().unwrap_or("?"));
            println!("  ID: {}", movie.id);
            if !movie.image_files.is_empty() {
                println!("  Posters: {}", movie.image_files.join(", "));
            }
        }
        SubmitOutcome::Rejected { errors } => {
            println!("OMDB record for {imdb_id} did not validate:");
            println!("{}", serde_json::to_string_pretty(&errors)?);
        }
    }

    Ok(())
}
