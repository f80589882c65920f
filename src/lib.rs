//! Generate cooking recipes with an LLM from descriptions, web pages,
//! cooking videos and photos, then store and search them by meaning.

pub mod config;
pub mod error;
pub mod model;
pub mod pipelines;
pub mod prompt;
pub mod providers;
pub mod repository;
pub mod server;
pub mod sources;

pub use error::{ColunchError, Result};
pub use model::Recipe;
pub use pipelines::{Progress, ProgressSender, RecipeBook};

/// Create and store a recipe from a description using `colunch.toml` and the
/// environment for configuration.
pub async fn create_recipe(description: &str) -> Result<Recipe> {
    let config = crate::config::AppConfig::load()?;
    let book = RecipeBook::from_config(&config).await?;
    book.create(description, &[], None).await
}
