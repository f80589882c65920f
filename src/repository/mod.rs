mod pinecone;
mod sqlite;

pub use pinecone::PineconeRepository;
pub use sqlite::SqliteRepository;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use crate::model::Recipe;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

/// Persistence and similarity search for recipes
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    fn backend_name(&self) -> &str;

    /// Insert or replace the recipe keyed by its id
    async fn store(&self, recipe: &Recipe, vector: &[f32]) -> Result<()>;

    /// Fetch one recipe, `ColunchError::NotFound` when absent
    async fn get(&self, id: &str) -> Result<Recipe>;

    /// Up to `top_n` recipes, most similar first
    async fn search(&self, vector: &[f32], top_n: usize) -> Result<Vec<Recipe>>;
}

/// Open the configured backend
pub async fn open_repository(config: &StorageConfig) -> Result<Arc<dyn RecipeRepository>> {
    let repository: Arc<dyn RecipeRepository> = match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteRepository::connect(&config.sqlite_url).await?),
        StorageBackend::Pinecone => Arc::new(PineconeRepository::new(&config.pinecone)?),
    };
    info!("Using {} recipe storage", repository.backend_name());
    Ok(repository)
}

/// Cosine similarity, `None` for mismatched or degenerate vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x64 = f64::from(x);
        let y64 = f64::from(y);
        dot += x64 * y64;
        norm_a += x64 * x64;
        norm_b += y64 * y64;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some(dot / denom)
}
