use crate::config::ServerConfig;
use crate::pipelines::RecipeBook;
use std::sync::Arc;

/// Shared by every request handler
pub struct AppState {
    pub book: RecipeBook,
    pub server: ServerConfig,
}

impl AppState {
    pub fn new(book: RecipeBook, server: ServerConfig) -> Arc<Self> {
        Arc::new(AppState { book, server })
    }
}
