//! htmx front end: HTML pages, form fragments and recipe WebSockets.

mod error;
mod html;
mod pages;
mod sockets;
mod state;
mod uploads;

pub use error::AppError;
pub use state::AppState;
pub use uploads::{is_upload_name, save_upload, take_uploads};

use crate::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Largest accepted request body, enough for a handful of phone photos
const MAX_BODY_SIZE: usize = 50 * 1024 * 1024;

/// Build the router
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/favicon.ico", get(pages::favicon))
        .route("/recipes/{id}", get(pages::recipe_detail))
        .route("/search", get(pages::search))
        .route("/random", get(pages::random))
        .route("/description-div", get(pages::description_div))
        .route("/description", post(pages::description))
        .route("/recipe-from-description", get(sockets::recipe_from_description))
        .route("/webpage-div", get(pages::webpage_div))
        .route("/webpage", post(pages::webpage))
        .route("/recipe-from-webpage", get(sockets::recipe_from_webpage))
        .route("/youtube-div", get(pages::youtube_div))
        .route("/youtube", post(pages::youtube))
        .route("/recipe-from-youtube", get(sockets::recipe_from_youtube))
        .route("/images-div", get(pages::images_div))
        .route("/images", post(pages::images))
        .route("/recipe-from-images", get(sockets::recipe_from_images))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Serve until the process is stopped
pub async fn serve(state: Arc<AppState>, addr: &str) -> Result<()> {
    tokio::fs::create_dir_all(&state.server.upload_dir).await?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}
