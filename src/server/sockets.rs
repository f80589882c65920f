//! WebSocket endpoints streaming a recipe as it is created.

use super::html::{self, DESCRIPTION_SOCKET, IMAGES_SOCKET, WEBPAGE_SOCKET, YOUTUBE_SOCKET};
use super::state::AppState;
use super::uploads::take_uploads;
use crate::error::Result;
use crate::model::Recipe;
use crate::pipelines::ProgressSender;
use crate::sources::Source;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use log::{error, info, warn};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;

#[derive(Debug, Deserialize)]
pub struct DescriptionQuery {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct WebpageQuery {
    #[serde(rename = "webpage-url")]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct YoutubeQuery {
    #[serde(rename = "youtube-url")]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ImagesQuery {
    /// Comma separated upload names
    #[serde(default)]
    pub images: String,
}

/// How one socket announces itself, what it reports on failure and what the
/// finished recipe is shown alongside
struct Job {
    socket_id: &'static str,
    intro: String,
    action: String,
    origin: Option<(&'static str, String)>,
}

async fn send(socket: &mut WebSocket, fragment: String) -> std::result::Result<(), axum::Error> {
    socket.send(Message::Text(fragment.into())).await
}

/// Run `pipeline` on its own task, forwarding its progress to the socket,
/// then send the recipe or the failure, clear the socket div and close.
///
/// A client that goes away stops the streaming only; the pipeline task runs
/// to completion and still stores the recipe.
async fn stream_recipe<P, F>(mut socket: WebSocket, job: Job, pipeline: P)
where
    P: FnOnce(ProgressSender) -> F,
    F: Future<Output = Result<Recipe>> + Send + 'static,
{
    if send(&mut socket, html::recipe_content(&html::escape(&job.intro)))
        .await
        .is_err()
    {
        warn!("Client left {} before it started", job.socket_id);
        return;
    }

    let (sender, mut receiver) = unbounded_channel();
    let mut pipeline = tokio::spawn(pipeline(sender));

    // Queued progress goes out before the outcome
    let outcome = loop {
        tokio::select! {
            biased;
            Some(event) = receiver.recv() => {
                if send(&mut socket, html::progress(&event)).await.is_err() {
                    warn!("Client left {}, recipe continues without it", job.socket_id);
                    return;
                }
            }
            joined = &mut pipeline => break joined.unwrap_or_else(|e| Err(e.into())),
        }
    };
    while let Ok(event) = receiver.try_recv() {
        if send(&mut socket, html::progress(&event)).await.is_err() {
            warn!("Client left {} before the recipe was sent", job.socket_id);
            return;
        }
    }

    let fragment = match outcome {
        Ok(recipe) => {
            info!("Streamed recipe {} on {}", recipe.id, job.socket_id);
            let origin = job
                .origin
                .as_ref()
                .map(|(label, text)| (*label, text.as_str()));
            html::recipe_result(&recipe, origin)
        }
        Err(e) => {
            error!("Could not {}: {}", job.action, e);
            html::failure(&job.action, &e)
        }
    };

    let _ = send(&mut socket, fragment).await;
    let _ = send(&mut socket, html::clear_socket(job.socket_id)).await;
    let _ = socket.send(Message::Close(None)).await;
}

pub async fn recipe_from_description(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<DescriptionQuery>,
) -> Response {
    let description = query.description;
    let job = Job {
        socket_id: DESCRIPTION_SOCKET,
        intro: format!("Grabbing recipe for \"{description}\" ..."),
        action: "create a recipe from the description".to_string(),
        origin: Some(("description", description.clone())),
    };
    ws.on_upgrade(move |socket| {
        stream_recipe(socket, job, move |progress| async move {
            state.book.create(&description, &[], Some(&progress)).await
        })
    })
}

pub async fn recipe_from_webpage(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebpageQuery>,
) -> Response {
    let url = query.url;
    let job = Job {
        socket_id: WEBPAGE_SOCKET,
        intro: format!("Grabbing content for {url} ..."),
        action: format!("fetch {url}"),
        origin: None,
    };
    ws.on_upgrade(move |socket| {
        stream_recipe(socket, job, move |progress| async move {
            let source = Source::Webpage(url);
            state.book.create_from_source(&source, Some(&progress)).await
        })
    })
}

pub async fn recipe_from_youtube(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<YoutubeQuery>,
) -> Response {
    let url = query.url;
    let job = Job {
        socket_id: YOUTUBE_SOCKET,
        intro: format!("Grabbing audio for {url} ..."),
        action: format!("transcribe {url}"),
        origin: None,
    };
    ws.on_upgrade(move |socket| {
        stream_recipe(socket, job, move |progress| async move {
            let source = Source::Video(url);
            state.book.create_from_source(&source, Some(&progress)).await
        })
    })
}

pub async fn recipe_from_images(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImagesQuery>,
) -> Response {
    let names: Vec<String> = query
        .images
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();
    let job = Job {
        socket_id: IMAGES_SOCKET,
        intro: "Grabbing recipe ...".to_string(),
        action: "create a recipe from the images".to_string(),
        origin: None,
    };
    ws.on_upgrade(move |socket| {
        stream_recipe(socket, job, move |progress| async move {
            let images = take_uploads(&state.server.upload_dir, &names).await?;
            state.book.create("", &images, Some(&progress)).await
        })
    })
}
