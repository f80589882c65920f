use super::error::Result;
use super::html::{self, DESCRIPTION_SOCKET, IMAGES_SOCKET, WEBPAGE_SOCKET, YOUTUBE_SOCKET};
use super::state::AppState;
use super::uploads::save_upload;
use crate::error::ColunchError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Form;
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct DescriptionForm {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct WebpageForm {
    #[serde(rename = "webpage-url")]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct YoutubeForm {
    #[serde(rename = "youtube-url")]
    pub url: String,
}

/// Home page listing the recipes closest to the configured phrase
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let recipes = state
        .book
        .search(&state.server.initial_search, state.server.search_results)
        .await
        .unwrap_or_else(|e| {
            warn!("Could not list recipes for the home page: {}", e);
            Vec::new()
        });
    Html(html::index_page(&recipes))
}

pub async fn recipe_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let recipe = state.book.get(&id).await?;
    Ok(Html(html::recipe_page(&recipe)))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>> {
    let phrase = query.q.trim();
    if phrase.is_empty() {
        return Ok(Html(html::recipe_list(None, &[])));
    }
    let recipes = state.book.search(phrase, state.server.search_results).await?;
    Ok(Html(html::recipe_list(None, &recipes)))
}

pub async fn random(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let (phrase, recipes) = state
        .book
        .random_recipes(state.server.search_results)
        .await?;
    Ok(Html(html::recipe_list(Some(&phrase), &recipes)))
}

pub async fn description_div() -> Html<String> {
    Html(html::description_form())
}

pub async fn webpage_div() -> Html<String> {
    Html(html::webpage_form())
}

pub async fn youtube_div() -> Html<String> {
    Html(html::youtube_form())
}

pub async fn images_div() -> Html<String> {
    Html(html::images_form())
}

fn query_param(name: &str, value: &str) -> String {
    format!("{}={}", name, urlencoding::encode(value))
}

pub async fn description(Form(form): Form<DescriptionForm>) -> Html<String> {
    Html(html::socket_started(
        "description-div",
        DESCRIPTION_SOCKET,
        "/recipe-from-description",
        &query_param("description", &form.description),
    ))
}

pub async fn webpage(Form(form): Form<WebpageForm>) -> Html<String> {
    Html(html::socket_started(
        "webpage-div",
        WEBPAGE_SOCKET,
        "/recipe-from-webpage",
        &query_param("webpage-url", form.url.trim()),
    ))
}

pub async fn youtube(Form(form): Form<YoutubeForm>) -> Html<String> {
    Html(html::socket_started(
        "youtube-div",
        YOUTUBE_SOCKET,
        "/recipe-from-youtube",
        &query_param("youtube-url", form.url.trim()),
    ))
}

/// Store uploaded images until the WebSocket named in the reply reads them
pub async fn images(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Html<String>> {
    let mut names = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ColunchError::InvalidUpload(e.body_text()))?
    {
        if field.name() != Some("images") {
            continue;
        }
        let filename = field.file_name().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ColunchError::InvalidUpload(e.body_text()))?;
        // Browsers send one empty part when no file was picked
        if bytes.is_empty() {
            continue;
        }
        names.push(save_upload(&state.server.upload_dir, filename.as_deref(), &bytes).await?);
    }

    if names.is_empty() {
        return Err(ColunchError::EmptyInput.into());
    }
    info!("Received {} image(s)", names.len());

    Ok(Html(html::socket_started(
        "images-div",
        IMAGES_SOCKET,
        "/recipe-from-images",
        &query_param("images", &names.join(",")),
    )))
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
