mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use colunch::config::{ServerConfig, SourcesConfig};
use colunch::repository::{RecipeRepository, SqliteRepository};
use colunch::server::{create_app, take_uploads, AppState};
use colunch::Recipe;
use common::*;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

async fn app(upload_dir: &Path) -> (Router, Arc<SqliteRepository>) {
    let provider = FakeProvider::new("<NULL>", "");
    let (book, repository) =
        recipe_book(provider, SourcesConfig::default(), FakeDownloader::new(false)).await;
    let server = ServerConfig {
        upload_dir: upload_dir.to_path_buf(),
        initial_search: "stew".to_string(),
        ..Default::default()
    };
    (create_app(AppState::new(book, server)), repository)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    read(app.oneshot(request).await.unwrap()).await
}

async fn read(response: axum::response::Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_favicon_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path()).await;
    let (status, body) = get(app, "/favicon.ico").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_index_lists_recipes() {
    let dir = tempfile::tempdir().unwrap();
    let (app, repository) = app(dir.path()).await;
    let stew = Recipe::new("Irish <Stew>", "Lamb and potatoes", "A stew");
    repository.store(&stew, &embedding_of(&stew.content)).await.unwrap();

    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Irish &lt;Stew&gt;"));
    assert!(body.contains(&format!("/recipes/{}", stew.id)));
    assert!(body.contains("/description-div"));
}

#[tokio::test]
async fn test_recipe_detail() {
    let dir = tempfile::tempdir().unwrap();
    let (app, repository) = app(dir.path()).await;
    let recipe = Recipe::new("Pudding", "Sweet", "#### Ingredients\n- Bread");
    repository.store(&recipe, &[0.1, 0.2]).await.unwrap();

    let (status, body) = get(app, &format!("/recipes/{}", recipe.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<title>Pudding</title>"));
    assert!(body.contains("<li>Bread</li>"));
}

#[tokio::test]
async fn test_missing_recipe_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path()).await;
    let (status, body) = get(app, "/recipes/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Recipe not found: nope"));
}

#[tokio::test]
async fn test_search_and_random() {
    let dir = tempfile::tempdir().unwrap();
    let (app, repository) = app(dir.path()).await;
    let cake = Recipe::new("Cake", "Sponge", "A cake");
    let stew = Recipe::new("Stew", "Beef", "A stew");
    repository.store(&cake, &embedding_of(&cake.content)).await.unwrap();
    repository.store(&stew, &embedding_of(&stew.content)).await.unwrap();

    let (status, body) = get(app.clone(), "/search?q=cake").await;
    assert_eq!(status, StatusCode::OK);
    let cake_at = body.find("Cake").unwrap();
    let stew_at = body.find("Stew").unwrap();
    assert!(cake_at < stew_at);

    let (status, body) = get(app.clone(), "/search?q=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No recipes yet."));

    let (status, body) = get(app, "/random").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Hearty winter stew"));
}

#[tokio::test]
async fn test_method_forms() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path()).await;

    for (uri, post) in [
        ("/description-div", "/description"),
        ("/webpage-div", "/webpage"),
        ("/youtube-div", "/youtube"),
        ("/images-div", "/images"),
    ] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(&format!(r#"hx-post="{post}""#)), "{uri}: {body}");
        assert!(body.contains(r#"<div id="recipe-method" hx-swap-oob="true"></div>"#));
    }
}

#[tokio::test]
async fn test_description_opens_socket() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/description")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("description=Fish+%26+chips"))
        .unwrap();
    let (status, body) = read(app.oneshot(request).await.unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"<div id="description-div"></div>"#));
    assert!(body.contains(r#"id="recipe-from-description-ws""#));
    assert!(body.contains("/recipe-from-description?description=Fish%20%26%20chips"));
}

#[tokio::test]
async fn test_webpage_opens_socket() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/webpage")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("webpage-url=https%3A%2F%2Fwww.bbcgoodfood.com%2Frecipes%2Fpie"))
        .unwrap();
    let (status, body) = read(app.oneshot(request).await.unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(
        "/recipe-from-webpage?webpage-url=https%3A%2F%2Fwww.bbcgoodfood.com%2Frecipes%2Fpie"
    ));
}

fn multipart(parts: &[(&str, &[u8])]) -> (String, Vec<u8>) {
    let boundary = "colunch-test-boundary";
    let mut body = Vec::new();
    for (filename, bytes) in parts {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

#[tokio::test]
async fn test_image_upload_is_saved_for_socket() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path()).await;

    let (content_type, body) = multipart(&[("dish.png", &b"png-bytes"[..]), ("menu.jpg", &b"jpg-bytes"[..])]);
    let request = Request::builder()
        .method("POST")
        .uri("/images")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    let (status, body) = read(app.oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"<div id="images-div"></div>"#));

    let query = body
        .split("/recipe-from-images?images=")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap();
    let names: Vec<String> = urlencoding::decode(query)
        .unwrap()
        .split(',')
        .map(String::from)
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names[0].ends_with(".png"));
    assert!(names[1].ends_with(".jpg"));

    let images = take_uploads(dir.path(), &names).await.unwrap();
    assert_eq!(images[0].bytes, b"png-bytes");
    assert_eq!(images[1].mime, "image/jpeg");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_without_images_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app(dir.path()).await;

    let (content_type, body) = multipart(&[("", &b""[..])]);
    let request = Request::builder()
        .method("POST")
        .uri("/images")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    let (status, body) = read(app.oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Provide a description or images"));
}
