mod common;

use colunch::config::{ServerConfig, SourcesConfig};
use colunch::repository::{RecipeRepository, SqliteRepository};
use colunch::server::{create_app, AppState};
use common::*;
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const CLEAR_DESCRIPTION_SOCKET: &str =
    r#"<div id="recipe-from-description-ws" hx-swap-oob="true"></div>"#;

/// Serve the app on a free local port
async fn serve(provider: Arc<FakeProvider>) -> (SocketAddr, Arc<SqliteRepository>) {
    let (book, repository) =
        recipe_book(provider, SourcesConfig::default(), FakeDownloader::new(false)).await;
    let server = ServerConfig {
        upload_dir: std::env::temp_dir(),
        ..Default::default()
    };
    let app = create_app(AppState::new(book, server));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, repository)
}

fn description_url(addr: SocketAddr, description: &str) -> String {
    format!(
        "ws://{addr}/recipe-from-description?description={}",
        urlencoding::encode(description)
    )
}

/// Every text frame until the server closes the socket
async fn read_until_close(url: &str) -> Vec<String> {
    let (mut stream, _) = connect_async(url).await.unwrap();
    let mut texts = Vec::new();
    while let Some(message) = stream.next().await {
        match message.unwrap() {
            Message::Text(text) => texts.push(text.as_str().to_string()),
            Message::Close(_) => break,
            _ => {}
        }
    }
    texts
}

fn recipe_content(inner: &str) -> String {
    format!(r#"<div id="recipe-content" hx-swap-oob="true">{inner}</div>"#)
}

#[tokio::test]
async fn test_description_socket_streams_recipe() {
    let provider = FakeProvider::new("<NULL>", "Beef stew");
    let (addr, repository) = serve(provider).await;

    let texts = read_until_close(&description_url(addr, "Beef stew")).await;

    assert_eq!(texts.len(), 7, "{texts:#?}");
    assert_eq!(texts[0], recipe_content(r#"Grabbing recipe for "Beef stew" ..."#));
    assert_eq!(
        &texts[1..5],
        &[
            recipe_content("<div>Reading the description ...</div>"),
            recipe_content("<div>Grabbing recipe ...</div>"),
            recipe_content("<div>Naming the recipe ...</div>"),
            recipe_content("<div>Saving the recipe ...</div>"),
        ]
    );

    let stored = repository.search(&[1.0, 0.0], 1).await.unwrap();
    let recipe = &stored[0];
    assert!(texts[5].starts_with(r#"<div id="recipe-content" hx-swap-oob="true">"#));
    assert!(texts[5].contains(&format!(r#"<a href="/recipes/{}">Winter Beef Stew</a>"#, recipe.id)));
    assert!(texts[5].contains("500g beef"));
    assert!(texts[5].contains("From the description ..."));
    assert_eq!(texts[6], CLEAR_DESCRIPTION_SOCKET);
}

#[tokio::test]
async fn test_description_socket_reports_failure() {
    let provider = FakeProvider::new("https://example.com/x", "Make this");
    let (addr, repository) = serve(provider.clone()).await;

    let texts = read_until_close(&description_url(addr, "Make this https://example.com/x")).await;

    let failure = &texts[texts.len() - 2];
    assert!(
        failure.contains("Could not create a recipe from the description"),
        "{texts:#?}"
    );
    assert!(failure.contains("https://example.com/x"));
    assert_eq!(texts.last().unwrap(), CLEAR_DESCRIPTION_SOCKET);
    assert!(provider.recipe_request().is_none());
    assert!(repository.search(&[1.0, 1.0], 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_recipe_is_stored_after_client_leaves() {
    let gate = Arc::new(Notify::new());
    let provider = Arc::new(FakeProvider {
        recipe_gate: Some(gate.clone()),
        ..FakeProvider::plain("<NULL>", "Beef stew")
    });
    let (addr, repository) = serve(provider.clone()).await;

    let (mut stream, _) = connect_async(description_url(addr, "Beef stew")).await.unwrap();
    let intro = stream.next().await.unwrap().unwrap();
    assert!(matches!(intro, Message::Text(_)));
    drop(stream);

    gate.notify_one();

    let mut stored = Vec::new();
    for _ in 0..100 {
        stored = repository.search(&[1.0, 0.0], 1).await.unwrap();
        if !stored.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Winter Beef Stew");
}
