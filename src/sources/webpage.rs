use crate::error::Result;
use log::debug;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches recipe pages over plain HTTP
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch `url` and return its raw HTML
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let html = response.text().await?;
        debug!("Fetched {} ({} bytes)", url, html.len());
        Ok(html)
    }

    /// Fetch `url` and return the visible text of the page
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let html = self.fetch(url).await?;
        Ok(extract_text_from_html(&html))
    }
}

/// Visible text of the `<body>`, one line per text node.
///
/// Script, style and similar non-rendered elements are skipped.
pub fn extract_text_from_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body").expect("static selector");

    let root = document
        .select(&body)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    collect_text(&root, &mut lines);
    lines.join("\n")
}

fn collect_text(element: &ElementRef, lines: &mut Vec<String>) {
    if should_skip_element(element) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let normalized = normalize_whitespace(text);
                if !normalized.is_empty() {
                    lines.push(normalized);
                }
            }
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(&child_ref, lines);
                }
            }
            _ => {}
        }
    }
}

fn should_skip_element(element: &ElementRef) -> bool {
    let value = element.value();
    matches!(
        value.name(),
        "script" | "style" | "noscript" | "template" | "svg" | "iframe" | "head"
    ) || value.attr("hidden").is_some()
        || value
            .attr("style")
            .is_some_and(|s| s.contains("display: none") || s.contains("visibility: hidden"))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
