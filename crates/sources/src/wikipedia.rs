use anyhow::{anyhow, Context, Result};
use html2text::render::text_renderer::TrivialDecorator;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::cache::FileCache;

pub const DEFAULT_WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";
const RENDER_WIDTH: usize = 120;

/// Plain-text encyclopedia articles from the MediaWiki parse API.
#[derive(Clone)]
pub struct WikipediaClient {
    http: Client,
    api_url: String,
}

impl Default for WikipediaClient {
    fn default() -> Self {
        Self::new(DEFAULT_WIKIPEDIA_API)
    }
}

impl WikipediaClient {
    pub fn new(api_url: &str) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.to_string(),
        }
    }

    /// Article text for an exact resource name such as `Star_Wars_(film)`.
    pub fn fetch(&self, resource: &str) -> Result<String> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[("format", "json"), ("action", "parse"), ("page", resource)])
            .send()
            .with_context(|| format!("wikipedia request for {resource:?} failed"))?;
        if !response.status().is_success() {
            return Err(anyhow!("wikipedia request failed: {}", response.status()));
        }
        let body: Value = response.json()?;
        let html = body
            .pointer("/parse/text/*")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("no article text for {resource:?}"))?;
        Ok(html_to_text(html))
    }

    pub fn fetch_cached(&self, cache: &FileCache, resource: &str) -> Result<String> {
        cache.get_or_fetch(resource, || self.fetch(resource))
    }
}

pub fn html_to_text(html: &str) -> String {
    html2text::from_read_with_decorator(html.as_bytes(), RENDER_WIDTH, TrivialDecorator::new())
}

/// Drops everything from the first `Citations` (case-sensitive) onwards.
pub fn cut_by_citations(article: &str) -> &str {
    match article.find("Citations") {
        Some(pos) => &article[..pos],
        None => article,
    }
}

/// Drops everything before the first occurrence of `phrase`; the whole text
/// is kept when the phrase is absent.
pub fn cut_from_phrase<'a>(text: &'a str, phrase: &str) -> &'a str {
    match text.find(phrase) {
        Some(pos) => &text[pos..],
        None => text,
    }
}
