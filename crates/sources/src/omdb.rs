use std::env;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde_json::{Map, Value};

use crate::cache::FileCache;

pub const DEFAULT_OMDB_URL: &str = "http://www.omdbapi.com";
pub const DEFAULT_API_KEY_ENV: &str = "OMDB_API_KEY";

/// Movie metadata from the OMDb API.
#[derive(Clone)]
pub struct OmdbClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_env(base_url: &str, api_key_env: &str) -> Result<Self> {
        let api_key = env::var(api_key_env)
            .map_err(|_| anyhow!("{api_key_env} is required to query OMDb"))?;
        Ok(Self::new(base_url, &api_key))
    }

    /// Full-plot metadata for the movie best matching `title`.
    pub fn fetch(&self, title: &str) -> Result<Value> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("t", title), ("plot", "full"), ("apikey", self.api_key.as_str())])
            .send()
            .with_context(|| format!("omdb request for {title:?} failed"))?;
        if !response.status().is_success() {
            return Err(anyhow!("omdb request failed: {}", response.status()));
        }
        let body: Value = response.json()?;
        if body.get("Response").and_then(Value::as_str) == Some("False") {
            let reason = body
                .get("Error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(anyhow!("omdb has no movie for {title:?}: {reason}"));
        }
        Ok(body)
    }

    pub fn fetch_cached(&self, cache: &FileCache, title: &str) -> Result<Value> {
        let raw = cache.get_or_fetch(title, || {
            let body = self.fetch(title)?;
            Ok(serde_json::to_string(&body)?)
        })?;
        serde_json::from_str(&raw).with_context(|| format!("cached omdb json for {title:?}"))
    }
}

/// Reshapes OMDb output so its contexts vectorize better: `Ratings` becomes a
/// list of `{source: value}` objects and Metacritic's `90/100` is spaced out
/// to `90 / 100`.
pub fn preprocess_movie_json(mut movie: Value) -> Value {
    if let Some(ratings) = movie.get_mut("Ratings").and_then(Value::as_array_mut) {
        for rating in ratings.iter_mut() {
            if let Some(reshaped) = reshape_rating(rating) {
                *rating = reshaped;
            }
        }
    }
    movie
}

fn reshape_rating(rating: &Value) -> Option<Value> {
    let source = rating.get("Source")?.as_str()?;
    let value = rating.get("Value")?.as_str()?;
    let value = if source == "Metacritic" {
        value.split('/').collect::<Vec<_>>().join(" / ")
    } else {
        value.to_string()
    };
    let mut reshaped = Map::new();
    reshaped.insert(source.to_string(), Value::String(value));
    Some(Value::Object(reshaped))
}
