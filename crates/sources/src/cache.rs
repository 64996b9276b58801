use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Directory-backed key/value cache. One file per key under `root`.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_key(key))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read cache entry {}", path.display()))?;
        Ok(Some(contents))
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create cache dir {}", self.root.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value)
            .with_context(|| format!("failed to write cache entry {}", path.display()))
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => {
                let parsed = serde_json::from_str(&raw)
                    .with_context(|| format!("corrupt cache entry {key:?}"))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.put(key, &serde_json::to_string(value)?)
    }

    /// Cached value for `key`, or the result of `fetch`, which is then stored.
    /// A failed store is logged and does not fail the lookup.
    pub fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(hit) = self.get(key)? {
            tracing::debug!("cache hit for {key:?}");
            return Ok(hit);
        }
        let fetched = fetch()?;
        if let Err(err) = self.put(key, &fetched) {
            tracing::warn!("could not cache {key:?}: {err:#}");
        }
        Ok(fetched)
    }
}

fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => format!("_{cleaned}"),
        _ => cleaned,
    }
}
