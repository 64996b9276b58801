use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use ctxmatch_core::{default_radii, BackendConfig, DEFAULT_K};
use ctxmatch_sources::omdb::{DEFAULT_API_KEY_ENV, DEFAULT_OMDB_URL};
use ctxmatch_sources::wikipedia::DEFAULT_WIKIPEDIA_API;

pub const DEFAULT_CONFIG: &str = "ctxmatch.toml";

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub omdb: OmdbConfig,
    #[serde(default)]
    pub wikipedia: WikipediaConfig,
    #[serde(default)]
    pub dbpedia: DbpediaConfig,
}

#[derive(Debug, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_radii")]
    pub radii: Vec<usize>,
    #[serde(default = "default_window_radius")]
    pub window_radius: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            radii: default_radii(),
            window_radius: default_window_radius(),
        }
    }
}

fn default_k() -> usize {
    DEFAULT_K
}

fn default_window_radius() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_root")]
    pub root: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
        }
    }
}

impl CacheConfig {
    pub fn omdb_dir(&self) -> PathBuf {
        self.root.join("omdb_jsons")
    }

    pub fn wiki_dir(&self) -> PathBuf {
        self.root.join("wiki_cache")
    }

    pub fn embeddings_dir(&self) -> PathBuf {
        self.root.join("embeddings")
    }
}

fn default_cache_root() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Deserialize)]
pub struct OmdbConfig {
    #[serde(default = "default_omdb_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            base_url: default_omdb_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_omdb_url() -> String {
    DEFAULT_OMDB_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

#[derive(Debug, Deserialize)]
pub struct WikipediaConfig {
    #[serde(default = "default_wikipedia_api")]
    pub api_url: String,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: default_wikipedia_api(),
        }
    }
}

fn default_wikipedia_api() -> String {
    DEFAULT_WIKIPEDIA_API.to_string()
}

#[derive(Debug, Deserialize)]
pub struct DbpediaConfig {
    #[serde(default = "default_split_root")]
    pub split_root: PathBuf,
}

impl Default for DbpediaConfig {
    fn default() -> Self {
        Self {
            split_root: default_split_root(),
        }
    }
}

fn default_split_root() -> PathBuf {
    PathBuf::from("data/dbpedia_infobox/split")
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&contents).map_err(|e| anyhow!("invalid config: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxmatch_core::{EncoderConfig, VectorFormat};

    #[test]
    fn missing_file_gives_defaults() {
        let config = load_config(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.matching.k, 15);
        assert_eq!(config.matching.radii, (1..=10).collect::<Vec<_>>());
        assert_eq!(config.cache.wiki_dir(), PathBuf::from("data/wiki_cache"));
        assert_eq!(config.backend, BackendConfig::default());
    }

    #[test]
    fn parses_table_backend_and_overrides() {
        let raw = r#"
            [backend]
            kind = "table"
            path = "data/GoogleNews-vectors-negative300.bin"
            format = "binary"

            [matching]
            k = 5
            radii = [2, 4]

            [cache]
            root = "/var/cache/ctxmatch"
        "#;
        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Table {
                path: PathBuf::from("data/GoogleNews-vectors-negative300.bin"),
                format: VectorFormat::Binary,
                limit: None,
            }
        );
        assert_eq!(config.matching.k, 5);
        assert_eq!(config.matching.radii, vec![2, 4]);
        assert_eq!(config.matching.window_radius, 10);
        assert_eq!(
            config.cache.omdb_dir(),
            PathBuf::from("/var/cache/ctxmatch/omdb_jsons")
        );
    }

    #[test]
    fn parses_http_contextual_backend() {
        let raw = r#"
            [backend]
            kind = "contextual"

            [backend.encoder]
            kind = "http"
            url = "http://localhost:8080/embed"
            dimensions = 3072
        "#;
        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Contextual {
                encoder: EncoderConfig::Http {
                    url: "http://localhost:8080/embed".to_string(),
                    dimensions: 3072,
                }
            }
        );
    }
}
