use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use ctxmatch_core::{build_model_with, BackendConfig, CtxError, EmbeddingModel, TokenEncoder};

/// Contextual encoder served over HTTP, e.g. a pretrained BERT or Flair model
/// wrapped in a small web service. The service receives `{"tokens": [...]}`
/// and answers `{"embeddings": [[...], ...]}` with one vector per token.
#[derive(Clone)]
pub struct HttpTokenEncoder {
    http: Client,
    url: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EncodeRequest<'a> {
    tokens: &'a [String],
}

#[derive(Deserialize)]
struct EncodeResponse {
    embeddings: Vec<Vec<f32>>,
}

impl HttpTokenEncoder {
    pub fn new(url: &str, dimensions: usize) -> Self {
        Self {
            http: Client::new(),
            url: url.to_string(),
            dimensions,
        }
    }
}

impl TokenEncoder for HttpTokenEncoder {
    fn dimension(&self) -> usize {
        self.dimensions
    }

    fn encode(&self, tokens: &[String]) -> ctxmatch_core::Result<Vec<Vec<f32>>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .http
            .post(&self.url)
            .json(&EncodeRequest { tokens })
            .send()
            .map_err(|err| CtxError::Encoder(format!("request to {} failed: {err}", self.url)))?;
        if !response.status().is_success() {
            return Err(CtxError::Encoder(format!(
                "encoder at {} answered {}",
                self.url,
                response.status()
            )));
        }
        let parsed: EncodeResponse = response
            .json()
            .map_err(|err| CtxError::Encoder(format!("invalid encoder response: {err}")))?;
        Ok(parsed.embeddings)
    }
}

/// Builds the configured backend, resolving HTTP encoders to
/// [`HttpTokenEncoder`].
pub fn build_model(config: &BackendConfig) -> ctxmatch_core::Result<Box<dyn EmbeddingModel>> {
    build_model_with(config, |url, dimensions| {
        Ok(Box::new(HttpTokenEncoder::new(url, dimensions)) as Box<dyn TokenEncoder>)
    })
}
