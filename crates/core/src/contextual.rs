use crate::error::{CtxError, Result};
use crate::model::EmbeddingModel;

/// A model that embeds a whole token sequence at once, returning one vector
/// per token so that each vector reflects its neighbours.
pub trait TokenEncoder: Send + Sync {
    fn dimension(&self) -> usize;

    fn encode(&self, tokens: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Single contextual model (a BERT-style encoder).
pub struct ContextualModel {
    encoder: Box<dyn TokenEncoder>,
}

impl ContextualModel {
    pub fn new(encoder: Box<dyn TokenEncoder>) -> Self {
        Self { encoder }
    }
}

impl EmbeddingModel for ContextualModel {
    fn dimension(&self) -> usize {
        self.encoder.dimension()
    }

    /// Embeds a one-token pseudo-sentence. Discouraged, since it throws away
    /// the context the model exists to capture.
    fn vectorize_word(&self, word: &str) -> Option<Vec<f32>> {
        encode_checked(self.encoder.as_ref(), &[word.to_string()])
            .ok()
            .and_then(|mut vectors| vectors.pop())
    }

    fn vectorize_words(&self, words: &[String]) -> Vec<Vec<f32>> {
        encode_or_empty(self.encoder.as_ref(), words)
    }
}

/// Several contextual encoders whose per-token vectors are concatenated, e.g.
/// a forward and a backward character model.
pub struct StackedModel {
    encoders: Vec<Box<dyn TokenEncoder>>,
    dimension: usize,
}

impl StackedModel {
    pub fn new(encoders: Vec<Box<dyn TokenEncoder>>) -> Result<Self> {
        if encoders.is_empty() {
            return Err(CtxError::InvalidConfig(
                "stacked model needs at least one encoder".to_string(),
            ));
        }
        let dimension = encoders.iter().map(|e| e.dimension()).sum();
        Ok(Self {
            encoders,
            dimension,
        })
    }

    fn encode_stacked(&self, tokens: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut stacked: Vec<Vec<f32>> = tokens
            .iter()
            .map(|_| Vec::with_capacity(self.dimension))
            .collect();
        for encoder in &self.encoders {
            let vectors = encode_checked(encoder.as_ref(), tokens)?;
            for (acc, vector) in stacked.iter_mut().zip(vectors) {
                acc.extend(vector);
            }
        }
        Ok(stacked)
    }
}

impl EmbeddingModel for StackedModel {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn vectorize_word(&self, word: &str) -> Option<Vec<f32>> {
        self.encode_stacked(&[word.to_string()])
            .ok()
            .and_then(|mut vectors| vectors.pop())
    }

    fn vectorize_words(&self, words: &[String]) -> Vec<Vec<f32>> {
        if words.is_empty() {
            return Vec::new();
        }
        match self.encode_stacked(words) {
            Ok(vectors) => vectors,
            Err(err) => {
                tracing::warn!("stacked encoding failed: {err}");
                Vec::new()
            }
        }
    }
}

/// Runs the encoder and enforces token alignment and dimensionality.
fn encode_checked(encoder: &dyn TokenEncoder, tokens: &[String]) -> Result<Vec<Vec<f32>>> {
    let vectors = encoder.encode(tokens)?;
    if vectors.len() != tokens.len() {
        return Err(CtxError::Encoder(format!(
            "expected {} token vectors, got {}",
            tokens.len(),
            vectors.len()
        )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != encoder.dimension()) {
        return Err(CtxError::DimensionMismatch {
            expected: encoder.dimension(),
            found: bad.len(),
        });
    }
    Ok(vectors)
}

fn encode_or_empty(encoder: &dyn TokenEncoder, words: &[String]) -> Vec<Vec<f32>> {
    if words.is_empty() {
        return Vec::new();
    }
    match encode_checked(encoder, words) {
        Ok(vectors) => vectors,
        Err(err) => {
            tracing::warn!("contextual encoding failed: {err}");
            Vec::new()
        }
    }
}
