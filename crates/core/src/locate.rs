use serde_json::Value;

use crate::context::{ContextExtractor, NumberContext};
use crate::error::{CtxError, Result};
use crate::model::EmbeddingModel;
use crate::numeric::is_numeric_looking;
use crate::rank::{k_closest, ScoredContext};
use crate::tokenize::tokenize_and_filter_alphanumeric;
use crate::window::{build_context_map_multi, context_map_to_json};

pub const DEFAULT_K: usize = 15;

pub fn default_radii() -> Vec<usize> {
    (1..=10).collect()
}

/// A structured value and the article contexts ranked against it.
#[derive(Debug, Clone)]
pub struct ValueMatch {
    pub source: NumberContext,
    pub candidates: Vec<ScoredContext>,
}

/// A context of the first article and its single nearest context in every
/// other article, in article order. `None` when that article has no usable
/// contexts.
#[derive(Debug, Clone)]
pub struct ArticleMatch {
    pub source: NumberContext,
    pub nearest: Vec<Option<ScoredContext>>,
}

/// Cross-references structured metadata against tokenized prose.
pub struct Locator<'a> {
    model: &'a dyn EmbeddingModel,
    radii: Vec<usize>,
    k: usize,
}

impl<'a> Locator<'a> {
    pub fn new(model: &'a dyn EmbeddingModel) -> Self {
        Self {
            model,
            radii: default_radii(),
            k: DEFAULT_K,
        }
    }

    pub fn with_radii(mut self, radii: Vec<usize>) -> Self {
        self.radii = radii;
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn metadata_contexts(&self, metadata: &Value) -> Vec<NumberContext> {
        ContextExtractor::new(self.model).extract(metadata)
    }

    /// Numeric tokens of the article keyed by their windows, one entry per
    /// distinct window string across all radii.
    pub fn article_contexts(&self, tokens: &[String]) -> Vec<NumberContext> {
        let map = build_context_map_multi(tokens, &self.radii, is_numeric_looking);
        ContextExtractor::new(self.model).extract(&context_map_to_json(&map))
    }

    /// Nearest article contexts for every metadata value, unfiltered.
    pub fn compare(&self, metadata: &Value, tokens: &[String]) -> Vec<ValueMatch> {
        let article = self.article_contexts(tokens);
        self.metadata_contexts(metadata)
            .into_iter()
            .map(|source| {
                let candidates = k_closest(&source.context_vector, &article, self.k);
                ValueMatch { source, candidates }
            })
            .collect()
    }

    /// Like [`Locator::compare`], keeping only candidates whose literal text
    /// equals the metadata value.
    pub fn locate(&self, metadata: &Value, tokens: &[String]) -> Vec<ValueMatch> {
        let mut matches = self.compare(metadata, tokens);
        for found in matches.iter_mut() {
            let wanted = found.source.raw_value.clone();
            found
                .candidates
                .retain(|candidate| candidate.context.raw_value == wanted);
        }
        let located = matches.iter().filter(|m| !m.candidates.is_empty()).count();
        tracing::debug!("located {located} of {} metadata values", matches.len());
        matches
    }

    /// Cross-article view: every context of the first article against the
    /// closest context of each remaining article.
    pub fn compare_articles(&self, articles: &[Vec<String>]) -> Vec<ArticleMatch> {
        let Some((first, rest)) = articles.split_first() else {
            return Vec::new();
        };
        let others: Vec<Vec<NumberContext>> = rest
            .iter()
            .map(|tokens| self.article_contexts(tokens))
            .collect();
        self.article_contexts(first)
            .into_iter()
            .map(|source| {
                let nearest = others
                    .iter()
                    .map(|contexts| {
                        k_closest(&source.context_vector, contexts, 1)
                            .into_iter()
                            .next()
                    })
                    .collect();
                ArticleMatch { source, nearest }
            })
            .collect()
    }
}

/// Whole documents embedded as one context each, for near-duplicate search.
/// `raw_value` holds the document name and `raw_context` its text.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    documents: Vec<NumberContext>,
    dimension: usize,
}

impl DocumentIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            documents: Vec::new(),
            dimension,
        }
    }

    pub fn embed_document(
        model: &dyn EmbeddingModel,
        name: &str,
        text: &str,
    ) -> Option<NumberContext> {
        let tokens = tokenize_and_filter_alphanumeric(text);
        let context_vector = model.vectorize_context(&tokens)?;
        Some(NumberContext {
            raw_value: name.to_string(),
            context_vector,
            raw_context: text.to_string(),
        })
    }

    pub fn insert(&mut self, document: NumberContext) -> Result<()> {
        if document.context_vector.len() != self.dimension {
            return Err(CtxError::DimensionMismatch {
                expected: self.dimension,
                found: document.context_vector.len(),
            });
        }
        if !document.is_well_formed(self.dimension) {
            tracing::warn!("skipping {}: embedding contains NaN", document.raw_value);
            return Ok(());
        }
        self.documents.push(document);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[NumberContext] {
        &self.documents
    }

    /// Documents ranked by similarity to the named one, itself included.
    pub fn nearest(&self, name: &str, k: usize) -> Option<Vec<ScoredContext>> {
        let query = self.documents.iter().find(|doc| doc.raw_value == name)?;
        Some(k_closest(&query.context_vector, &self.documents, k))
    }
}
