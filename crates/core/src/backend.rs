use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::contextual::{ContextualModel, StackedModel, TokenEncoder};
use crate::embedding::{Direction, HashedEncoder, HashedEncoderConfig};
use crate::error::Result;
use crate::model::EmbeddingModel;
use crate::table::{VectorFormat, WordTable};

/// Which embedding backend to construct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Table {
        path: PathBuf,
        #[serde(default)]
        format: VectorFormat,
        #[serde(default)]
        limit: Option<usize>,
    },
    Contextual {
        #[serde(default = "default_contextual_encoder")]
        encoder: EncoderConfig,
    },
    Stacked {
        #[serde(default = "default_stacked_encoders")]
        encoders: Vec<EncoderConfig>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Contextual {
            encoder: default_contextual_encoder(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncoderConfig {
    Hashed(HashedEncoderConfig),
    Http { url: String, dimensions: usize },
}

fn default_contextual_encoder() -> EncoderConfig {
    EncoderConfig::Hashed(HashedEncoderConfig::default())
}

fn default_stacked_encoders() -> Vec<EncoderConfig> {
    [Direction::Forward, Direction::Backward]
        .into_iter()
        .map(|direction| {
            EncoderConfig::Hashed(HashedEncoderConfig {
                dimensions: 1024,
                direction,
                ..Default::default()
            })
        })
        .collect()
}

/// Builds the configured backend. `remote` constructs encoders that live
/// behind a URL; it is only called for [`EncoderConfig::Http`].
pub fn build_model_with<F>(config: &BackendConfig, remote: F) -> Result<Box<dyn EmbeddingModel>>
where
    F: Fn(&str, usize) -> Result<Box<dyn TokenEncoder>>,
{
    let build_encoder = |encoder: &EncoderConfig| -> Result<Box<dyn TokenEncoder>> {
        match encoder {
            EncoderConfig::Hashed(cfg) => Ok(Box::new(HashedEncoder::new(*cfg))),
            EncoderConfig::Http { url, dimensions } => remote(url, *dimensions),
        }
    };
    let model: Box<dyn EmbeddingModel> = match config {
        BackendConfig::Table {
            path,
            format,
            limit,
        } => Box::new(WordTable::load(path, *format, *limit)?),
        BackendConfig::Contextual { encoder } => {
            Box::new(ContextualModel::new(build_encoder(encoder)?))
        }
        BackendConfig::Stacked { encoders } => {
            let built = encoders
                .iter()
                .map(&build_encoder)
                .collect::<Result<Vec<_>>>()?;
            Box::new(StackedModel::new(built)?)
        }
    };
    tracing::debug!("embedding backend ready ({}d)", model.dimension());
    Ok(model)
}
