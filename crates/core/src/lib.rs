mod backend;
mod context;
mod contextual;
mod embedding;
mod error;
mod locate;
mod model;
mod numeric;
mod rank;
mod table;
mod tokenize;
mod window;

pub use backend::{build_model_with, BackendConfig, EncoderConfig};
pub use context::{ContextExtractor, NumberContext};
pub use contextual::{ContextualModel, StackedModel, TokenEncoder};
pub use embedding::{Direction, HashedEncoder, HashedEncoderConfig};
pub use error::{CtxError, Result};
pub use locate::{default_radii, ArticleMatch, DocumentIndex, Locator, ValueMatch, DEFAULT_K};
pub use model::{is_well_formed, mean_of_vectors, EmbeddingModel};
pub use numeric::{is_numeric_looking, numeric_placeholder};
pub use rank::{cosine_similarity, k_closest, retain_well_formed, ScoredContext};
pub use table::{VectorFormat, WordTable};
pub use tokenize::{
    contains_letter_or_digit, filter_alphanumeric, split_camel_case, split_key_words,
    tokenize_and_filter_alphanumeric, tokenize_text,
};
pub use window::{build_context_map, build_context_map_multi, context_map_to_json, ContextMap};
