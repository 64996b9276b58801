/// Uniform capability over word and context vectorization strategies.
///
/// Implementations are built once (often an expensive load) and then used
/// read-only.
pub trait EmbeddingModel: Send + Sync {
    /// Fixed dimensionality of every vector this model produces.
    fn dimension(&self) -> usize;

    /// Vector for a single word, or `None` when the word is unknown.
    fn vectorize_word(&self, word: &str) -> Option<Vec<f32>>;

    /// Vectors for an ordered list of words. Table models drop unknown words;
    /// contextual models return one vector per input word.
    fn vectorize_words(&self, words: &[String]) -> Vec<Vec<f32>>;

    /// Element-wise mean of [`EmbeddingModel::vectorize_words`]; `None` when
    /// nothing could be vectorized.
    fn vectorize_context(&self, words: &[String]) -> Option<Vec<f32>> {
        mean_of_vectors(&self.vectorize_words(words), self.dimension())
    }
}

pub fn mean_of_vectors(vectors: &[Vec<f32>], dimension: usize) -> Option<Vec<f32>> {
    if vectors.is_empty() {
        return None;
    }
    let mut mean = vec![0f32; dimension];
    for vector in vectors {
        for (acc, value) in mean.iter_mut().zip(vector.iter()) {
            *acc += value;
        }
    }
    let count = vectors.len() as f32;
    for value in mean.iter_mut() {
        *value /= count;
    }
    Some(mean)
}

pub fn is_well_formed(vector: &[f32], dimension: usize) -> bool {
    vector.len() == dimension && !vector.iter().any(|v| v.is_nan())
}
