use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::contextual::TokenEncoder;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    #[default]
    Bidirectional,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HashedEncoderConfig {
    pub dimensions: usize,
    pub seed: u64,
    pub direction: Direction,
    pub window: usize,
    pub decay: f32,
}

impl Default for HashedEncoderConfig {
    fn default() -> Self {
        Self {
            dimensions: 3072,
            seed: 1337,
            direction: Direction::Bidirectional,
            window: 4,
            decay: 0.5,
        }
    }
}

/// Deterministic contextual encoder built from feature hashing. A token's
/// vector is its own hashed feature plus its neighbours' features, weighted
/// by `decay^distance` within `window` positions in `direction`.
#[derive(Debug, Clone)]
pub struct HashedEncoder {
    config: HashedEncoderConfig,
}

impl HashedEncoder {
    pub fn new(config: HashedEncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HashedEncoderConfig {
        &self.config
    }

    fn add_feature(&self, vector: &mut [f32], token: &str, weight: f32) {
        let (bucket, sign) = self.bucket_for(token);
        vector[bucket] += sign * weight;
    }

    fn bucket_for(&self, token: &str) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        hasher.write_u64(self.config.seed);
        token.to_lowercase().hash(&mut hasher);
        let hash = hasher.finish();
        let bucket = (hash as usize) % self.config.dimensions.max(1);
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        (bucket, sign)
    }

    fn neighbours(&self, idx: usize, len: usize) -> Vec<(usize, usize)> {
        let window = self.config.window;
        let mut out = Vec::new();
        let look_back = matches!(
            self.config.direction,
            Direction::Forward | Direction::Bidirectional
        );
        let look_ahead = matches!(
            self.config.direction,
            Direction::Backward | Direction::Bidirectional
        );
        for distance in 1..=window {
            if look_back && idx >= distance {
                out.push((idx - distance, distance));
            }
            if look_ahead && idx + distance < len {
                out.push((idx + distance, distance));
            }
        }
        out
    }
}

impl TokenEncoder for HashedEncoder {
    fn dimension(&self) -> usize {
        self.config.dimensions.max(1)
    }

    fn encode(&self, tokens: &[String]) -> Result<Vec<Vec<f32>>> {
        let dims = TokenEncoder::dimension(self);
        let mut vectors = Vec::with_capacity(tokens.len());
        for (idx, token) in tokens.iter().enumerate() {
            let mut vector = vec![0f32; dims];
            self.add_feature(&mut vector, token, 1.0);
            for (other, distance) in self.neighbours(idx, tokens.len()) {
                let weight = self.config.decay.powi(distance as i32);
                self.add_feature(&mut vector, &tokens[other], weight);
            }
            normalize(&mut vector);
            vectors.push(vector);
        }
        Ok(vectors)
    }
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(raw: &str) -> Vec<String> {
        raw.split(' ').map(str::to_string).collect()
    }

    fn encoder(direction: Direction) -> HashedEncoder {
        HashedEncoder::new(HashedEncoderConfig {
            dimensions: 64,
            direction,
            ..Default::default()
        })
    }

    #[test]
    fn encodes_one_unit_vector_per_token() {
        let vectors = encoder(Direction::Bidirectional)
            .encode(&words("box office gross"))
            .unwrap();
        assert_eq!(vectors.len(), 3);
        for vector in vectors {
            assert_eq!(vector.len(), 64);
            let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn same_token_differs_by_context() {
        let enc = encoder(Direction::Bidirectional);
        let left = enc.encode(&words("worldwide gross revenue")).unwrap();
        let right = enc.encode(&words("domestic gross tickets")).unwrap();
        assert_ne!(left[1], right[1]);
    }

    #[test]
    fn forward_encoder_ignores_following_tokens() {
        let enc = encoder(Direction::Forward);
        let a = enc.encode(&words("box office alpha")).unwrap();
        let b = enc.encode(&words("box office beta")).unwrap();
        assert_eq!(a[1], b[1]);
        assert_ne!(a[2], b[2]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let enc = encoder(Direction::Backward);
        let tokens = words("released in 1977");
        assert_eq!(enc.encode(&tokens).unwrap(), enc.encode(&tokens).unwrap());
    }
}
