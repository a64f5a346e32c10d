use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

use crate::preprocess;

// Fixed seed for deterministic hashing. Changing either key changes
// every stored embedding, so bump ENCODER_VERSION alongside it.
const HASH_SEED_K0: u64 = 0x6a72_7465_7874_0001;
const HASH_SEED_K1: u64 = 0x1000_4776_6574_726a;

pub const ENCODER_VERSION: &str = "v1";

/// Deterministic text-to-vector encoder using feature hashing.
///
/// Tokens from the preprocessing pipeline are hashed into a fixed number
/// of buckets with SipHash-1-3 and fixed keys; a second hash picks the
/// sign so collisions cancel in expectation. The result is L2-normalized
/// so dot products between encoded texts behave like cosine similarity.
#[derive(Debug, Clone)]
pub struct TextEncoder {
    dimension: usize,
}

impl TextEncoder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn hash_token(&self, token: &str, salt: &str) -> usize {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        token.hash(&mut hasher);
        salt.hash(&mut hasher);
        (hasher.finish() as usize) % self.dimension
    }

    /// Encode raw text. Empty or all-stop-word input encodes to the zero
    /// vector, not an error.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let tokens = preprocess::preprocess(text);
        let mut vector = vec![0.0f32; self.dimension];

        for token in &tokens {
            let idx = self.hash_token(token, "idx");
            let sign = if self.hash_token(token, "sign") % 2 == 0 {
                1.0
            } else {
                -1.0
            };
            vector[idx] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = TextEncoder::new(128);
        let a = encoder.encode("senior rust engineer");
        let b = encoder.encode("senior rust engineer");
        assert_eq!(a, b);
    }

    #[test]
    fn non_empty_text_encodes_to_unit_vector() {
        let encoder = TextEncoder::new(256);
        let vector = encoder.encode("distributed systems and databases");
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "L2 norm should be 1.0, got {norm}");
    }

    #[test]
    fn empty_text_encodes_to_zero_vector() {
        let encoder = TextEncoder::new(64);
        let vector = encoder.encode("");
        assert_eq!(vector.len(), 64);
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn similar_texts_score_higher_than_unrelated_texts() {
        let encoder = TextEncoder::new(256);
        let base = encoder.encode("machine learning engineer python tensorflow");
        let similar = encoder.encode("python machine learning models in production");
        let unrelated = encoder.encode("pastry chef bakery croissant dough");

        assert!(dot(&base, &similar) > dot(&base, &unrelated));
    }

    #[test]
    fn dimension_is_clamped_to_at_least_one() {
        let encoder = TextEncoder::new(0);
        assert_eq!(encoder.dimension(), 1);
    }
}
