pub mod categorical;
pub mod embedder;
pub mod text;

use std::collections::HashMap;

pub use categorical::CategoricalEncoder;
pub use embedder::{BatchOutcome, EmbedError, EmbedderConfig, EmbedderConfigError, FeatureEmbedder};
pub use text::TextEncoder;

/// A dense numeric vector for one named feature.
pub type FeatureVector = Vec<f32>;

/// One entity's embeddings, keyed by feature name.
pub type EntityEmbedding = HashMap<String, FeatureVector>;

/// An encoder assigned to a feature at configuration time.
///
/// The two variants take different input shapes (free text vs a tag
/// list), so the dispatch is a tagged enum rather than runtime type
/// inspection: a feature is either a text feature or a categorical
/// feature, decided once when the embedder is built.
#[derive(Debug, Clone)]
pub enum FeatureEncoder {
    Text(TextEncoder),
    Categorical(CategoricalEncoder),
}

impl FeatureEncoder {
    /// Output width of every vector this encoder produces.
    pub fn dimension(&self) -> usize {
        match self {
            FeatureEncoder::Text(enc) => enc.dimension(),
            FeatureEncoder::Categorical(enc) => enc.dimension(),
        }
    }

}
