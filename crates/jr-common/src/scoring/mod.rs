pub mod filter;
pub mod scorer;
pub mod weights;

pub use filter::filter_recommendations;
pub use scorer::{attach_ids, rank_candidates, CandidateMatrix, RankedResult, ScoringError};
pub use weights::Weights;
