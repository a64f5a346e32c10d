use serde::{Deserialize, Serialize};

use crate::{FEATURE_CONTENT, FEATURE_SKILLS, FEATURE_TITLE, FEATURE_WORK_TYPE};

/// Per-feature scoring weights.
///
/// By convention the weights sum to 1.0; this is documented but not
/// enforced, so callers may submit unnormalized weights and the scorer
/// accepts them as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub title: f64,
    pub content: f64,
    pub work_type: f64,
    pub skills: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            title: 0.4,
            content: 0.5,
            work_type: 0.1,
            skills: 0.0,
        }
    }
}

impl Weights {
    /// Weight for a feature name; features without a weight contribute 0.
    pub fn for_feature(&self, feature: &str) -> f64 {
        match feature {
            FEATURE_TITLE => self.title,
            FEATURE_CONTENT => self.content,
            FEATURE_WORK_TYPE => self.work_type,
            FEATURE_SKILLS => self.skills,
            _ => 0.0,
        }
    }

    pub fn sum(&self) -> f64 {
        self.title + self.content + self.work_type + self.skills
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!((Weights::default().sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_feature_has_zero_weight() {
        let weights = Weights::default();
        assert_eq!(weights.for_feature("experience_level"), 0.0);
    }

    #[test]
    fn deserializes_with_defaults_for_missing_fields() {
        let weights: Weights = serde_json::from_str(r#"{"title": 0.7}"#).unwrap();
        assert_eq!(weights.title, 0.7);
        assert_eq!(weights.content, 0.5);
        assert_eq!(weights.skills, 0.0);
    }
}
