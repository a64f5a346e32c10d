use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use super::{CategoricalEncoder, EntityEmbedding, FeatureEncoder, TextEncoder};
use crate::{
    Job, UserProfile, ValidationError, FEATURE_ABOUT, FEATURE_CONTENT,
    FEATURE_PREFERRED_WORK_TYPES, FEATURE_SKILLS, FEATURE_TITLE, FEATURE_WORK_TYPE,
    WORK_TYPE_VOCABULARY,
};

pub const DEFAULT_TEXT_DIMENSION: usize = 256;

#[derive(Debug, Error)]
pub enum EmbedderConfigError {
    #[error("feature '{0}' already has an encoder assigned")]
    DuplicateFeature(String),
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] ValidationError),
    #[error("feature '{feature}' has no encoder configured")]
    MissingEncoder { feature: String },
    #[error("feature '{feature}' expects a {expected} encoder")]
    EncoderMismatch {
        feature: String,
        expected: &'static str,
    },
    #[error("unknown value '{value}' for categorical feature '{feature}'")]
    UnknownCategory { feature: String, value: String },
}

/// Feature-to-encoder assignments, built once at startup.
///
/// A feature takes exactly one encoder; assigning a second is a fatal
/// configuration error, never a per-call one.
#[derive(Debug, Default, Clone)]
pub struct EmbedderConfig {
    encoders: HashMap<String, FeatureEncoder>,
}

impl EmbedderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign_text(
        mut self,
        feature: &str,
        encoder: TextEncoder,
    ) -> Result<Self, EmbedderConfigError> {
        self.assign(feature, FeatureEncoder::Text(encoder))?;
        Ok(self)
    }

    pub fn assign_categorical(
        mut self,
        feature: &str,
        encoder: CategoricalEncoder,
    ) -> Result<Self, EmbedderConfigError> {
        self.assign(feature, FeatureEncoder::Categorical(encoder))?;
        Ok(self)
    }

    fn assign(&mut self, feature: &str, encoder: FeatureEncoder) -> Result<(), EmbedderConfigError> {
        if self.encoders.contains_key(feature) {
            return Err(EmbedderConfigError::DuplicateFeature(feature.to_string()));
        }
        self.encoders.insert(feature.to_string(), encoder);
        Ok(())
    }

    /// The standard schema: text encoders for title/content/about/skills,
    /// the shared work-type vocabulary for both categorical features.
    pub fn standard(text_dimension: usize) -> Self {
        let text = TextEncoder::new(text_dimension);
        let work_types = CategoricalEncoder::new(WORK_TYPE_VOCABULARY);

        // Duplicate assignment is impossible here; the list is disjoint.
        Self::new()
            .assign_text(FEATURE_TITLE, text.clone())
            .and_then(|cfg| cfg.assign_text(FEATURE_CONTENT, text.clone()))
            .and_then(|cfg| cfg.assign_text(FEATURE_ABOUT, text.clone()))
            .and_then(|cfg| cfg.assign_text(FEATURE_SKILLS, text))
            .and_then(|cfg| cfg.assign_categorical(FEATURE_WORK_TYPE, work_types.clone()))
            .and_then(|cfg| cfg.assign_categorical(FEATURE_PREFERRED_WORK_TYPES, work_types))
            .expect("standard feature schema has no duplicate assignments")
    }
}

/// Converts structured records into per-feature embeddings using the
/// configured encoders. Constructed once at process start and passed by
/// reference; holds no mutable state.
#[derive(Debug, Clone)]
pub struct FeatureEmbedder {
    encoders: HashMap<String, FeatureEncoder>,
}

/// Outcome of a batch embed: failures are reported per record, the rest
/// of the batch proceeds.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub embedded: Vec<(i64, EntityEmbedding)>,
    pub failed: Vec<(i64, EmbedError)>,
}

impl FeatureEmbedder {
    pub fn new(config: EmbedderConfig) -> Self {
        Self {
            encoders: config.encoders,
        }
    }

    pub fn standard() -> Self {
        Self::new(EmbedderConfig::standard(DEFAULT_TEXT_DIMENSION))
    }

    fn encode_text(&self, feature: &str, text: &str) -> Result<Vec<f32>, EmbedError> {
        match self.encoders.get(feature) {
            Some(FeatureEncoder::Text(encoder)) => Ok(encoder.encode(text)),
            Some(_) => Err(EmbedError::EncoderMismatch {
                feature: feature.to_string(),
                expected: "text",
            }),
            None => Err(EmbedError::MissingEncoder {
                feature: feature.to_string(),
            }),
        }
    }

    fn encode_tags(&self, feature: &str, values: &[String]) -> Result<Vec<f32>, EmbedError> {
        match self.encoders.get(feature) {
            Some(FeatureEncoder::Categorical(encoder)) => {
                encoder.encode(values).map_err(|value| EmbedError::UnknownCategory {
                    feature: feature.to_string(),
                    value,
                })
            }
            Some(_) => Err(EmbedError::EncoderMismatch {
                feature: feature.to_string(),
                expected: "categorical",
            }),
            None => Err(EmbedError::MissingEncoder {
                feature: feature.to_string(),
            }),
        }
    }

    /// Embed one job record: one vector per feature on the job schema.
    pub fn embed_job(&self, job: &Job) -> Result<EntityEmbedding, EmbedError> {
        job.validate()?;

        let mut embedding = EntityEmbedding::new();
        embedding.insert(
            FEATURE_TITLE.to_string(),
            self.encode_text(FEATURE_TITLE, &job.title)?,
        );
        embedding.insert(
            FEATURE_CONTENT.to_string(),
            self.encode_text(FEATURE_CONTENT, &job.content)?,
        );

        if let Some(work_type) = &job.work_type {
            embedding.insert(
                FEATURE_WORK_TYPE.to_string(),
                self.encode_tags(FEATURE_WORK_TYPE, std::slice::from_ref(work_type))?,
            );
        }

        Ok(embedding)
    }

    /// Embed one user profile on the user schema. Optional fields that
    /// are absent are stored as absent, not as zero vectors.
    pub fn embed_user(&self, user: &UserProfile) -> Result<EntityEmbedding, EmbedError> {
        user.validate()?;

        let mut embedding = EntityEmbedding::new();
        embedding.insert(
            FEATURE_TITLE.to_string(),
            self.encode_text(FEATURE_TITLE, &user.title)?,
        );
        embedding.insert(
            FEATURE_ABOUT.to_string(),
            self.encode_text(FEATURE_ABOUT, &user.about)?,
        );

        if let Some(work_types) = &user.preferred_work_types {
            embedding.insert(
                FEATURE_PREFERRED_WORK_TYPES.to_string(),
                self.encode_tags(FEATURE_PREFERRED_WORK_TYPES, work_types)?,
            );
        }

        if let Some(skills) = &user.skills {
            embedding.insert(
                FEATURE_SKILLS.to_string(),
                self.encode_text(FEATURE_SKILLS, &skills.join(" "))?,
            );
        }

        Ok(embedding)
    }

    /// Embed a batch of jobs. Records are independent; a failing record
    /// is skipped and reported, the rest proceed.
    pub fn embed_jobs(&self, jobs: &[Job]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for job in jobs {
            match self.embed_job(job) {
                Ok(embedding) => outcome.embedded.push((job.job_id, embedding)),
                Err(err) => {
                    warn!(job_id = job.job_id, error = %err, "skipping job in batch embed");
                    outcome.failed.push((job.job_id, err));
                }
            }
        }
        outcome
    }

    pub fn embed_users(&self, users: &[UserProfile]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for user in users {
            match self.embed_user(user) {
                Ok(embedding) => outcome.embedded.push((user.user_id, embedding)),
                Err(err) => {
                    warn!(user_id = user.user_id, error = %err, "skipping user in batch embed");
                    outcome.failed.push((user.user_id, err));
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job {
            job_id: 1,
            title: "Senior Rust Engineer".into(),
            content: "Design and build backend services handling embedding pipelines".into(),
            work_type: Some("FULL_TIME".into()),
        }
    }

    fn sample_user() -> UserProfile {
        UserProfile {
            user_id: 5,
            title: "Rust Engineer".into(),
            about: "Backend engineer building data services in Rust".into(),
            preferred_work_types: Some(vec!["FULL_TIME".into(), "REMOTE".into()]),
            skills: Some(vec!["rust".into(), "postgres".into()]),
            ..UserProfile::default()
        }
    }

    #[test]
    fn rejects_duplicate_feature_assignment() {
        let result = EmbedderConfig::new()
            .assign_text(FEATURE_TITLE, TextEncoder::new(64))
            .and_then(|cfg| {
                cfg.assign_categorical(
                    FEATURE_TITLE,
                    CategoricalEncoder::new(WORK_TYPE_VOCABULARY),
                )
            });

        assert!(matches!(
            result,
            Err(EmbedderConfigError::DuplicateFeature(feature)) if feature == FEATURE_TITLE
        ));
    }

    #[test]
    fn embeds_all_job_features() {
        let embedder = FeatureEmbedder::standard();
        let embedding = embedder.embed_job(&sample_job()).unwrap();

        assert_eq!(embedding.len(), 3);
        assert_eq!(
            embedding[FEATURE_TITLE].len(),
            DEFAULT_TEXT_DIMENSION
        );
        assert_eq!(
            embedding[FEATURE_WORK_TYPE].len(),
            WORK_TYPE_VOCABULARY.len()
        );
    }

    #[test]
    fn absent_optional_features_stay_absent() {
        let embedder = FeatureEmbedder::standard();
        let mut job = sample_job();
        job.work_type = None;

        let embedding = embedder.embed_job(&job).unwrap();
        assert!(!embedding.contains_key(FEATURE_WORK_TYPE));
    }

    #[test]
    fn embeds_user_schema_features() {
        let embedder = FeatureEmbedder::standard();
        let embedding = embedder.embed_user(&sample_user()).unwrap();

        assert!(embedding.contains_key(FEATURE_ABOUT));
        assert!(embedding.contains_key(FEATURE_PREFERRED_WORK_TYPES));
        assert!(embedding.contains_key(FEATURE_SKILLS));
        assert_eq!(
            embedding[FEATURE_PREFERRED_WORK_TYPES].iter().sum::<f32>(),
            2.0
        );
    }

    #[test]
    fn rejects_invalid_record_before_embedding() {
        let embedder = FeatureEmbedder::standard();
        let mut job = sample_job();
        job.content = String::new();

        let err = embedder.embed_job(&job).unwrap_err();
        assert!(matches!(err, EmbedError::InvalidRecord(_)));
    }

    #[test]
    fn unknown_work_type_reports_the_value() {
        let embedder = FeatureEmbedder::standard();
        let mut job = sample_job();
        job.work_type = Some("MOONLIGHTING".into());

        match embedder.embed_job(&job) {
            Err(EmbedError::UnknownCategory { feature, value }) => {
                assert_eq!(feature, FEATURE_WORK_TYPE);
                assert_eq!(value, "MOONLIGHTING");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn batch_embed_skips_failures_and_keeps_the_rest() {
        let embedder = FeatureEmbedder::standard();
        let good = sample_job();
        let mut bad = sample_job();
        bad.job_id = 2;
        bad.title = String::new();

        let outcome = embedder.embed_jobs(&[good, bad]);

        assert_eq!(outcome.embedded.len(), 1);
        assert_eq!(outcome.embedded[0].0, 1);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, 2);
    }

    #[test]
    fn repeated_embedding_is_deterministic() {
        let embedder = FeatureEmbedder::standard();
        let first = embedder.embed_job(&sample_job()).unwrap();
        let second = embedder.embed_job(&sample_job()).unwrap();
        assert_eq!(first, second);
    }
}
