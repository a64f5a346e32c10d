pub mod db;
pub mod embedding;
pub mod logging;
pub mod mapping;
pub mod preprocess;
pub mod scoring;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Feature names shared by the embedder, the scorer, and the store.
pub const FEATURE_TITLE: &str = "title";
pub const FEATURE_CONTENT: &str = "content";
pub const FEATURE_WORK_TYPE: &str = "work_type";
pub const FEATURE_ABOUT: &str = "about";
pub const FEATURE_PREFERRED_WORK_TYPES: &str = "preferred_work_types";
pub const FEATURE_SKILLS: &str = "skills";

/// Features a job record carries, in storage column order.
pub const JOB_FEATURES: [&str; 3] = [FEATURE_TITLE, FEATURE_CONTENT, FEATURE_WORK_TYPE];

/// Features a user record carries, in storage column order.
pub const USER_FEATURES: [&str; 4] = [
    FEATURE_TITLE,
    FEATURE_ABOUT,
    FEATURE_PREFERRED_WORK_TYPES,
    FEATURE_SKILLS,
];

/// Work-type tags recognized by the default categorical vocabulary.
pub const WORK_TYPE_VOCABULARY: [&str; 7] = [
    "CONTRACT",
    "FULL_TIME",
    "INTERNSHIP",
    "PART_TIME",
    "REMOTE",
    "TEMPORARY",
    "VOLUNTEER",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be positive")]
    NonPositiveId(&'static str),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// A job posting as submitted for ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub work_type: Option<String>,
}

impl Job {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.job_id <= 0 {
            return Err(ValidationError::NonPositiveId("job_id"));
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyField("content"));
        }
        Ok(())
    }
}

/// A job seeker profile as submitted for ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub title: String,
    pub about: String,
    #[serde(default)]
    pub preferred_work_types: Option<Vec<String>>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub expected_salary: Option<i64>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id <= 0 {
            return Err(ValidationError::NonPositiveId("user_id"));
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if self.about.trim().is_empty() {
            return Err(ValidationError::EmptyField("about"));
        }
        Ok(())
    }
}
