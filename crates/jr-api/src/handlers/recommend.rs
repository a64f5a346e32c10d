use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use jr_common::db::{
    fetch_job_feature_column, get_job_embeddings, get_user_embeddings, missing_job_ids,
};
use jr_common::mapping::map_user_to_job_features;
use jr_common::scoring::{
    attach_ids, filter_recommendations, rank_candidates, CandidateMatrix, Weights,
};
use jr_common::JOB_FEATURES;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

const DEFAULT_MAX_RECOMMENDATIONS: usize = 10;

const fn default_max_recommendations() -> usize {
    DEFAULT_MAX_RECOMMENDATIONS
}

#[derive(Debug, Deserialize)]
pub struct JobRecommendRequest {
    pub base_job_id: i64,
    pub job_ids: Vec<i64>,
    #[serde(default)]
    pub weights: Weights,
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UserRecommendRequest {
    pub user_id: i64,
    pub job_ids: Vec<i64>,
    #[serde(default)]
    pub weights: Weights,
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct Recommendation {
    pub job_id: i64,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<Recommendation>,
}

/// Rank a set of cached jobs against one cached base job.
pub async fn recommend_for_job(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<JobRecommendRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let base = get_job_embeddings(&state.pool, request.base_job_id)
        .await?
        .ok_or_else(|| ApiError::MissingEmbeddings {
            message: "base job has no stored embeddings".into(),
            missing_ids: vec![request.base_job_id],
        })?;

    let response = recommend_against_jobs(
        &state,
        base,
        &request.job_ids,
        &request.weights,
        request.max_recommendations,
        request.threshold,
    )
    .await?;

    info!(
        base_job_id = request.base_job_id,
        candidates = request.job_ids.len(),
        returned = response.recommendations.len(),
        "job recommendation served"
    );

    Ok(Json(response))
}

/// Rank a set of cached jobs against one cached user profile. The user
/// embedding is remapped onto the job feature schema before scoring.
pub async fn recommend_for_user(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(request): Json<UserRecommendRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let base = get_user_embeddings(&state.pool, request.user_id)
        .await?
        .ok_or_else(|| ApiError::MissingEmbeddings {
            message: "user has no stored embeddings".into(),
            missing_ids: vec![request.user_id],
        })?;

    let response = recommend_against_jobs(
        &state,
        map_user_to_job_features(base),
        &request.job_ids,
        &request.weights,
        request.max_recommendations,
        request.threshold,
    )
    .await?;

    info!(
        user_id = request.user_id,
        candidates = request.job_ids.len(),
        returned = response.recommendations.len(),
        "user recommendation served"
    );

    Ok(Json(response))
}

async fn recommend_against_jobs(
    state: &SharedState,
    base: jr_common::embedding::EntityEmbedding,
    job_ids: &[i64],
    weights: &Weights,
    max_recommendations: usize,
    threshold: Option<f64>,
) -> Result<RecommendResponse, ApiError> {
    let missing = missing_job_ids(&state.pool, job_ids).await?;
    if !missing.is_empty() {
        return Err(ApiError::MissingEmbeddings {
            message: "candidate jobs have no stored embeddings".into(),
            missing_ids: missing,
        });
    }

    let mut matrix = CandidateMatrix::new();
    for feature in JOB_FEATURES {
        // A feature missing from any stored row carries no signal for
        // this candidate set and is left out of the score.
        if let Some(columns) = fetch_job_feature_column(&state.pool, job_ids, feature).await? {
            matrix.insert(feature.to_string(), columns);
        }
    }

    let ranked = rank_candidates(&base, &matrix, job_ids.len(), weights)?;
    let ranked = attach_ids(job_ids, &ranked);
    let selected = filter_recommendations(&ranked, max_recommendations, threshold);

    let scores: HashMap<i64, f64> = ranked.into_iter().collect();
    let recommendations = selected
        .into_iter()
        .map(|job_id| Recommendation {
            job_id,
            score: scores.get(&job_id).copied().unwrap_or(0.0),
        })
        .collect();

    Ok(RecommendResponse { recommendations })
}
