use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::{info, warn};

use jr_common::db::{
    mark_jobs_embedded, mark_users_embedded, store_job_embeddings, store_user_embeddings,
    upsert_job_intake, upsert_user_intake, PgPool,
};
use jr_common::embedding::{EmbedError, EntityEmbedding};
use jr_common::{Job, UserProfile};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct StoredResponse {
    pub id: i64,
    pub features: usize,
}

#[derive(Debug, Serialize)]
pub struct RejectedRecord {
    pub id: i64,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub stored: Vec<i64>,
    pub failed: Vec<RejectedRecord>,
}

/// Ingest one job: the raw record lands in the intake table, is embedded
/// inline, and the intake row is stamped so the background sweep skips it.
pub async fn store_job(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(job): Json<Job>,
) -> Result<(StatusCode, Json<StoredResponse>), ApiError> {
    let embedding = state.embedder.embed_job(&job)?;
    let features = embedding.len();

    upsert_job_intake(&state.pool, &job).await?;
    store_job_embeddings(&state.pool, job.job_id, &embedding).await?;
    mark_jobs_embedded(&state.pool, &[job.job_id]).await?;

    info!(job_id = job.job_id, features, "job embedded and stored");

    Ok((
        StatusCode::CREATED,
        Json(StoredResponse {
            id: job.job_id,
            features,
        }),
    ))
}

pub async fn store_user(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(user): Json<UserProfile>,
) -> Result<(StatusCode, Json<StoredResponse>), ApiError> {
    let embedding = state.embedder.embed_user(&user)?;
    let features = embedding.len();

    upsert_user_intake(&state.pool, &user).await?;
    store_user_embeddings(&state.pool, user.user_id, &embedding).await?;
    mark_users_embedded(&state.pool, &[user.user_id]).await?;

    info!(user_id = user.user_id, features, "user embedded and stored");

    Ok((
        StatusCode::CREATED,
        Json(StoredResponse {
            id: user.user_id,
            features,
        }),
    ))
}

/// Batch ingestion with per-record failure semantics: a record that fails
/// to embed or to persist is reported back, the rest are stored.
pub async fn store_jobs_batch(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(jobs): Json<Vec<Job>>,
) -> Result<Json<BatchResponse>, ApiError> {
    let outcome = state.embedder.embed_jobs(&jobs);
    let by_id: HashMap<i64, &Job> = jobs.iter().map(|job| (job.job_id, job)).collect();

    let mut stored = Vec::with_capacity(outcome.embedded.len());
    let mut storage_failed = Vec::new();
    for (job_id, embedding) in &outcome.embedded {
        match persist_job(&state.pool, by_id.get(job_id).copied(), *job_id, embedding).await {
            Ok(()) => stored.push(*job_id),
            Err(reason) => {
                warn!(job_id, reason = %reason, "failed to persist job from batch");
                storage_failed.push((*job_id, reason));
            }
        }
    }
    mark_jobs_embedded(&state.pool, &stored).await?;

    info!(
        stored = stored.len(),
        failed = outcome.failed.len() + storage_failed.len(),
        "job batch ingested"
    );

    Ok(Json(BatchResponse {
        stored,
        failed: merge_failures(outcome.failed, storage_failed),
    }))
}

pub async fn store_users_batch(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Json(users): Json<Vec<UserProfile>>,
) -> Result<Json<BatchResponse>, ApiError> {
    let outcome = state.embedder.embed_users(&users);
    let by_id: HashMap<i64, &UserProfile> =
        users.iter().map(|user| (user.user_id, user)).collect();

    let mut stored = Vec::with_capacity(outcome.embedded.len());
    let mut storage_failed = Vec::new();
    for (user_id, embedding) in &outcome.embedded {
        match persist_user(&state.pool, by_id.get(user_id).copied(), *user_id, embedding).await {
            Ok(()) => stored.push(*user_id),
            Err(reason) => {
                warn!(user_id, reason = %reason, "failed to persist user from batch");
                storage_failed.push((*user_id, reason));
            }
        }
    }
    mark_users_embedded(&state.pool, &stored).await?;

    info!(
        stored = stored.len(),
        failed = outcome.failed.len() + storage_failed.len(),
        "user batch ingested"
    );

    Ok(Json(BatchResponse {
        stored,
        failed: merge_failures(outcome.failed, storage_failed),
    }))
}

async fn persist_job(
    pool: &PgPool,
    job: Option<&Job>,
    job_id: i64,
    embedding: &EntityEmbedding,
) -> Result<(), String> {
    if let Some(job) = job {
        upsert_job_intake(pool, job)
            .await
            .map_err(|err| err.to_string())?;
    }
    store_job_embeddings(pool, job_id, embedding)
        .await
        .map_err(|err| err.to_string())
}

async fn persist_user(
    pool: &PgPool,
    user: Option<&UserProfile>,
    user_id: i64,
    embedding: &EntityEmbedding,
) -> Result<(), String> {
    if let Some(user) = user {
        upsert_user_intake(pool, user)
            .await
            .map_err(|err| err.to_string())?;
    }
    store_user_embeddings(pool, user_id, embedding)
        .await
        .map_err(|err| err.to_string())
}

/// Embedding failures and persistence failures land in the same rejected
/// list so a batch response accounts for every record that did not store.
fn merge_failures(
    embed_failed: Vec<(i64, EmbedError)>,
    storage_failed: Vec<(i64, String)>,
) -> Vec<RejectedRecord> {
    embed_failed
        .into_iter()
        .map(|(id, err)| RejectedRecord {
            id,
            reason: err.to_string(),
        })
        .chain(
            storage_failed
                .into_iter()
                .map(|(id, reason)| RejectedRecord { id, reason }),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jr_common::ValidationError;

    #[test]
    fn merge_failures_reports_storage_errors_alongside_embedding_errors() {
        let embed_failed = vec![(
            2,
            EmbedError::InvalidRecord(ValidationError::EmptyField("title")),
        )];
        let storage_failed = vec![(7, "connection reset".to_string())];

        let failed = merge_failures(embed_failed, storage_failed);

        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].id, 2);
        assert!(failed[0].reason.contains("title"));
        assert_eq!(failed[1].id, 7);
        assert_eq!(failed[1].reason, "connection reset");
    }

    #[test]
    fn merge_failures_is_empty_for_a_clean_batch() {
        assert!(merge_failures(Vec::new(), Vec::new()).is_empty());
    }
}
