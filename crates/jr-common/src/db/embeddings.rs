use std::collections::{HashMap, HashSet};

use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::db::PgPool;
use crate::embedding::{EntityEmbedding, FeatureVector};
use crate::{JOB_FEATURES, USER_FEATURES};

#[derive(Debug, Error)]
pub enum EmbeddingStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("unknown feature column: {0}")]
    UnknownFeature(String),
    #[error("stored embedding blob has invalid length {0}")]
    CorruptBlob(usize),
    #[error("ids not present in the embedding store: {0:?}")]
    MissingIds(Vec<i64>),
}

/// Encode a vector as little-endian f32 bytes for a BYTEA column.
pub fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Decode a BYTEA blob back into a vector. The blob length must be a
/// multiple of four bytes or the row is considered corrupt.
pub fn blob_to_vector(blob: &[u8]) -> Result<FeatureVector, EmbeddingStorageError> {
    if blob.len() % 4 != 0 {
        return Err(EmbeddingStorageError::CorruptBlob(blob.len()));
    }

    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn job_feature_column(feature: &str) -> Result<&'static str, EmbeddingStorageError> {
    JOB_FEATURES
        .iter()
        .find(|name| **name == feature)
        .copied()
        .ok_or_else(|| EmbeddingStorageError::UnknownFeature(feature.to_string()))
}

fn feature_blob(embedding: &EntityEmbedding, feature: &str) -> Option<Vec<u8>> {
    embedding.get(feature).map(|vector| vector_to_blob(vector))
}

/// Upsert one job's embeddings. The write is a full replace: every
/// feature column is set from the embedding, with absent features stored
/// as NULL.
#[instrument(skip(pool, embedding))]
pub async fn store_job_embeddings(
    pool: &PgPool,
    job_id: i64,
    embedding: &EntityEmbedding,
) -> Result<(), EmbeddingStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare(
            "INSERT INTO jobrec.job_embeddings (job_id, title, content, work_type, updated_at)
             VALUES ($1, $2, $3, $4, NOW())
             ON CONFLICT (job_id) DO UPDATE SET
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                work_type = EXCLUDED.work_type,
                updated_at = NOW()",
        )
        .await?;

    client
        .execute(
            &stmt,
            &[
                &job_id,
                &feature_blob(embedding, "title"),
                &feature_blob(embedding, "content"),
                &feature_blob(embedding, "work_type"),
            ],
        )
        .await?;

    Ok(())
}

#[instrument(skip(pool, embedding))]
pub async fn store_user_embeddings(
    pool: &PgPool,
    user_id: i64,
    embedding: &EntityEmbedding,
) -> Result<(), EmbeddingStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare(
            "INSERT INTO jobrec.user_embeddings
                (user_id, title, about, preferred_work_types, skills, updated_at)
             VALUES ($1, $2, $3, $4, $5, NOW())
             ON CONFLICT (user_id) DO UPDATE SET
                title = EXCLUDED.title,
                about = EXCLUDED.about,
                preferred_work_types = EXCLUDED.preferred_work_types,
                skills = EXCLUDED.skills,
                updated_at = NOW()",
        )
        .await?;

    client
        .execute(
            &stmt,
            &[
                &user_id,
                &feature_blob(embedding, "title"),
                &feature_blob(embedding, "about"),
                &feature_blob(embedding, "preferred_work_types"),
                &feature_blob(embedding, "skills"),
            ],
        )
        .await?;

    Ok(())
}

fn row_to_embedding(
    row: &tokio_postgres::Row,
    features: &[&str],
) -> Result<EntityEmbedding, EmbeddingStorageError> {
    let mut embedding = EntityEmbedding::new();
    for feature in features {
        if let Some(blob) = row.get::<_, Option<Vec<u8>>>(*feature) {
            embedding.insert((*feature).to_string(), blob_to_vector(&blob)?);
        }
    }
    Ok(embedding)
}

#[instrument(skip(pool))]
pub async fn get_job_embeddings(
    pool: &PgPool,
    job_id: i64,
) -> Result<Option<EntityEmbedding>, EmbeddingStorageError> {
    let client = pool.get().await?;

    let row = client
        .query_opt(
            "SELECT title, content, work_type FROM jobrec.job_embeddings WHERE job_id = $1",
            &[&job_id],
        )
        .await?;

    row.map(|row| row_to_embedding(&row, &JOB_FEATURES)).transpose()
}

#[instrument(skip(pool))]
pub async fn get_user_embeddings(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<EntityEmbedding>, EmbeddingStorageError> {
    let client = pool.get().await?;

    let row = client
        .query_opt(
            "SELECT title, about, preferred_work_types, skills
             FROM jobrec.user_embeddings WHERE user_id = $1",
            &[&user_id],
        )
        .await?;

    row.map(|row| row_to_embedding(&row, &USER_FEATURES)).transpose()
}

/// Fetch one feature's vectors for a batch of job ids, preserving input
/// order. Ids with no stored row at all are reported as
/// `MissingIds`; when every row exists but any lacks this particular
/// feature, the column is unusable for scoring and `Ok(None)` is
/// returned so the feature contributes nothing.
#[instrument(skip(pool, job_ids), fields(id_count = job_ids.len()))]
pub async fn fetch_job_feature_column(
    pool: &PgPool,
    job_ids: &[i64],
    feature: &str,
) -> Result<Option<Vec<FeatureVector>>, EmbeddingStorageError> {
    if job_ids.is_empty() {
        return Ok(Some(Vec::new()));
    }

    let column = job_feature_column(feature)?;
    let client = pool.get().await?;

    let query = format!(
        "SELECT job_id, {column} FROM jobrec.job_embeddings WHERE job_id = ANY($1)"
    );
    let rows = client.query(query.as_str(), &[&job_ids]).await?;

    let mut by_id: HashMap<i64, Option<Vec<u8>>> = HashMap::with_capacity(rows.len());
    for row in rows {
        by_id.insert(row.get(0), row.get(1));
    }

    let missing: Vec<i64> = job_ids
        .iter()
        .filter(|id| !by_id.contains_key(*id))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(EmbeddingStorageError::MissingIds(missing));
    }

    let mut column_vectors = Vec::with_capacity(job_ids.len());
    for id in job_ids {
        match by_id.get(id).and_then(|blob| blob.as_deref()) {
            Some(blob) => column_vectors.push(blob_to_vector(blob)?),
            None => return Ok(None),
        }
    }

    Ok(Some(column_vectors))
}

#[instrument(skip(pool, job_ids), fields(id_count = job_ids.len()))]
pub async fn missing_job_ids(
    pool: &PgPool,
    job_ids: &[i64],
) -> Result<Vec<i64>, EmbeddingStorageError> {
    missing_ids(pool, job_ids, "SELECT job_id FROM jobrec.job_embeddings WHERE job_id = ANY($1)")
        .await
}

#[instrument(skip(pool, user_ids), fields(id_count = user_ids.len()))]
pub async fn missing_user_ids(
    pool: &PgPool,
    user_ids: &[i64],
) -> Result<Vec<i64>, EmbeddingStorageError> {
    missing_ids(
        pool,
        user_ids,
        "SELECT user_id FROM jobrec.user_embeddings WHERE user_id = ANY($1)",
    )
    .await
}

async fn missing_ids(
    pool: &PgPool,
    ids: &[i64],
    query: &str,
) -> Result<Vec<i64>, EmbeddingStorageError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let client = pool.get().await?;
    let rows = client.query(query, &[&ids]).await?;

    let existing: HashSet<i64> = rows.into_iter().map(|row| row.get(0)).collect();

    Ok(absent_ids(ids, &existing))
}

/// Requested ids not present in the store, in request order.
fn absent_ids(requested: &[i64], existing: &HashSet<i64>) -> Vec<i64> {
    requested
        .iter()
        .filter(|id| !existing.contains(*id))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::FeatureEmbedder;
    use crate::Job;

    #[test]
    fn blob_codec_round_trips_exactly() {
        let vector = vec![0.0f32, -1.5, 3.25, f32::MAX, f32::MIN_POSITIVE];
        let blob = vector_to_blob(&vector);
        assert_eq!(blob.len(), vector.len() * 4);
        assert_eq!(blob_to_vector(&blob).unwrap(), vector);
    }

    #[test]
    fn empty_vector_round_trips() {
        let blob = vector_to_blob(&[]);
        assert!(blob.is_empty());
        assert!(blob_to_vector(&blob).unwrap().is_empty());
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        let err = blob_to_vector(&[0u8, 1, 2]).unwrap_err();
        assert!(matches!(err, EmbeddingStorageError::CorruptBlob(3)));
    }

    #[test]
    fn absent_ids_returns_only_unstored_ids_in_request_order() {
        let existing: HashSet<i64> = [1, 3].into_iter().collect();
        assert_eq!(absent_ids(&[1, 2, 3], &existing), vec![2]);
        assert_eq!(absent_ids(&[3, 1], &existing), Vec::<i64>::new());
        assert_eq!(absent_ids(&[9, 2], &existing), vec![9, 2]);
    }

    #[test]
    fn re_embedding_a_record_reads_back_identically() {
        let embedder = FeatureEmbedder::standard();
        let job = Job {
            job_id: 11,
            title: "Platform engineer".into(),
            content: "Operate the ingestion pipeline".into(),
            work_type: Some("REMOTE".into()),
        };

        let first = embedder.embed_job(&job).unwrap();
        let second = embedder.embed_job(&job).unwrap();

        // A full replacement write of the second embedding reads back the
        // same vectors the first write produced.
        assert_eq!(first.len(), second.len());
        for (feature, vector) in &second {
            let stored = blob_to_vector(&vector_to_blob(vector)).unwrap();
            assert_eq!(&stored, &first[feature]);
        }
    }

    #[test]
    fn only_job_schema_features_resolve_to_columns() {
        assert_eq!(job_feature_column("title").unwrap(), "title");
        assert_eq!(job_feature_column("work_type").unwrap(), "work_type");
        assert!(matches!(
            job_feature_column("about"),
            Err(EmbeddingStorageError::UnknownFeature(_))
        ));
        assert!(matches!(
            job_feature_column("job_id; DROP TABLE jobrec.job_embeddings"),
            Err(EmbeddingStorageError::UnknownFeature(_))
        ));
    }
}
