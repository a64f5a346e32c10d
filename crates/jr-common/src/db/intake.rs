use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::db::PgPool;
use crate::{Job, UserProfile};

#[derive(Debug, Error)]
pub enum IntakeStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

/// Jobs that have been ingested but not yet embedded. Rows are returned
/// oldest first so a slow worker drains the backlog in arrival order.
#[instrument(skip(pool))]
pub async fn fetch_pending_jobs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<Job>, IntakeStorageError> {
    let client = pool.get().await?;

    let rows = client
        .query(
            "SELECT job_id, title, content, work_type
             FROM jobrec.job_intake
             WHERE embedded_at IS NULL
             ORDER BY received_at
             LIMIT $1",
            &[&limit],
        )
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Job {
            job_id: row.get(0),
            title: row.get(1),
            content: row.get(2),
            work_type: row.get(3),
        })
        .collect())
}

#[instrument(skip(pool))]
pub async fn fetch_pending_users(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<UserProfile>, IntakeStorageError> {
    let client = pool.get().await?;

    let rows = client
        .query(
            "SELECT user_id, title, about, preferred_work_types,
                    experience_level, expected_salary, skills
             FROM jobrec.user_intake
             WHERE embedded_at IS NULL
             ORDER BY received_at
             LIMIT $1",
            &[&limit],
        )
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| UserProfile {
            user_id: row.get(0),
            title: row.get(1),
            about: row.get(2),
            preferred_work_types: row.get(3),
            experience_level: row.get(4),
            expected_salary: row.get(5),
            skills: row.get(6),
        })
        .collect())
}

/// Store or replace an intake row and clear its embedded marker so the
/// worker picks it up on the next sweep.
#[instrument(skip(pool, job), fields(job_id = job.job_id))]
pub async fn upsert_job_intake(pool: &PgPool, job: &Job) -> Result<(), IntakeStorageError> {
    let client = pool.get().await?;

    client
        .execute(
            "INSERT INTO jobrec.job_intake
                (job_id, title, content, work_type, received_at, embedded_at)
             VALUES ($1, $2, $3, $4, NOW(), NULL)
             ON CONFLICT (job_id) DO UPDATE SET
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                work_type = EXCLUDED.work_type,
                received_at = NOW(),
                embedded_at = NULL",
            &[&job.job_id, &job.title, &job.content, &job.work_type],
        )
        .await?;

    Ok(())
}

#[instrument(skip(pool, user), fields(user_id = user.user_id))]
pub async fn upsert_user_intake(
    pool: &PgPool,
    user: &UserProfile,
) -> Result<(), IntakeStorageError> {
    let client = pool.get().await?;

    client
        .execute(
            "INSERT INTO jobrec.user_intake
                (user_id, title, about, preferred_work_types,
                 experience_level, expected_salary, skills, received_at, embedded_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NULL)
             ON CONFLICT (user_id) DO UPDATE SET
                title = EXCLUDED.title,
                about = EXCLUDED.about,
                preferred_work_types = EXCLUDED.preferred_work_types,
                experience_level = EXCLUDED.experience_level,
                expected_salary = EXCLUDED.expected_salary,
                skills = EXCLUDED.skills,
                received_at = NOW(),
                embedded_at = NULL",
            &[
                &user.user_id,
                &user.title,
                &user.about,
                &user.preferred_work_types,
                &user.experience_level,
                &user.expected_salary,
                &user.skills,
            ],
        )
        .await?;

    Ok(())
}

#[instrument(skip(pool, job_ids), fields(id_count = job_ids.len()))]
pub async fn mark_jobs_embedded(
    pool: &PgPool,
    job_ids: &[i64],
) -> Result<u64, IntakeStorageError> {
    if job_ids.is_empty() {
        return Ok(0);
    }

    let client = pool.get().await?;
    let updated = client
        .execute(
            "UPDATE jobrec.job_intake SET embedded_at = NOW() WHERE job_id = ANY($1)",
            &[&job_ids],
        )
        .await?;

    Ok(updated)
}

#[instrument(skip(pool, user_ids), fields(id_count = user_ids.len()))]
pub async fn mark_users_embedded(
    pool: &PgPool,
    user_ids: &[i64],
) -> Result<u64, IntakeStorageError> {
    if user_ids.is_empty() {
        return Ok(0);
    }

    let client = pool.get().await?;
    let updated = client
        .execute(
            "UPDATE jobrec.user_intake SET embedded_at = NOW() WHERE user_id = ANY($1)",
            &[&user_ids],
        )
        .await?;

    Ok(updated)
}
