use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "intake tables for jobs and user profiles",
        sql: r#"
CREATE TABLE IF NOT EXISTS jobrec.job_intake (
    job_id BIGINT PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    work_type TEXT,
    received_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    embedded_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS jobrec.user_intake (
    user_id BIGINT PRIMARY KEY,
    title TEXT NOT NULL,
    about TEXT NOT NULL,
    preferred_work_types TEXT[],
    experience_level TEXT,
    expected_salary BIGINT,
    skills TEXT[],
    received_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    embedded_at TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS idx_job_intake_pending
    ON jobrec.job_intake(received_at, job_id)
    WHERE embedded_at IS NULL;
CREATE INDEX IF NOT EXISTS idx_user_intake_pending
    ON jobrec.user_intake(received_at, user_id)
    WHERE embedded_at IS NULL;
"#,
    },
    Migration {
        id: 2,
        description: "embedding store with one BYTEA column per feature",
        sql: r#"
CREATE TABLE IF NOT EXISTS jobrec.job_embeddings (
    job_id BIGINT PRIMARY KEY,
    title BYTEA,
    content BYTEA,
    work_type BYTEA,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS jobrec.user_embeddings (
    user_id BIGINT PRIMARY KEY,
    title BYTEA,
    about BYTEA,
    preferred_work_types BYTEA,
    skills BYTEA,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS jobrec;
             CREATE TABLE IF NOT EXISTS jobrec.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM jobrec.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO jobrec.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
