//! Postgres access layer: pooling, migrations, the embedding store,
//! and the intake tables the background worker drains.

pub mod embeddings;
pub mod intake;
pub mod migrations;
pub mod pool;

pub use embeddings::{
    fetch_job_feature_column, get_job_embeddings, get_user_embeddings, missing_job_ids,
    missing_user_ids, store_job_embeddings, store_user_embeddings, EmbeddingStorageError,
};
pub use intake::{
    fetch_pending_jobs, fetch_pending_users, mark_jobs_embedded, mark_users_embedded,
    upsert_job_intake, upsert_user_intake, IntakeStorageError,
};
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, create_pool_from_url_checked, DbPoolError, PgPool};
