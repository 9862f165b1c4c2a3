//! Profile store backed by the platform's Postgres `users` table.

use super::{BackendError, ProfileRow, ProfileStore};
use async_trait::async_trait;
use sqlx::{Connection, PgPool, Row, postgres::PgRow};
use std::{future::Future, time::Duration};
use tracing::{Instrument, error, info_span, instrument};
use uuid::Uuid;

const SELECT_PROFILE_SQL: &str = "SELECT id, email, name, role, store_id::text AS store_id, active \
     FROM users WHERE id = $1";

#[derive(Clone, Debug)]
pub struct PgProfileStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgProfileStore {
    #[must_use]
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, future: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, future).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(sqlx::Error::PoolTimedOut)) | Err(_) => Err(BackendError::Timeout),
            Ok(Err(err)) => {
                error!("Profile store query failed: {err}");
                Err(BackendError::Unavailable(err.to_string()))
            }
        }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    #[instrument(skip(self))]
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>, BackendError> {
        let query_span = info_span!("db.query", db.system = "postgresql", db.operation = "SELECT");
        let row = self
            .bounded(
                sqlx::query(SELECT_PROFILE_SQL)
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .instrument(query_span),
            )
            .await?;

        row.map(|row| profile_from_row(&row)).transpose()
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        self.bounded(
            async {
                let mut conn = self.pool.acquire().await?;
                conn.ping().await
            }
            .instrument(ping_span),
        )
        .await
    }
}

fn profile_from_row(row: &PgRow) -> Result<ProfileRow, BackendError> {
    let decode = |err: sqlx::Error| BackendError::Protocol(format!("users row: {err}"));

    Ok(ProfileRow {
        id: row.try_get("id").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        role: row.try_get("role").map_err(decode)?,
        store_id: row.try_get("store_id").map_err(decode)?,
        active: row.try_get("active").map_err(decode)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_store(timeout: Duration) -> anyhow::Result<PgProfileStore> {
        // Port 9 (discard) never speaks Postgres, so every acquire fails fast or stalls.
        let pool = PgPoolOptions::new()
            .acquire_timeout(timeout)
            .connect_lazy("postgres://nobody@127.0.0.1:9/storegate")?;
        Ok(PgProfileStore::new(pool, timeout))
    }

    #[test]
    fn select_reads_store_id_as_text() {
        assert!(SELECT_PROFILE_SQL.contains("store_id::text AS store_id"));
        assert!(SELECT_PROFILE_SQL.contains("WHERE id = $1"));
    }

    #[tokio::test]
    async fn unreachable_database_is_a_backend_error() -> anyhow::Result<()> {
        let store = lazy_store(Duration::from_millis(200))?;
        let result = store.fetch_profile(Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(BackendError::Timeout | BackendError::Unavailable(_))
        ));
        assert!(store.ping().await.is_err());
        Ok(())
    }
}
