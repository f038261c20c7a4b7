//! Aggregate Upsert Protocol: the two-write unit of work that merges an
//! award into the running total and appends the matching ledger entry.
//!
//! The increment is computed server-side, in the same statement that
//! decides insert-vs-update. A read-then-write-back pattern is forbidden
//! here: two overlapping runs would lose one run's award.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::{Observation, PointHistoryEntry, UserAggregate};

/// Store trait for committing awards.
///
/// Abstracts the durable store so the orchestrator can be exercised
/// against an in-memory implementation in tests.
#[async_trait]
pub trait AwardStore: Send + Sync {
    /// Atomically merge one award into the user's running total and append
    /// the matching ledger entry.
    ///
    /// Creates the aggregate row with `points = points_awarded` on first
    /// observation; on conflict adds the award to the stored total and
    /// refreshes `last_seen` and `username`. The history insert happens
    /// unconditionally, exactly once per processed observation. Both
    /// writes commit together; on any failure neither is retained.
    ///
    /// # Errors
    ///
    /// Returns a database error when the transaction cannot commit; the
    /// caller reports the observation as failed and continues the run.
    async fn commit_award(
        &self,
        observation: &Observation,
        points_awarded: i32,
        checked_at: NaiveDateTime,
    ) -> Result<()>;
}

#[async_trait]
impl<T: AwardStore + ?Sized> AwardStore for Arc<T> {
    async fn commit_award(
        &self,
        observation: &Observation,
        points_awarded: i32,
        checked_at: NaiveDateTime,
    ) -> Result<()> {
        (**self)
            .commit_award(observation, points_awarded, checked_at)
            .await
    }
}

/// PostgreSQL-backed implementation of [`AwardStore`] using sqlx.
pub struct PgAwardStore {
    pool: PgPool,
}

impl PgAwardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the running aggregate for a user, if one exists.
    pub async fn find_aggregate(&self, user_id: &str) -> Result<Option<UserAggregate>> {
        let row = sqlx::query_as::<_, UserAggregate>(
            r#"
            SELECT user_id, username, last_seen, points
            FROM user_points
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Fetch a user's ledger entries, oldest first.
    pub async fn history_for_user(&self, user_id: &str) -> Result<Vec<PointHistoryEntry>> {
        let rows = sqlx::query_as::<_, PointHistoryEntry>(
            r#"
            SELECT id, user_id, points_awarded, checked_at
            FROM point_history
            WHERE user_id = $1
            ORDER BY checked_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl AwardStore for PgAwardStore {
    async fn commit_award(
        &self,
        observation: &Observation,
        points_awarded: i32,
        checked_at: NaiveDateTime,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO user_points (user_id, username, last_seen, points)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                username = EXCLUDED.username,
                last_seen = EXCLUDED.last_seen,
                points = user_points.points + EXCLUDED.points,
                updated_at = NOW()
            "#,
        )
        .bind(&observation.user_id)
        .bind(&observation.username)
        .bind(observation.last_seen)
        .bind(points_awarded as i64)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO point_history (user_id, points_awarded, checked_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&observation.user_id)
        .bind(points_awarded)
        .bind(checked_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            user_id = %observation.user_id,
            points_awarded,
            "award committed"
        );

        Ok(())
    }
}
