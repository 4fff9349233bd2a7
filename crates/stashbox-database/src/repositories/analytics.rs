//! Analytics repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use stashbox_core::result::AppResult;
use stashbox_entity::analytics::{
    ActionCount, DailyCount, FileStats, NewFileAction, NewShareAccess, NewUserAction, PopularFile,
    ShareStats, StorageStats, UserActionRecord,
};

use crate::error::db_error;
use crate::store::AnalyticsStore;

/// Postgres analytics repository.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    /// Create a new analytics repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsStore for AnalyticsRepository {
    async fn insert_share_access(&self, event: &NewShareAccess) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO share_analytics (share_link_id, ip_address, user_agent) VALUES ($1, $2, $3)",
        )
        .bind(event.share_link_id)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record share access", e))?;
        Ok(())
    }

    async fn insert_user_action(&self, event: &NewUserAction) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_analytics (user_id, action_type, details) VALUES ($1, $2, $3)",
        )
        .bind(event.user_id)
        .bind(event.action_type.as_str())
        .bind(&event.details)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record user action", e))?;
        Ok(())
    }

    async fn insert_file_action(&self, event: &NewFileAction) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO file_analytics (file_id, action_type, user_id, ip_address) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(event.file_id)
        .bind(event.action_type.as_str())
        .bind(event.user_id)
        .bind(&event.ip_address)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record file action", e))?;
        Ok(())
    }

    async fn upsert_storage_stats(
        &self,
        user_id: Uuid,
        total_files: i64,
        total_size: i64,
    ) -> AppResult<StorageStats> {
        sqlx::query_as::<_, StorageStats>(
            "INSERT INTO storage_stats (user_id, total_files, total_size, last_updated) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET \
               total_files = EXCLUDED.total_files, \
               total_size = EXCLUDED.total_size, \
               last_updated = NOW() \
             RETURNING *",
        )
        .bind(user_id)
        .bind(total_files)
        .bind(total_size)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update storage stats", e))
    }

    async fn storage_stats(&self, user_id: Uuid) -> AppResult<Option<StorageStats>> {
        sqlx::query_as::<_, StorageStats>("SELECT * FROM storage_stats WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load storage stats", e))
    }

    async fn share_stats(&self, share_link_id: Uuid) -> AppResult<ShareStats> {
        sqlx::query_as::<_, ShareStats>(
            "SELECT COUNT(*) AS total_accesses, \
                    COUNT(DISTINCT ip_address) AS unique_visitors, \
                    MIN(accessed_at) AS first_access, \
                    MAX(accessed_at) AS last_access \
             FROM share_analytics WHERE share_link_id = $1",
        )
        .bind(share_link_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load share stats", e))
    }

    async fn share_timeline(
        &self,
        share_link_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<DailyCount>> {
        sqlx::query_as::<_, DailyCount>(
            "SELECT (accessed_at AT TIME ZONE 'UTC')::DATE AS day, COUNT(*) AS count \
             FROM share_analytics WHERE share_link_id = $1 AND accessed_at >= $2 \
             GROUP BY day ORDER BY day ASC",
        )
        .bind(share_link_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load share timeline", e))
    }

    async fn recent_user_actions(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<UserActionRecord>> {
        sqlx::query_as::<_, UserActionRecord>(
            "SELECT * FROM user_analytics WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load user activity", e))
    }

    async fn action_summary(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<ActionCount>> {
        sqlx::query_as::<_, ActionCount>(
            "SELECT action_type, COUNT(*) AS count FROM user_analytics \
             WHERE user_id = $1 AND created_at >= $2 \
             GROUP BY action_type ORDER BY count DESC, action_type ASC",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load action summary", e))
    }

    async fn login_frequency(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<DailyCount>> {
        sqlx::query_as::<_, DailyCount>(
            "SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day, COUNT(*) AS count \
             FROM user_analytics \
             WHERE user_id = $1 AND action_type = 'login' AND created_at >= $2 \
             GROUP BY day ORDER BY day ASC",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load login frequency", e))
    }

    async fn popular_files(&self, owner_id: Uuid, limit: i64) -> AppResult<Vec<PopularFile>> {
        sqlx::query_as::<_, PopularFile>(
            "SELECT f.id AS file_id, f.file_name, f.size_bytes, COUNT(a.id) AS downloads \
             FROM files f \
             INNER JOIN file_analytics a ON a.file_id = f.id AND a.action_type = 'download' \
             WHERE f.owner_id = $1 \
             GROUP BY f.id ORDER BY downloads DESC, f.file_name ASC LIMIT $2",
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load popular files", e))
    }

    async fn file_stats(&self, file_id: Uuid) -> AppResult<FileStats> {
        sqlx::query_as::<_, FileStats>(
            "SELECT COUNT(*) AS total_actions, \
                    COUNT(*) FILTER (WHERE action_type = 'download') AS downloads, \
                    COUNT(*) FILTER (WHERE action_type = 'preview') AS previews, \
                    COUNT(*) FILTER (WHERE action_type = 'share') AS shares, \
                    MAX(created_at) AS last_action_at \
             FROM file_analytics WHERE file_id = $1",
        )
        .bind(file_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load file stats", e))
    }
}
