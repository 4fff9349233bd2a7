//! Aggregated analytics rows returned by the read models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Access totals for one share link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct ShareStats {
    /// Total recorded accesses.
    pub total_accesses: i64,
    /// Distinct client IPs.
    pub unique_visitors: i64,
    pub first_access: Option<DateTime<Utc>>,
    pub last_access: Option<DateTime<Utc>>,
}

/// A per-day event count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

/// Count of one action type over a window.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActionCount {
    pub action_type: String,
    pub count: i64,
}

/// A file ranked by download count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PopularFile {
    pub file_id: Uuid,
    pub file_name: String,
    pub size_bytes: i64,
    pub downloads: i64,
}

/// Action totals for one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct FileStats {
    pub total_actions: i64,
    pub downloads: i64,
    pub previews: i64,
    pub shares: i64,
    pub last_action_at: Option<DateTime<Utc>>,
}

/// Overwritable per-user storage snapshot (`storage_stats`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StorageStats {
    pub user_id: Uuid,
    pub total_files: i64,
    pub total_size: i64,
    pub last_updated: DateTime<Utc>,
}
