//! Analytics read models.
//!
//! Share and file statistics are only disclosed to the owner.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use stashbox_auth::OwnershipGuard;
use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_database::store::{AnalyticsStore, FileStore, Stores};
use stashbox_entity::ResourceKind;
use stashbox_entity::analytics::{
    ActionCount, DailyCount, FileStats, PopularFile, ShareStats, UserActionRecord,
};
use stashbox_entity::file::format_file_size;
use stashbox_entity::share::ShareLink;

/// Default window of the share access timeline.
const DEFAULT_TIMELINE_DAYS: i64 = 7;
/// Longest timeline a caller may ask for.
const MAX_TIMELINE_DAYS: i64 = 365;
/// Window of the dashboard summaries.
const DASHBOARD_WINDOW_DAYS: i64 = 30;
const RECENT_ACTIVITY_LIMIT: i64 = 20;
const POPULAR_FILES_LIMIT: i64 = 10;

/// Statistics for one share link.
#[derive(Debug, Clone, Serialize)]
pub struct ShareReport {
    pub share_id: Uuid,
    pub token: String,
    pub file_name: String,
    pub download_count: i32,
    pub stats: ShareStats,
}

/// The user's activity dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct UserDashboard {
    /// Most recent actions, newest first.
    pub recent_activity: Vec<UserActionRecord>,
    /// Action counts over the last 30 days.
    pub action_summary: Vec<ActionCount>,
    /// Logins per day over the last 30 days.
    pub login_frequency: Vec<DailyCount>,
    /// Top files by downloads.
    pub popular_files: Vec<PopularFile>,
}

/// Storage usage against the display quota.
#[derive(Debug, Clone, Serialize)]
pub struct StorageUsage {
    pub total_files: i64,
    pub total_size: i64,
    pub formatted_size: String,
    pub quota_bytes: u64,
    pub formatted_quota: String,
    /// Share of the quota in use, 0 to 100, one decimal.
    pub usage_percent: f64,
    pub last_updated: DateTime<Utc>,
}

/// Read-side analytics queries.
#[derive(Clone)]
pub struct AnalyticsService {
    analytics: Arc<dyn AnalyticsStore>,
    files: Arc<dyn FileStore>,
    guard: OwnershipGuard,
    quota_bytes: u64,
}

impl std::fmt::Debug for AnalyticsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsService")
            .field("quota_bytes", &self.quota_bytes)
            .finish()
    }
}

impl AnalyticsService {
    /// Creates a new analytics service.
    pub fn new(stores: &Stores, guard: OwnershipGuard, quota_bytes: u64) -> Self {
        Self {
            analytics: stores.analytics.clone(),
            files: stores.files.clone(),
            guard,
            quota_bytes,
        }
    }

    /// Access totals for a share link the user owns.
    pub async fn share_stats(&self, share_id: Uuid, user_id: Uuid) -> AppResult<ShareReport> {
        let (link, file) = self.guard.owned_share(share_id, user_id).await?;
        let stats = self.analytics.share_stats(link.id).await?;
        Ok(report(link, file.file_name, stats))
    }

    /// Per-day accesses over the last `days` days (default 7).
    pub async fn share_timeline(
        &self,
        share_id: Uuid,
        user_id: Uuid,
        days: Option<i64>,
    ) -> AppResult<Vec<DailyCount>> {
        let days = days.unwrap_or(DEFAULT_TIMELINE_DAYS);
        if !(1..=MAX_TIMELINE_DAYS).contains(&days) {
            return Err(AppError::validation(format!(
                "days must be between 1 and {MAX_TIMELINE_DAYS}"
            )));
        }
        self.guard
            .assert_owns(ResourceKind::ShareLink, share_id, user_id)
            .await?;
        self.analytics
            .share_timeline(share_id, Utc::now() - Duration::days(days))
            .await
    }

    /// Counts for a file the user owns.
    pub async fn file_stats(&self, file_id: Uuid, user_id: Uuid) -> AppResult<FileStats> {
        self.guard
            .assert_owns(ResourceKind::File, file_id, user_id)
            .await?;
        self.analytics.file_stats(file_id).await
    }

    /// Activity, summaries and popular files for the user.
    pub async fn dashboard(&self, user_id: Uuid) -> AppResult<UserDashboard> {
        let since = Utc::now() - Duration::days(DASHBOARD_WINDOW_DAYS);
        let (recent_activity, action_summary, login_frequency, popular_files) = futures::try_join!(
            self.analytics
                .recent_user_actions(user_id, RECENT_ACTIVITY_LIMIT),
            self.analytics.action_summary(user_id, since),
            self.analytics.login_frequency(user_id, since),
            self.analytics.popular_files(user_id, POPULAR_FILES_LIMIT),
        )?;

        Ok(UserDashboard {
            recent_activity,
            action_summary,
            login_frequency,
            popular_files,
        })
    }

    /// Current usage, computed from the catalog when no snapshot exists yet.
    pub async fn storage_usage(&self, user_id: Uuid) -> AppResult<StorageUsage> {
        let stats = match self.analytics.storage_stats(user_id).await? {
            Some(stats) => stats,
            None => {
                let (count, size) = self.files.usage(user_id).await?;
                self.analytics
                    .upsert_storage_stats(user_id, count, size)
                    .await?
            }
        };

        let size = stats.total_size.max(0) as u64;
        Ok(StorageUsage {
            total_files: stats.total_files,
            total_size: stats.total_size,
            formatted_size: format_file_size(size),
            quota_bytes: self.quota_bytes,
            formatted_quota: format_file_size(self.quota_bytes),
            usage_percent: usage_percent(size, self.quota_bytes),
            last_updated: stats.last_updated,
        })
    }
}

fn report(link: ShareLink, file_name: String, stats: ShareStats) -> ShareReport {
    ShareReport {
        share_id: link.id,
        token: link.token,
        file_name,
        download_count: link.download_count,
        stats,
    }
}

fn usage_percent(used: u64, quota: u64) -> f64 {
    if quota == 0 {
        return 0.0;
    }
    let percent = (used as f64 / quota as f64 * 100.0).min(100.0);
    (percent * 10.0).round() / 10.0
}
