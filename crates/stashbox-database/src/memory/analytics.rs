use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use stashbox_core::result::AppResult;
use stashbox_entity::analytics::{
    ActionCount, DailyCount, FileStats, NewFileAction, NewShareAccess, NewUserAction, PopularFile,
    ShareStats, StorageStats, UserActionRecord,
};

use super::{FileActionRow, MemoryStore, ShareAccessRow};
use crate::store::AnalyticsStore;

fn daily(days: impl Iterator<Item = NaiveDate>) -> Vec<DailyCount> {
    let mut counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for day in days {
        *counts.entry(day).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(day, count)| DailyCount { day, count })
        .collect()
}

#[async_trait]
impl AnalyticsStore for MemoryStore {
    async fn insert_share_access(&self, event: &NewShareAccess) -> AppResult<()> {
        self.lock().share_accesses.push(ShareAccessRow {
            share_link_id: event.share_link_id,
            ip_address: event.ip_address.clone(),
            accessed_at: Utc::now(),
        });
        Ok(())
    }

    async fn insert_user_action(&self, event: &NewUserAction) -> AppResult<()> {
        let mut state = self.lock();
        state.next_action_id += 1;
        let record = UserActionRecord {
            id: state.next_action_id,
            user_id: event.user_id,
            action_type: event.action_type.as_str().to_string(),
            details: event.details.clone(),
            created_at: Utc::now(),
        };
        state.user_actions.push(record);
        Ok(())
    }

    async fn insert_file_action(&self, event: &NewFileAction) -> AppResult<()> {
        self.lock().file_actions.push(FileActionRow {
            file_id: event.file_id,
            action_type: event.action_type.as_str().to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn upsert_storage_stats(
        &self,
        user_id: Uuid,
        total_files: i64,
        total_size: i64,
    ) -> AppResult<StorageStats> {
        let stats = StorageStats {
            user_id,
            total_files,
            total_size,
            last_updated: Utc::now(),
        };
        self.lock().storage_stats.insert(user_id, stats.clone());
        Ok(stats)
    }

    async fn storage_stats(&self, user_id: Uuid) -> AppResult<Option<StorageStats>> {
        Ok(self.lock().storage_stats.get(&user_id).cloned())
    }

    async fn share_stats(&self, share_link_id: Uuid) -> AppResult<ShareStats> {
        let state = self.lock();
        let rows: Vec<&ShareAccessRow> = state
            .share_accesses
            .iter()
            .filter(|a| a.share_link_id == share_link_id)
            .collect();
        let visitors: HashSet<&str> = rows
            .iter()
            .filter_map(|a| a.ip_address.as_deref())
            .collect();
        Ok(ShareStats {
            total_accesses: rows.len() as i64,
            unique_visitors: visitors.len() as i64,
            first_access: rows.iter().map(|a| a.accessed_at).min(),
            last_access: rows.iter().map(|a| a.accessed_at).max(),
        })
    }

    async fn share_timeline(
        &self,
        share_link_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<DailyCount>> {
        let state = self.lock();
        Ok(daily(
            state
                .share_accesses
                .iter()
                .filter(|a| a.share_link_id == share_link_id && a.accessed_at >= since)
                .map(|a| a.accessed_at.date_naive()),
        ))
    }

    async fn recent_user_actions(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<UserActionRecord>> {
        let state = self.lock();
        Ok(state
            .user_actions
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn action_summary(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<ActionCount>> {
        let state = self.lock();
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for action in state
            .user_actions
            .iter()
            .filter(|a| a.user_id == user_id && a.created_at >= since)
        {
            *counts.entry(action.action_type.as_str()).or_default() += 1;
        }
        let mut summary: Vec<ActionCount> = counts
            .into_iter()
            .map(|(action_type, count)| ActionCount {
                action_type: action_type.to_string(),
                count,
            })
            .collect();
        summary.sort_by(|a, b| b.count.cmp(&a.count).then(a.action_type.cmp(&b.action_type)));
        Ok(summary)
    }

    async fn login_frequency(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<DailyCount>> {
        let state = self.lock();
        Ok(daily(
            state
                .user_actions
                .iter()
                .filter(|a| {
                    a.user_id == user_id && a.action_type == "login" && a.created_at >= since
                })
                .map(|a| a.created_at.date_naive()),
        ))
    }

    async fn popular_files(&self, owner_id: Uuid, limit: i64) -> AppResult<Vec<PopularFile>> {
        let state = self.lock();
        let mut downloads: HashMap<Uuid, i64> = HashMap::new();
        for action in state.file_actions.iter().filter(|a| a.action_type == "download") {
            *downloads.entry(action.file_id).or_default() += 1;
        }
        let mut ranked: Vec<PopularFile> = downloads
            .into_iter()
            .filter_map(|(file_id, count)| {
                state
                    .files
                    .get(&file_id)
                    .filter(|f| f.owner_id == owner_id)
                    .map(|f| PopularFile {
                        file_id,
                        file_name: f.file_name.clone(),
                        size_bytes: f.size_bytes,
                        downloads: count,
                    })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.downloads
                .cmp(&a.downloads)
                .then(a.file_name.cmp(&b.file_name))
        });
        ranked.truncate(limit.max(0) as usize);
        Ok(ranked)
    }

    async fn file_stats(&self, file_id: Uuid) -> AppResult<FileStats> {
        let state = self.lock();
        let rows: Vec<&FileActionRow> = state
            .file_actions
            .iter()
            .filter(|a| a.file_id == file_id)
            .collect();
        let count = |kind: &str| rows.iter().filter(|a| a.action_type == kind).count() as i64;
        Ok(FileStats {
            total_actions: rows.len() as i64,
            downloads: count("download"),
            previews: count("preview"),
            shares: count("share"),
            last_action_at: rows.iter().map(|a| a.created_at).max(),
        })
    }
}
