use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_entity::share::{CreateShareLink, ShareLink};

use super::MemoryStore;
use crate::store::ShareStore;

#[async_trait]
impl ShareStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ShareLink>> {
        Ok(self.lock().shares.get(&id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<ShareLink>> {
        Ok(self
            .lock()
            .shares
            .values()
            .find(|l| l.token == token)
            .cloned())
    }

    async fn create(&self, data: &CreateShareLink) -> AppResult<ShareLink> {
        let mut state = self.lock();
        if state.shares.values().any(|l| l.token == data.token) {
            return Err(AppError::conflict("Share token already in use"));
        }
        let link = ShareLink {
            id: Uuid::new_v4(),
            file_id: data.file_id,
            token: data.token.clone(),
            expires_at: data.expires_at,
            password_hash: data.password_hash.clone(),
            max_downloads: data.max_downloads,
            download_count: 0,
            is_active: true,
            created_at: Utc::now(),
        };
        state.shares.insert(link.id, link.clone());
        Ok(link)
    }

    async fn list_for_file(&self, file_id: Uuid) -> AppResult<Vec<ShareLink>> {
        let mut links: Vec<ShareLink> = self
            .lock()
            .shares
            .values()
            .filter(|l| l.file_id == file_id)
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<ShareLink>> {
        let state = self.lock();
        let mut links: Vec<ShareLink> = state
            .shares
            .values()
            .filter(|l| {
                state
                    .files
                    .get(&l.file_id)
                    .is_some_and(|f| f.owner_id == owner_id)
            })
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links)
    }

    async fn try_consume(&self, token: &str) -> AppResult<Option<i32>> {
        let now = Utc::now();
        let mut state = self.lock();
        let Some(link) = state.shares.values_mut().find(|l| l.token == token) else {
            return Ok(None);
        };
        if !link.is_active || link.is_expired_at(now) || link.limit_reached() {
            return Ok(None);
        }
        link.download_count += 1;
        Ok(Some(link.download_count))
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.lock();
        match state.shares.get_mut(&id) {
            Some(link) if link.is_active => {
                link.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_expired(&self) -> AppResult<u64> {
        let now = Utc::now();
        let mut state = self.lock();
        let expired: Vec<Uuid> = state
            .shares
            .values()
            .filter(|l| l.is_expired_at(now))
            .map(|l| l.id)
            .collect();
        for id in &expired {
            state.shares.remove(id);
        }
        state
            .share_accesses
            .retain(|a| !expired.contains(&a.share_link_id));
        Ok(expired.len() as u64)
    }
}
