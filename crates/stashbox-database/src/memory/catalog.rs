use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_entity::file::{CreateFile, File};
use stashbox_entity::folder::{CreateFolder, Folder, ReparentSummary};

use super::MemoryStore;
use crate::error::reparent_conflict;
use crate::store::{FileStore, FolderStore};

fn name_conflict() -> AppError {
    AppError::conflict("A folder with this name already exists here")
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        Ok(self.lock().folders.get(&id).cloned())
    }

    async fn find_by_name(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        let lowered = name.to_lowercase();
        Ok(self
            .lock()
            .folders
            .values()
            .find(|f| {
                f.owner_id == owner_id
                    && f.parent_id == parent_id
                    && f.name.to_lowercase() == lowered
            })
            .cloned())
    }

    async fn list_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<Folder>> {
        let mut children: Vec<Folder> = self
            .lock()
            .folders
            .values()
            .filter(|f| f.owner_id == owner_id && f.parent_id == parent_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        let mut folders: Vec<Folder> = self
            .lock()
            .folders
            .values()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        let mut state = self.lock();
        if state.folder_name_taken(data.owner_id, data.parent_id, &data.name, &[]) {
            return Err(name_conflict());
        }
        let now = Utc::now();
        let folder = Folder {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            parent_id: data.parent_id,
            name: data.name.clone(),
            created_at: now,
            updated_at: now,
        };
        state.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn rename(&self, id: Uuid, name: &str) -> AppResult<Option<Folder>> {
        let mut state = self.lock();
        let Some((owner_id, parent_id)) = state.folders.get(&id).map(|f| (f.owner_id, f.parent_id))
        else {
            return Ok(None);
        };
        if state.folder_name_taken(owner_id, parent_id, name, &[id]) {
            return Err(name_conflict());
        }
        Ok(state.folders.get_mut(&id).map(|folder| {
            folder.name = name.to_string();
            folder.updated_at = Utc::now();
            folder.clone()
        }))
    }

    async fn set_parent(&self, id: Uuid, parent_id: Option<Uuid>) -> AppResult<Option<Folder>> {
        let mut state = self.lock();
        let Some((owner_id, name)) = state.folders.get(&id).map(|f| (f.owner_id, f.name.clone()))
        else {
            return Ok(None);
        };
        if state.folder_name_taken(owner_id, parent_id, &name, &[id]) {
            return Err(name_conflict());
        }
        Ok(state.folders.get_mut(&id).map(|folder| {
            folder.parent_id = parent_id;
            folder.updated_at = Utc::now();
            folder.clone()
        }))
    }

    async fn delete_and_reparent(&self, id: Uuid) -> AppResult<Option<ReparentSummary>> {
        let mut state = self.lock();
        let Some(owner_id) = state.folders.get(&id).map(|f| f.owner_id) else {
            return Ok(None);
        };

        let children: Vec<(Uuid, String)> = state
            .folders
            .values()
            .filter(|f| f.parent_id == Some(id))
            .map(|f| (f.id, f.name.clone()))
            .collect();

        // Checked before any mutation so a conflict leaves the state untouched.
        for (_, name) in &children {
            if state.folder_name_taken(owner_id, None, name, &[id]) {
                return Err(reparent_conflict(name));
            }
        }

        let now = Utc::now();
        let mut files_reparented = 0;
        for file in state.files.values_mut() {
            if file.folder_id == Some(id) {
                file.folder_id = None;
                file.updated_at = now;
                files_reparented += 1;
            }
        }
        for (child_id, _) in &children {
            if let Some(child) = state.folders.get_mut(child_id) {
                child.parent_id = None;
                child.updated_at = now;
            }
        }
        state.folders.remove(&id);

        Ok(Some(ReparentSummary {
            folder_id: id,
            files_reparented,
            folders_reparented: children.len() as u64,
        }))
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        Ok(self.lock().files.get(&id).cloned())
    }

    async fn list_in_folder(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> AppResult<Vec<File>> {
        let mut files: Vec<File> = self
            .lock()
            .files
            .values()
            .filter(|f| f.owner_id == owner_id && f.folder_id == folder_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        let mut files: Vec<File> = self
            .lock()
            .files
            .values()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    async fn create(&self, data: &CreateFile) -> AppResult<File> {
        let now = Utc::now();
        let file = File {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            folder_id: data.folder_id,
            file_name: data.file_name.clone(),
            size_bytes: data.size_bytes,
            mime_type: data.mime_type.clone(),
            storage_backend: data.location.backend(),
            storage_key: data.location.key().to_string(),
            storage_url: data.storage_url.clone(),
            is_public: data.is_public,
            created_at: now,
            updated_at: now,
        };
        self.lock().files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn rename(&self, id: Uuid, file_name: &str) -> AppResult<Option<File>> {
        Ok(self.lock().files.get_mut(&id).map(|file| {
            file.file_name = file_name.to_string();
            file.updated_at = Utc::now();
            file.clone()
        }))
    }

    async fn set_public(&self, id: Uuid, is_public: bool) -> AppResult<Option<File>> {
        Ok(self.lock().files.get_mut(&id).map(|file| {
            file.is_public = is_public;
            file.updated_at = Utc::now();
            file.clone()
        }))
    }

    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<Option<File>> {
        Ok(self.lock().files.get_mut(&id).map(|file| {
            file.folder_id = folder_id;
            file.updated_at = Utc::now();
            file.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<File>> {
        let mut state = self.lock();
        let removed = state.files.remove(&id);
        if removed.is_some() {
            state.shares.retain(|_, link| link.file_id != id);
            state.file_actions.retain(|a| a.file_id != id);
        }
        Ok(removed)
    }

    async fn usage(&self, owner_id: Uuid) -> AppResult<(i64, i64)> {
        let state = self.lock();
        let owned = state.files.values().filter(|f| f.owner_id == owner_id);
        let (count, size) = owned.fold((0i64, 0i64), |(c, s), f| (c + 1, s + f.size_bytes));
        Ok((count, size))
    }
}
