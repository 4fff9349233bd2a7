//! Folder tree building and path resolution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::error;
use uuid::Uuid;

use stashbox_auth::OwnershipGuard;
use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_database::store::FolderStore;
use stashbox_entity::folder::{Folder, FolderNode, FolderTree};

/// Builds folder trees and resolves breadcrumb paths.
#[derive(Clone)]
pub struct TreeService {
    folders: Arc<dyn FolderStore>,
    guard: OwnershipGuard,
    max_depth: usize,
}

impl std::fmt::Debug for TreeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeService")
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl TreeService {
    /// Creates a new tree service walking at most `max_depth` levels.
    pub fn new(folders: Arc<dyn FolderStore>, guard: OwnershipGuard, max_depth: usize) -> Self {
        Self {
            folders,
            guard,
            max_depth,
        }
    }

    /// The chain of folders from the root down to `folder_id`, inclusive.
    ///
    /// A chain longer than the depth cap, a repeated folder, or a parent
    /// owned by someone else is reported as `CorruptHierarchy`.
    pub async fn path_of(&self, folder_id: Uuid, owner_id: Uuid) -> AppResult<Vec<Folder>> {
        let leaf = self.guard.owned_folder(folder_id, owner_id).await?;
        let mut seen = HashSet::from([leaf.id]);
        let mut next_parent = leaf.parent_id;
        let mut chain = vec![leaf];

        while let Some(parent_id) = next_parent {
            if chain.len() >= self.max_depth || !seen.insert(parent_id) {
                error!(
                    %folder_id,
                    %owner_id,
                    depth = chain.len(),
                    "Folder parent chain is cyclic or too deep"
                );
                return Err(AppError::corrupt_hierarchy(format!(
                    "Folder hierarchy above {folder_id} is corrupt"
                )));
            }
            let parent = self
                .folders
                .find_by_id(parent_id)
                .await?
                .filter(|p| p.owner_id == owner_id)
                .ok_or_else(|| {
                    error!(%folder_id, %parent_id, "Folder parent missing or foreign");
                    AppError::corrupt_hierarchy(format!(
                        "Folder hierarchy above {folder_id} is corrupt"
                    ))
                })?;
            next_parent = parent.parent_id;
            chain.push(parent);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Every folder the user owns, arranged as a forest.
    pub async fn tree_of(&self, owner_id: Uuid) -> AppResult<FolderTree> {
        let folders = self.folders.list_by_owner(owner_id).await?;
        Ok(build_forest(folders, self.max_depth))
    }
}

/// Arrange a flat folder list into a forest with name-sorted children.
///
/// Folders unreachable from a root (only possible in a corrupt hierarchy)
/// are left out.
pub fn build_forest(folders: Vec<Folder>, max_depth: usize) -> FolderTree {
    let mut children: HashMap<Option<Uuid>, Vec<Folder>> = HashMap::new();
    for folder in folders {
        children.entry(folder.parent_id).or_default().push(folder);
    }
    for siblings in children.values_mut() {
        siblings.sort_by_cached_key(|f| f.name.to_lowercase());
    }

    let mut placed = 0;
    let roots = assemble(None, &mut children, 1, max_depth, &mut placed);
    FolderTree {
        roots,
        total_folders: placed,
    }
}

fn assemble(
    parent: Option<Uuid>,
    index: &mut HashMap<Option<Uuid>, Vec<Folder>>,
    depth: usize,
    max_depth: usize,
    placed: &mut u64,
) -> Vec<FolderNode> {
    let Some(siblings) = index.remove(&parent) else {
        return Vec::new();
    };
    if depth > max_depth {
        error!(?parent, depth, "Folder tree exceeds the depth cap, truncating");
        return Vec::new();
    }

    siblings
        .into_iter()
        .map(|folder| {
            *placed += 1;
            FolderNode {
                children: assemble(Some(folder.id), index, depth + 1, max_depth, placed),
                id: folder.id,
                name: folder.name,
                parent_id: folder.parent_id,
            }
        })
        .collect()
}
