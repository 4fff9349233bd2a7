//! Usage analytics entities: append-only events and read-model rows.

pub mod action;
pub mod event;
pub mod report;

pub use action::{FileActionType, UserActionType};
pub use event::{NewFileAction, NewShareAccess, NewUserAction, UserActionRecord};
pub use report::{
    ActionCount, DailyCount, FileStats, PopularFile, ShareStats, StorageStats,
};
