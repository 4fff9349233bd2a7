//! Usage analytics: fire-and-forget sinks and owner-scoped read models.

pub mod recorder;
pub mod service;

pub use recorder::AnalyticsRecorder;
pub use service::{AnalyticsService, ShareReport, StorageUsage, UserDashboard};
