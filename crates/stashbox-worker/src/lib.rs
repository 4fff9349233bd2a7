//! Scheduled maintenance for Stashbox.
//!
//! This crate provides:
//! - A cron scheduler that owns the periodic tasks
//! - The tasks themselves, each a thin wrapper over a service call

pub mod jobs;
pub mod scheduler;

pub use jobs::ShareSweepJob;
pub use scheduler::CronScheduler;
