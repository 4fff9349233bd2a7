//! Expired share link sweep.

use std::time::Instant;

use tracing::{error, info};

use stashbox_core::result::AppResult;
use stashbox_service::ShareService;

/// Deletes share links past their expiry.
///
/// Runs alongside live traffic; a link expiring mid-sweep is simply caught
/// on the next run.
#[derive(Debug, Clone)]
pub struct ShareSweepJob {
    shares: ShareService,
}

impl ShareSweepJob {
    /// Create a sweep over the given share service.
    pub fn new(shares: ShareService) -> Self {
        Self { shares }
    }

    /// Run one sweep and return how many links were removed.
    pub async fn run(&self) -> AppResult<u64> {
        let started = Instant::now();
        match self.shares.sweep_expired().await {
            Ok(removed) => {
                info!(
                    task = "share_sweep",
                    removed,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Share sweep finished"
                );
                Ok(removed)
            }
            Err(e) => {
                error!(task = "share_sweep", error = %e, "Share sweep failed");
                Err(e)
            }
        }
    }
}
