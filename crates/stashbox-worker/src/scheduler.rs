//! Cron scheduler for periodic maintenance tasks.

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, info};

use stashbox_core::config::WorkerConfig;
use stashbox_core::error::AppError;

use crate::jobs::ShareSweepJob;

/// Cron-based scheduler for periodic background tasks.
pub struct CronScheduler {
    scheduler: JobScheduler,
    config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("config", &self.config)
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler, config })
    }

    /// Register the expired share sweep on `worker.share_sweep_cron`.
    pub async fn register_share_sweep(&self, sweep: ShareSweepJob) -> Result<(), AppError> {
        let schedule = self.config.share_sweep_cron.clone();
        let job = CronJob::new_async(schedule.as_str(), move |_uuid, _lock| {
            let sweep = sweep.clone();
            Box::pin(async move {
                debug!("Running scheduled share sweep");
                // Failures are logged inside the job; the next tick retries.
                let _ = sweep.run().await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid share sweep schedule '{schedule}': {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add share sweep schedule: {e}")))?;

        info!(schedule = %schedule, "Registered: share_sweep");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!("Cron scheduler started");
        Ok(())
    }

    /// Shut the scheduler down.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Cron scheduler shut down");
        Ok(())
    }
}
