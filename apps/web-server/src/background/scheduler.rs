//! Cron-style job scheduler using tokio-cron-scheduler.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use posty_infra::InMemoryRateLimiter;
use posty_infra::cache::InMemoryCache;

/// Every minute, on the minute.
pub const SWEEP_SCHEDULE: &str = "0 * * * * *";

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Enable scheduler.
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a new scheduler.
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    /// Add a cron job.
    pub async fn add_cron<F, Fut>(
        &self,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    /// Register the job that drops expired page-cache entries nobody reads
    /// again (the in-memory cache only expires lazily on `get`).
    pub async fn add_cache_sweep(
        &self,
        cache: Arc<InMemoryCache>,
    ) -> Result<uuid::Uuid, JobSchedulerError> {
        self.add_cron(SWEEP_SCHEDULE, move || {
            let cache = cache.clone();
            async move {
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(purged, "Swept expired cache entries");
                }
            }
        })
        .await
    }

    /// Register the job that forgets login-limiter buckets which have
    /// refilled.
    pub async fn add_limiter_sweep(
        &self,
        limiter: Arc<InMemoryRateLimiter>,
    ) -> Result<uuid::Uuid, JobSchedulerError> {
        self.add_cron(SWEEP_SCHEDULE, move || {
            let limiter = limiter.clone();
            async move {
                let purged = limiter.purge_idle();
                if purged > 0 {
                    tracing::debug!(purged, "Swept idle rate limit keys");
                }
            }
        })
        .await
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}
