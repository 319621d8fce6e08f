use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::bot::AppState;
use crate::session::BotStats;

const DAILY_STATS_JOB: &str = "daily_stats";

/// Background analytics jobs for the bot
pub struct Scheduler {
    inner: JobScheduler,
    jobs: usize,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self { inner, jobs: 0 })
    }

    /// Schedule every job the configuration enables.
    /// Returns how many jobs are now registered.
    pub async fn register_builtin(&mut self, state: Arc<AppState>) -> Result<usize> {
        let config = &state.config;
        if config.features.analytics && config.analytics.daily_stats {
            let cron = config.analytics.daily_stats_cron.clone();
            self.add_daily_stats(&cron, state).await?;
        } else {
            info!("Daily stats disabled");
        }
        Ok(self.jobs)
    }

    /// Log the session aggregate on every tick of `cron_expr`.
    pub async fn add_daily_stats(&mut self, cron_expr: &str, state: Arc<AppState>) -> Result<()> {
        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = state.clone();
            Box::pin(async move {
                let stats = state.sessions.lock().await.aggregate_now();
                info!("Daily stats: {}", stats_line(&stats));
            })
        })
        .with_context(|| format!("Invalid cron expression for {DAILY_STATS_JOB}: {cron_expr}"))?;

        self.inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job: {DAILY_STATS_JOB}"))?;
        self.jobs += 1;

        info!("Scheduled task '{}' with cron: {}", DAILY_STATS_JOB, cron_expr);
        Ok(())
    }

    pub fn is_idle(&self) -> bool {
        self.jobs == 0
    }

    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}

fn stats_line(stats: &BotStats) -> String {
    format!(
        "users={} interactions={} average={:.2} joined_today={}",
        stats.total_users, stats.total_interactions, stats.average_interactions, stats.active_today
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn state(extra: &str) -> Arc<AppState> {
        let toml = format!(
            "[telegram]\nbot_token = \"t\"\nadmin_ids = [1]\n{}",
            extra
        );
        Arc::new(AppState::new(Config::from_toml_str(&toml).unwrap()))
    }

    #[tokio::test]
    async fn test_daily_stats_registered_by_default() {
        let mut scheduler = Scheduler::new().await.unwrap();
        let added = scheduler.register_builtin(state("")).await.unwrap();
        assert_eq!(added, 1);
        assert!(!scheduler.is_idle());
    }

    #[tokio::test]
    async fn test_daily_stats_skipped_without_analytics() {
        let mut scheduler = Scheduler::new().await.unwrap();
        let added = scheduler
            .register_builtin(state("[features]\nanalytics = false\n"))
            .await
            .unwrap();
        assert_eq!(added, 0);
        assert!(scheduler.is_idle());
    }

    #[tokio::test]
    async fn test_invalid_cron_is_an_error() {
        let mut scheduler = Scheduler::new().await.unwrap();
        let result = scheduler
            .register_builtin(state("[analytics]\ndaily_stats_cron = \"not a cron\"\n"))
            .await;
        assert!(result.is_err());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_stats_line() {
        let stats = BotStats {
            total_users: 3,
            total_interactions: 10,
            average_interactions: 3.33,
            active_today: 1,
        };
        assert_eq!(
            stats_line(&stats),
            "users=3 interactions=10 average=3.33 joined_today=1"
        );
    }
}
