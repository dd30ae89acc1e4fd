use super::context::AppContext;
use crate::output::Output;
use catalog_sync_config::{default_scheduler_config, SchedulerConfig};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// One maintenance pass: refresh every enabled list, sweep expired virtual
/// lists, then persist.
async fn run_cycle(ctx: &AppContext) {
    let start = Instant::now();
    info!(operation = "scheduled_refresh_start", "Starting scheduled refresh");

    let results = ctx.sync_orchestrator().refresh_all().await;
    let mut written = 0;
    let mut failed = 0;
    for (list_id, result) in &results {
        match result {
            Ok(report) => written += report.written,
            Err(e) => {
                failed += 1;
                error!(operation = "scheduled_refresh_error", list_id = %list_id, error = %e, "List refresh failed");
            }
        }
    }

    let sweep = ctx.virtual_lists().sweep_expired().await;
    if let Err(e) = ctx.persist().await {
        error!(operation = "scheduled_persist_error", error = %e, "Failed to save store snapshot");
    }

    info!(
        operation = "scheduled_refresh_complete",
        lists = results.len(),
        failed,
        written,
        expired_views = sweep.expired,
        duration_ms = start.elapsed().as_millis() as u64,
        "Scheduled refresh complete"
    );
}

pub struct Scheduler {
    ctx: Arc<AppContext>,
    config: SchedulerConfig,
    // Held while a cycle runs so a slow cycle is never overlapped by the next tick
    busy: Arc<Mutex<()>>,
}

impl Scheduler {
    pub fn new(ctx: Arc<AppContext>, config: SchedulerConfig) -> Self {
        Self {
            ctx,
            config,
            busy: Arc::new(Mutex::new(())),
        }
    }

    pub async fn run(self) -> Result<()> {
        if self.config.run_on_startup {
            info!(operation = "scheduler_startup", "Running initial refresh on startup");
            let _guard = self.busy.lock().await;
            run_cycle(&self.ctx).await;
        }

        let mut sched = JobScheduler::new()
            .await
            .map_err(|e| eyre!("Failed to create scheduler: {}", e))?;

        let ctx = Arc::clone(&self.ctx);
        let busy = Arc::clone(&self.busy);
        let job = Job::new_async(self.config.schedule.as_str(), move |_uuid, _lock| {
            let ctx = Arc::clone(&ctx);
            let busy = Arc::clone(&busy);
            Box::pin(async move {
                let Ok(_guard) = busy.try_lock() else {
                    warn!(operation = "scheduled_refresh_skipped", "Previous refresh still running");
                    return;
                };
                run_cycle(&ctx).await;
            })
        })
        .map_err(|e| eyre!("Invalid schedule '{}': {}", self.config.schedule, e))?;

        sched
            .add(job)
            .await
            .map_err(|e| eyre!("Failed to add scheduled job: {}", e))?;
        sched
            .start()
            .await
            .map_err(|e| eyre!("Failed to start scheduler: {}", e))?;

        info!(
            operation = "scheduler_started",
            schedule = %self.config.schedule,
            timezone = %self.config.timezone,
            "Scheduler started"
        );

        tokio::signal::ctrl_c().await?;
        info!(operation = "scheduler_stopping", "Shutting down");
        sched
            .shutdown()
            .await
            .map_err(|e| eyre!("Failed to stop scheduler: {}", e))?;

        let _guard = self.busy.lock().await;
        self.ctx.persist().await
    }
}

pub async fn run_daemon(
    ctx: AppContext,
    schedule_override: Option<String>,
    no_startup_refresh: bool,
    output: &Output,
) -> Result<()> {
    let from_file = ctx
        .config
        .scheduler
        .clone()
        .unwrap_or_else(default_scheduler_config);
    let config = SchedulerConfig {
        schedule: schedule_override.unwrap_or(from_file.schedule),
        timezone: from_file.timezone,
        run_on_startup: from_file.run_on_startup && !no_startup_refresh,
    };
    if config.timezone != "UTC" {
        warn!(timezone = %config.timezone, "Cron schedules are evaluated in UTC");
    }

    output.info(format!(
        "Daemon running with schedule '{}' (logs: {})",
        config.schedule,
        ctx.paths.daemon_log_file().display()
    ));
    Scheduler::new(Arc::new(ctx), config).run().await
}
