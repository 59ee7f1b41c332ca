use std::sync::Arc;

use time::OffsetDateTime;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Handler driven by the single wall-clock ticker. Implementations must be
/// idempotent: a tick can repeat after a crash or a missed schedule.
#[async_trait::async_trait]
pub trait TickHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn tick(&self, now: OffsetDateTime) -> anyhow::Result<()>;
}

/// One minutely schedule dispatching to every registered handler; the
/// caller starts and shuts down the returned scheduler.
pub async fn start_ticker(
    handlers: Vec<Arc<dyn TickHandler>>,
) -> Result<JobScheduler, JobSchedulerError> {
    let sched = JobScheduler::new().await?;

    sched
        .add(Job::new_async("0 * * * * *", move |_uuid, _lock| {
            let handlers = handlers.clone();

            Box::pin(async move {
                let now = OffsetDateTime::now_utc();
                for handler in handlers.iter() {
                    if let Err(err) = handler.tick(now).await {
                        tracing::error!(err = %err, handler = handler.name(), "tick handler failed");
                    }
                }
            })
        })?)
        .await?;

    Ok(sched)
}
