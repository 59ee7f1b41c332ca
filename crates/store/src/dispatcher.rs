use std::sync::Arc;
use std::time::Duration;

use foodcourtio_db::table::OutboxCursor;
use foodcourtio_shared::event::PublishedEvent;
use foodcourtio_shared::{Result, new_id, now_unix};
use sea_query::{Expr, ExprTrait, OnConflict, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::SqlitePool;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{acquire_lease, outbox};

const DISPATCHER_LEASE: &str = "outbox_dispatcher";
const BATCH_SIZE: u64 = 100;

/// Outbox consumer. Delivery is at-least-once: the cursor only advances
/// after `handle` returns `Ok`, so implementations must be idempotent
/// keyed on `event.id`.
#[async_trait::async_trait]
pub trait Subscriber: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &PublishedEvent) -> anyhow::Result<()>;
}

/// Polls the outbox in commit order and fans events out to subscribers.
/// A heartbeat lease keeps at most one dispatcher active across replicas.
pub struct Dispatcher {
    read_db: SqlitePool,
    write_db: SqlitePool,
    subscribers: Vec<Arc<dyn Subscriber>>,
    poll_interval: Duration,
    lease_ttl: Duration,
    holder: String,
}

impl Dispatcher {
    pub fn new(read_db: SqlitePool, write_db: SqlitePool) -> Self {
        Self {
            read_db,
            write_db,
            subscribers: Vec::new(),
            poll_interval: Duration::from_millis(500),
            lease_ttl: Duration::from_secs(30),
            holder: new_id(),
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn subscribe(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn spawn(self) -> DispatcherHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));

        DispatcherHandle {
            shutdown: shutdown_tx,
            join,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(holder = %self.holder, "outbox dispatcher started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => break,

                _ = tokio::time::sleep(self.poll_interval) => {
                    if let Err(err) = self.poll_once().await {
                        tracing::error!(err = %err, "outbox poll failed");
                    }
                }
            }
        }

        tracing::info!("outbox dispatcher stopped");
    }

    /// One poll cycle: renew the lease, then drain every subscriber up to
    /// the current outbox head. Public so tests can drive delivery without
    /// the background task.
    pub async fn poll_once(&self) -> Result<()> {
        if !acquire_lease(&self.write_db, DISPATCHER_LEASE, &self.holder, self.lease_ttl).await? {
            return Ok(());
        }

        for subscriber in &self.subscribers {
            self.drain_subscriber(subscriber.as_ref()).await?;
        }

        Ok(())
    }

    async fn drain_subscriber(&self, subscriber: &dyn Subscriber) -> Result<()> {
        loop {
            let position = self.cursor_position(subscriber.name()).await?;
            let batch = outbox::fetch_after(&self.read_db, position, BATCH_SIZE).await?;
            if batch.is_empty() {
                return Ok(());
            }

            for event in &batch {
                if let Err(err) = subscriber.handle(event).await {
                    // Stop here to preserve per-aggregate order; the event
                    // is redelivered on the next poll.
                    tracing::warn!(
                        err = %err,
                        subscriber = subscriber.name(),
                        event_id = %event.id,
                        kind = event.event.kind(),
                        "event delivery failed, will retry"
                    );
                    return Ok(());
                }

                self.advance_cursor(subscriber.name(), event.seq).await?;
            }
        }
    }

    async fn cursor_position(&self, subscriber: &str) -> Result<i64> {
        let statement = Query::select()
            .column(OutboxCursor::Position)
            .from(OutboxCursor::Table)
            .and_where(Expr::col(OutboxCursor::Subscriber).eq(subscriber))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let row = sqlx::query_as_with::<_, (i64,), _>(&sql, values)
            .fetch_optional(&self.read_db)
            .await
            .map_err(foodcourtio_shared::Error::from)?;

        Ok(row.map(|(position,)| position).unwrap_or(0))
    }

    async fn advance_cursor(&self, subscriber: &str, position: i64) -> Result<()> {
        let statement = Query::insert()
            .into_table(OutboxCursor::Table)
            .columns([
                OutboxCursor::Subscriber,
                OutboxCursor::Position,
                OutboxCursor::UpdatedAt,
            ])
            .values_panic([subscriber.into(), position.into(), now_unix().into()])
            .on_conflict(
                OnConflict::column(OutboxCursor::Subscriber)
                    .update_columns([OutboxCursor::Position, OutboxCursor::UpdatedAt])
                    .to_owned(),
            )
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&sql, values)
            .execute(&self.write_db)
            .await
            .map_err(foodcourtio_shared::Error::from)?;

        Ok(())
    }
}

pub struct DispatcherHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl DispatcherHandle {
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(true);
        self.join.await?;

        Ok(())
    }
}
