use foodcourtio_db::table::Outbox;
use foodcourtio_shared::event::{DomainEvent, PublishedEvent};
use foodcourtio_shared::{Result, new_id, now_unix};
use sea_query::{Expr, ExprTrait, Order, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::SqliteConnection;
use sqlx::prelude::FromRow;

#[derive(FromRow)]
struct OutboxRow {
    seq: i64,
    event_id: String,
    payload: String,
    created_at: i64,
}

/// Appends a domain event to the outbox on the caller's transaction handle.
/// The row only becomes visible to the dispatcher once that transaction
/// commits, so events for rolled-back state changes never escape.
pub async fn append(conn: &mut SqliteConnection, event: &DomainEvent) -> Result<String> {
    let event_id = new_id();
    let (aggregate_type, aggregate_id) = event.aggregate();
    let payload = serde_json::to_string(event)?;

    let statement = Query::insert()
        .into_table(Outbox::Table)
        .columns([
            Outbox::EventId,
            Outbox::AggregateType,
            Outbox::AggregateId,
            Outbox::Kind,
            Outbox::Payload,
            Outbox::CreatedAt,
        ])
        .values_panic([
            event_id.clone().into(),
            aggregate_type.into(),
            aggregate_id.into(),
            event.kind().into(),
            payload.into(),
            now_unix().into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(event_id)
}

/// Committed events strictly after `position`, in commit order.
pub async fn fetch_after(
    pool: &sqlx::SqlitePool,
    position: i64,
    limit: u64,
) -> Result<Vec<PublishedEvent>> {
    let statement = Query::select()
        .columns([
            Outbox::Seq,
            Outbox::EventId,
            Outbox::Payload,
            Outbox::CreatedAt,
        ])
        .from(Outbox::Table)
        .and_where(Expr::col(Outbox::Seq).gt(position))
        .order_by(Outbox::Seq, Order::Asc)
        .limit(limit)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let rows = sqlx::query_as_with::<_, OutboxRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        events.push(PublishedEvent {
            seq: row.seq,
            id: row.event_id,
            created_at: row.created_at,
            event: serde_json::from_str(&row.payload)?,
        });
    }

    Ok(events)
}
