use foodcourtio_db::table::{Payment as PaymentTable, ProcessedWebhook, Refund as RefundTable};
use foodcourtio_shared::{Error, Result, now_unix};
use sea_query::{Expr, ExprTrait, OnConflict, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::prelude::FromRow;
use sqlx::{SqliteConnection, SqlitePool};

use crate::types::{Payment, PaymentMethod, PaymentStatus, RefundRecord};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    order_id: String,
    restaurant_id: String,
    amount_minor: i64,
    currency: String,
    method: sqlx::types::Text<PaymentMethod>,
    status: sqlx::types::Text<PaymentStatus>,
    commission_minor: i64,
    net_minor: i64,
    provider_ref: Option<String>,
    provider_metadata: Option<String>,
    details: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = Error;

    fn try_from(row: PaymentRow) -> Result<Self> {
        let provider_metadata = row
            .provider_metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let details = row.details.as_deref().map(serde_json::from_str).transpose()?;

        Ok(Payment {
            id: row.id,
            order_id: row.order_id,
            restaurant_id: row.restaurant_id,
            amount_minor: row.amount_minor,
            currency: row.currency,
            method: row.method.0,
            status: row.status.0,
            commission_minor: row.commission_minor,
            net_minor: row.net_minor,
            provider_ref: row.provider_ref,
            provider_metadata,
            details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub enum FindBy {
    Id(String),
    OrderId(String),
    ProviderRef(String),
}

pub async fn find(conn: &mut SqliteConnection, find_by: FindBy) -> Result<Option<Payment>> {
    let mut statement = Query::select()
        .columns([
            PaymentTable::Id,
            PaymentTable::OrderId,
            PaymentTable::RestaurantId,
            PaymentTable::AmountMinor,
            PaymentTable::Currency,
            PaymentTable::Method,
            PaymentTable::Status,
            PaymentTable::CommissionMinor,
            PaymentTable::NetMinor,
            PaymentTable::ProviderRef,
            PaymentTable::ProviderMetadata,
            PaymentTable::Details,
            PaymentTable::CreatedAt,
            PaymentTable::UpdatedAt,
        ])
        .from(PaymentTable::Table)
        .limit(1)
        .to_owned();

    match find_by {
        FindBy::Id(id) => statement.and_where(Expr::col(PaymentTable::Id).eq(id)),
        FindBy::OrderId(order_id) => {
            statement.and_where(Expr::col(PaymentTable::OrderId).eq(order_id))
        }
        FindBy::ProviderRef(provider_ref) => {
            statement.and_where(Expr::col(PaymentTable::ProviderRef).eq(provider_ref))
        }
    };

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, PaymentRow, _>(&sql, values)
        .fetch_optional(conn)
        .await?;

    row.map(Payment::try_from).transpose()
}

pub async fn find_from_pool(pool: &SqlitePool, find_by: FindBy) -> Result<Option<Payment>> {
    let mut conn = pool.acquire().await.map_err(Error::from)?;
    find(&mut conn, find_by).await
}

pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> Result<()> {
    let statement = Query::insert()
        .into_table(PaymentTable::Table)
        .columns([
            PaymentTable::Id,
            PaymentTable::OrderId,
            PaymentTable::RestaurantId,
            PaymentTable::AmountMinor,
            PaymentTable::Currency,
            PaymentTable::Method,
            PaymentTable::Status,
            PaymentTable::CommissionMinor,
            PaymentTable::NetMinor,
            PaymentTable::ProviderRef,
            PaymentTable::ProviderMetadata,
            PaymentTable::Details,
            PaymentTable::CreatedAt,
            PaymentTable::UpdatedAt,
        ])
        .values_panic([
            payment.id.clone().into(),
            payment.order_id.clone().into(),
            payment.restaurant_id.clone().into(),
            payment.amount_minor.into(),
            payment.currency.clone().into(),
            payment.method.to_string().into(),
            payment.status.to_string().into(),
            payment.commission_minor.into(),
            payment.net_minor.into(),
            payment.provider_ref.clone().into(),
            payment
                .provider_metadata
                .as_ref()
                .map(serde_json::Value::to_string)
                .into(),
            payment
                .details
                .as_ref()
                .map(serde_json::Value::to_string)
                .into(),
            payment.created_at.into(),
            payment.updated_at.into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

pub async fn update_status(
    conn: &mut SqliteConnection,
    payment_id: &str,
    status: PaymentStatus,
) -> Result<()> {
    let statement = Query::update()
        .table(PaymentTable::Table)
        .value(PaymentTable::Status, status.to_string())
        .value(PaymentTable::UpdatedAt, now_unix())
        .and_where(Expr::col(PaymentTable::Id).eq(payment_id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

pub async fn set_provider_ref(
    conn: &mut SqliteConnection,
    payment_id: &str,
    provider_ref: &str,
    provider_metadata: &serde_json::Value,
) -> Result<()> {
    let statement = Query::update()
        .table(PaymentTable::Table)
        .value(PaymentTable::ProviderRef, provider_ref)
        .value(PaymentTable::ProviderMetadata, provider_metadata.to_string())
        .value(PaymentTable::UpdatedAt, now_unix())
        .and_where(Expr::col(PaymentTable::Id).eq(payment_id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

/// Full refund reverses the frozen split for payout accounting: commission
/// and net both become zero.
pub async fn zero_commission(conn: &mut SqliteConnection, payment_id: &str) -> Result<()> {
    let statement = Query::update()
        .table(PaymentTable::Table)
        .value(PaymentTable::CommissionMinor, 0)
        .value(PaymentTable::NetMinor, 0)
        .value(PaymentTable::UpdatedAt, now_unix())
        .and_where(Expr::col(PaymentTable::Id).eq(payment_id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

pub async fn refunded_total(conn: &mut SqliteConnection, payment_id: &str) -> Result<i64> {
    let statement = Query::select()
        .expr(Expr::col(RefundTable::AmountMinor).sum())
        .from(RefundTable::Table)
        .and_where(Expr::col(RefundTable::PaymentId).eq(payment_id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let (total,) = sqlx::query_as_with::<_, (Option<i64>,), _>(&sql, values)
        .fetch_one(conn)
        .await?;

    Ok(total.unwrap_or(0))
}

pub async fn insert_refund(conn: &mut SqliteConnection, refund: &RefundRecord) -> Result<()> {
    let statement = Query::insert()
        .into_table(RefundTable::Table)
        .columns([
            RefundTable::Id,
            RefundTable::PaymentId,
            RefundTable::AmountMinor,
            RefundTable::Reason,
            RefundTable::ProviderRefundRef,
            RefundTable::CreatedAt,
        ])
        .values_panic([
            refund.id.clone().into(),
            refund.payment_id.clone().into(),
            refund.amount_minor.into(),
            refund.reason.clone().into(),
            refund.provider_refund_ref.clone().into(),
            refund.created_at.into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

/// Claims a webhook for processing. `false` means the `(provider, event)`
/// pair was already handled and the caller must treat the event as a
/// no-op replay.
pub async fn record_processed_webhook(
    conn: &mut SqliteConnection,
    provider: &str,
    provider_event_id: &str,
) -> Result<bool> {
    let statement = Query::insert()
        .into_table(ProcessedWebhook::Table)
        .columns([
            ProcessedWebhook::Provider,
            ProcessedWebhook::ProviderEventId,
            ProcessedWebhook::ProcessedAt,
        ])
        .values_panic([provider.into(), provider_event_id.into(), now_unix().into()])
        .on_conflict(
            OnConflict::columns([ProcessedWebhook::Provider, ProcessedWebhook::ProviderEventId])
                .do_nothing()
                .to_owned(),
        )
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let result = sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(result.rows_affected() == 1)
}
