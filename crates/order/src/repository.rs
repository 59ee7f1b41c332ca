use foodcourtio_db::table::{CustomerOrder, OrderItem as OrderItemTable};
use foodcourtio_shared::{Result, now_unix};
use sea_query::{Expr, ExprTrait, Order as SortOrder, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::prelude::FromRow;
use sqlx::{SqliteConnection, SqlitePool};

use crate::types::{DeliveryType, Order, OrderItem, OrderStatus};

#[derive(FromRow)]
struct OrderRow {
    id: String,
    restaurant_id: String,
    order_number: String,
    dining_table_id: Option<String>,
    customer_principal_id: Option<String>,
    customer_name: String,
    customer_phone: String,
    delivery_type: sqlx::types::Text<DeliveryType>,
    status: sqlx::types::Text<OrderStatus>,
    total_minor: i64,
    special_instructions: Option<String>,
    created_at: i64,
    updated_at: i64,
}

#[derive(FromRow)]
struct OrderItemRow {
    id: String,
    product_id: String,
    product_name: String,
    variant_label: Option<String>,
    quantity: i64,
    unit_price_minor: i64,
    line_total_minor: i64,
    special_instructions: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            variant_label: row.variant_label,
            quantity: row.quantity,
            unit_price_minor: row.unit_price_minor,
            line_total_minor: row.line_total_minor,
            special_instructions: row.special_instructions,
        }
    }
}

fn order_columns() -> [CustomerOrder; 13] {
    [
        CustomerOrder::Id,
        CustomerOrder::RestaurantId,
        CustomerOrder::OrderNumber,
        CustomerOrder::DiningTableId,
        CustomerOrder::CustomerPrincipalId,
        CustomerOrder::CustomerName,
        CustomerOrder::CustomerPhone,
        CustomerOrder::DeliveryType,
        CustomerOrder::Status,
        CustomerOrder::TotalMinor,
        CustomerOrder::SpecialInstructions,
        CustomerOrder::CreatedAt,
        CustomerOrder::UpdatedAt,
    ]
}

/// Loads the aggregate with its items on an open connection handle; reads
/// inside a transaction observe that transaction's state.
pub async fn find(conn: &mut SqliteConnection, id: &str) -> Result<Option<Order>> {
    let statement = Query::select()
        .columns(order_columns())
        .from(CustomerOrder::Table)
        .and_where(Expr::col(CustomerOrder::Id).eq(id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let Some(row) = sqlx::query_as_with::<_, OrderRow, _>(&sql, values)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let statement = Query::select()
        .columns([
            OrderItemTable::Id,
            OrderItemTable::ProductId,
            OrderItemTable::ProductName,
            OrderItemTable::VariantLabel,
            OrderItemTable::Quantity,
            OrderItemTable::UnitPriceMinor,
            OrderItemTable::LineTotalMinor,
            OrderItemTable::SpecialInstructions,
        ])
        .from(OrderItemTable::Table)
        .and_where(Expr::col(OrderItemTable::OrderId).eq(id))
        .order_by(OrderItemTable::Id, SortOrder::Asc)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let items = sqlx::query_as_with::<_, OrderItemRow, _>(&sql, values)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(Some(Order {
        id: row.id,
        restaurant_id: row.restaurant_id,
        order_number: row.order_number,
        dining_table_id: row.dining_table_id,
        customer_principal_id: row.customer_principal_id,
        customer_name: row.customer_name,
        customer_phone: row.customer_phone,
        delivery_type: row.delivery_type.0,
        status: row.status.0,
        total_minor: row.total_minor,
        special_instructions: row.special_instructions,
        items,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> Result<()> {
    let statement = Query::insert()
        .into_table(CustomerOrder::Table)
        .columns(order_columns())
        .values_panic([
            order.id.clone().into(),
            order.restaurant_id.clone().into(),
            order.order_number.clone().into(),
            order.dining_table_id.clone().into(),
            order.customer_principal_id.clone().into(),
            order.customer_name.clone().into(),
            order.customer_phone.clone().into(),
            order.delivery_type.to_string().into(),
            order.status.to_string().into(),
            order.total_minor.into(),
            order.special_instructions.clone().into(),
            order.created_at.into(),
            order.updated_at.into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(&mut *conn).await?;

    for item in &order.items {
        let statement = Query::insert()
            .into_table(OrderItemTable::Table)
            .columns([
                OrderItemTable::Id,
                OrderItemTable::OrderId,
                OrderItemTable::ProductId,
                OrderItemTable::ProductName,
                OrderItemTable::VariantLabel,
                OrderItemTable::Quantity,
                OrderItemTable::UnitPriceMinor,
                OrderItemTable::LineTotalMinor,
                OrderItemTable::SpecialInstructions,
            ])
            .values_panic([
                item.id.clone().into(),
                order.id.clone().into(),
                item.product_id.clone().into(),
                item.product_name.clone().into(),
                item.variant_label.clone().into(),
                item.quantity.into(),
                item.unit_price_minor.into(),
                item.line_total_minor.into(),
                item.special_instructions.clone().into(),
            ])
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&sql, values).execute(&mut *conn).await?;
    }

    Ok(())
}

pub async fn find_from_pool(pool: &SqlitePool, id: &str) -> Result<Option<Order>> {
    let mut conn = pool.acquire().await.map_err(foodcourtio_shared::Error::from)?;
    find(&mut conn, id).await
}

pub async fn update_status(
    conn: &mut SqliteConnection,
    order_id: &str,
    status: OrderStatus,
) -> Result<()> {
    let statement = Query::update()
        .table(CustomerOrder::Table)
        .value(CustomerOrder::Status, status.to_string())
        .value(CustomerOrder::UpdatedAt, now_unix())
        .and_where(Expr::col(CustomerOrder::Id).eq(order_id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}
