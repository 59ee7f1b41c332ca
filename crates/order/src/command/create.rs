use foodcourtio_shared::event::DomainEvent;
use foodcourtio_shared::{Error, Result, new_id, now_unix, validation};
use serde::Deserialize;
use sqlx::SqliteConnection;
use time::OffsetDateTime;
use validator::Validate;

use crate::command::OrderEngine;
use crate::types::{DeliveryType, Order, OrderItem, OrderStatus};
use crate::{number, repository};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderItemInput {
    pub product_id: String,
    pub variant_label: Option<String>,
    #[validate(range(min = 1, max = 99))]
    pub quantity: i64,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub restaurant_id: String,
    pub table_id: Option<String>,
    #[validate(nested)]
    pub items: Vec<CreateOrderItemInput>,
    #[validate(length(min = 1, max = 120))]
    pub customer_name: String,
    #[validate(length(min = 5, max = 20))]
    pub customer_phone: String,
    pub delivery_type: DeliveryType,
    pub special_instructions: Option<String>,
    #[serde(skip)]
    pub customer_principal_id: Option<String>,
}

impl OrderEngine {
    /// Creates an order in one serializable transaction: restaurant and
    /// table validation, snapshot pricing from the catalog read side,
    /// server-side totals, number allocation, insert plus `OrderCreated`.
    pub async fn create(&self, input: CreateOrderInput) -> Result<Order> {
        input.validate()?;
        if input.items.is_empty() {
            validation!("order must contain at least one item");
        }

        let input = &input;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db().begin().await.map_err(Error::from)?;
            let order = create_in_tx(&mut tx, input).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(order)
        })
        .await
    }
}

async fn create_in_tx(conn: &mut SqliteConnection, input: &CreateOrderInput) -> Result<Order> {
    let restaurant = foodcourtio_catalog::find_restaurant(&mut *conn, &input.restaurant_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("restaurant {}", input.restaurant_id)))?;
    if !restaurant.is_active() {
        validation!("restaurant is not accepting orders");
    }

    if let Some(table_id) = input.table_id.as_deref()
        && !foodcourtio_catalog::table_in_foodcourt(&mut *conn, table_id, &restaurant.foodcourt_id)
            .await?
    {
        validation!("table {table_id} does not belong to the restaurant's foodcourt");
    }

    let mut items = Vec::with_capacity(input.items.len());
    let mut total_minor = 0i64;

    for line in &input.items {
        let product =
            foodcourtio_catalog::find_product(&mut *conn, &line.product_id, &input.restaurant_id)
                .await?
                .filter(|product| product.available)
                .ok_or_else(|| {
                    Error::Validation(format!("product {} is unavailable", line.product_id))
                })?;

        // Price is frozen here; later catalog changes never touch
        // historical items.
        let unit_price_minor = product.unit_price_minor(line.variant_label.as_deref())?;
        let line_total_minor = unit_price_minor * line.quantity;
        total_minor += line_total_minor;

        items.push(OrderItem {
            id: new_id(),
            product_id: line.product_id.clone(),
            product_name: product.name,
            variant_label: line.variant_label.clone(),
            quantity: line.quantity,
            unit_price_minor,
            line_total_minor,
            special_instructions: line.special_instructions.clone(),
        });
    }

    if total_minor <= 0 {
        validation!("order total must be positive");
    }

    let local_date = number::local_date(&restaurant.timezone, OffsetDateTime::now_utc())?;
    let order_number = number::allocate(&mut *conn, &restaurant.id, &local_date).await?;

    let now = now_unix();
    let order = Order {
        id: new_id(),
        restaurant_id: restaurant.id.clone(),
        order_number,
        dining_table_id: input.table_id.clone(),
        customer_principal_id: input.customer_principal_id.clone(),
        customer_name: input.customer_name.clone(),
        customer_phone: input.customer_phone.clone(),
        delivery_type: input.delivery_type,
        status: OrderStatus::Pending,
        total_minor,
        special_instructions: input.special_instructions.clone(),
        items,
        created_at: now,
        updated_at: now,
    };

    repository::insert(&mut *conn, &order).await?;

    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::OrderCreated {
            order_id: order.id.clone(),
            restaurant_id: order.restaurant_id.clone(),
            order_number: order.order_number.clone(),
            total_minor: order.total_minor,
            customer_principal_id: order.customer_principal_id.clone(),
        },
    )
    .await?;

    Ok(order)
}
