//! Read side of the catalog. The core validates and prices orders from
//! these snapshots and never mutates catalog state.

use foodcourtio_db::table::{DiningTable, Foodcourt, Product, Restaurant};
use foodcourtio_shared::{Error, Result};
use sea_query::{Expr, ExprTrait, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use serde::{Deserialize, Serialize};
use sqlx::Sqlite;
use sqlx::prelude::FromRow;

/// Restaurant joined with its foodcourt's liveness flag; `location` stays
/// an opaque blob the core never parses.
#[derive(FromRow, Debug, Clone)]
pub struct RestaurantSnapshot {
    pub id: String,
    pub foodcourt_id: String,
    pub owner_principal_id: String,
    pub name: String,
    pub commission_rate_bp: i64,
    pub timezone: String,
    pub published: bool,
    pub foodcourt_active: bool,
}

impl RestaurantSnapshot {
    pub fn is_active(&self) -> bool {
        self.published && self.foodcourt_active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductVariant {
    pub label: String,
    pub price_modifier_minor: i64,
}

#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    pub id: String,
    pub name: String,
    pub base_price_minor: i64,
    pub available: bool,
    pub variants: Vec<ProductVariant>,
}

impl ProductSnapshot {
    /// Frozen unit price for a line: base plus the variant modifier.
    pub fn unit_price_minor(&self, variant_label: Option<&str>) -> Result<i64> {
        let Some(label) = variant_label else {
            return Ok(self.base_price_minor);
        };

        let variant = self
            .variants
            .iter()
            .find(|variant| variant.label == label)
            .ok_or_else(|| {
                Error::Validation(format!("unknown variant {label:?} for product {}", self.id))
            })?;

        Ok(self.base_price_minor + variant.price_modifier_minor)
    }
}

pub async fn find_restaurant<'e, E>(executor: E, id: &str) -> Result<Option<RestaurantSnapshot>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let statement = Query::select()
        .columns([
            (Restaurant::Table, Restaurant::Id),
            (Restaurant::Table, Restaurant::FoodcourtId),
            (Restaurant::Table, Restaurant::OwnerPrincipalId),
            (Restaurant::Table, Restaurant::Name),
            (Restaurant::Table, Restaurant::CommissionRateBp),
            (Restaurant::Table, Restaurant::Timezone),
            (Restaurant::Table, Restaurant::Published),
        ])
        .expr_as(
            Expr::col((Foodcourt::Table, Foodcourt::Active)),
            sea_query::Alias::new("foodcourt_active"),
        )
        .from(Restaurant::Table)
        .inner_join(
            Foodcourt::Table,
            Expr::col((Restaurant::Table, Restaurant::FoodcourtId))
                .equals((Foodcourt::Table, Foodcourt::Id)),
        )
        .and_where(Expr::col((Restaurant::Table, Restaurant::Id)).eq(id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, RestaurantSnapshot, _>(&sql, values)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

pub async fn table_in_foodcourt<'e, E>(executor: E, table_id: &str, foodcourt_id: &str) -> Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let statement = Query::select()
        .column(DiningTable::Id)
        .from(DiningTable::Table)
        .and_where(Expr::col(DiningTable::Id).eq(table_id))
        .and_where(Expr::col(DiningTable::FoodcourtId).eq(foodcourt_id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, (String,), _>(&sql, values)
        .fetch_optional(executor)
        .await?;

    Ok(row.is_some())
}

#[derive(FromRow)]
struct ProductRow {
    id: String,
    name: String,
    base_price_minor: i64,
    available: bool,
    variants: Option<String>,
}

/// Product snapshot scoped to the ordering restaurant; `None` when the
/// product does not exist or is attached elsewhere.
pub async fn find_product<'e, E>(
    executor: E,
    product_id: &str,
    restaurant_id: &str,
) -> Result<Option<ProductSnapshot>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let statement = Query::select()
        .columns([
            Product::Id,
            Product::Name,
            Product::BasePriceMinor,
            Product::Available,
            Product::Variants,
        ])
        .from(Product::Table)
        .and_where(Expr::col(Product::Id).eq(product_id))
        .and_where(Expr::col(Product::RestaurantId).eq(restaurant_id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let Some(row) = sqlx::query_as_with::<_, ProductRow, _>(&sql, values)
        .fetch_optional(executor)
        .await?
    else {
        return Ok(None);
    };

    let variants = match row.variants.as_deref() {
        Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
        _ => Vec::new(),
    };

    Ok(Some(ProductSnapshot {
        id: row.id,
        name: row.name,
        base_price_minor: row.base_price_minor,
        available: row.available,
        variants,
    }))
}
