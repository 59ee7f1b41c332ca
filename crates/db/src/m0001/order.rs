use sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Table, TableCreateStatement};

use super::{sql_operation, table_operation};
use crate::table::{CustomerOrder, DiningTable, OrderItem, OrderNumberCounter, Product, Restaurant};

pub struct CreateCustomerOrder;
pub struct CreateOrderNumberIdx;
pub struct CreateOrderItem;
pub struct CreateOrderNumberCounter;

fn create_customer_order_statement() -> TableCreateStatement {
    Table::create()
        .table(CustomerOrder::Table)
        .col(
            ColumnDef::new(CustomerOrder::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(
            ColumnDef::new(CustomerOrder::RestaurantId)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(CustomerOrder::OrderNumber)
                .string()
                .not_null()
                .string_len(12),
        )
        .col(ColumnDef::new(CustomerOrder::DiningTableId).string())
        .col(ColumnDef::new(CustomerOrder::CustomerPrincipalId).string())
        .col(
            ColumnDef::new(CustomerOrder::CustomerName)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(CustomerOrder::CustomerPhone)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(CustomerOrder::DeliveryType)
                .string()
                .not_null()
                .string_len(10),
        )
        .col(
            ColumnDef::new(CustomerOrder::Status)
                .string()
                .not_null()
                .string_len(10),
        )
        .col(
            ColumnDef::new(CustomerOrder::TotalMinor)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(CustomerOrder::SpecialInstructions).string())
        .col(
            ColumnDef::new(CustomerOrder::CreatedAt)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(CustomerOrder::UpdatedAt)
                .big_integer()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .from(CustomerOrder::Table, CustomerOrder::RestaurantId)
                .to(Restaurant::Table, Restaurant::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .foreign_key(
            ForeignKey::create()
                .from(CustomerOrder::Table, CustomerOrder::DiningTableId)
                .to(DiningTable::Table, DiningTable::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

fn create_order_item_statement() -> TableCreateStatement {
    Table::create()
        .table(OrderItem::Table)
        .col(
            ColumnDef::new(OrderItem::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(OrderItem::OrderId).string().not_null())
        .col(ColumnDef::new(OrderItem::ProductId).string().not_null())
        .col(ColumnDef::new(OrderItem::ProductName).string().not_null())
        .col(ColumnDef::new(OrderItem::VariantLabel).string())
        .col(ColumnDef::new(OrderItem::Quantity).big_integer().not_null())
        .col(
            ColumnDef::new(OrderItem::UnitPriceMinor)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(OrderItem::LineTotalMinor)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(OrderItem::SpecialInstructions).string())
        .foreign_key(
            ForeignKey::create()
                .from(OrderItem::Table, OrderItem::OrderId)
                .to(CustomerOrder::Table, CustomerOrder::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .foreign_key(
            ForeignKey::create()
                .from(OrderItem::Table, OrderItem::ProductId)
                .to(Product::Table, Product::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

fn create_order_number_counter_statement() -> TableCreateStatement {
    Table::create()
        .table(OrderNumberCounter::Table)
        .col(
            ColumnDef::new(OrderNumberCounter::RestaurantId)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(OrderNumberCounter::LocalDate)
                .string()
                .not_null()
                .string_len(8),
        )
        .col(
            ColumnDef::new(OrderNumberCounter::Value)
                .big_integer()
                .not_null(),
        )
        .primary_key(
            sea_query::Index::create()
                .col(OrderNumberCounter::RestaurantId)
                .col(OrderNumberCounter::LocalDate),
        )
        .to_owned()
}

table_operation!(
    CreateCustomerOrder,
    create_customer_order_statement,
    CustomerOrder::Table
);
table_operation!(CreateOrderItem, create_order_item_statement, OrderItem::Table);
table_operation!(
    CreateOrderNumberCounter,
    create_order_number_counter_statement,
    OrderNumberCounter::Table
);

sql_operation!(
    CreateOrderNumberIdx,
    "CREATE UNIQUE INDEX customer_order_number_idx ON customer_order (restaurant_id, order_number)",
    "DROP INDEX customer_order_number_idx"
);
