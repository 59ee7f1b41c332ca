use sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Table, TableCreateStatement};

use super::table_operation;
use crate::table::{DiningTable, Foodcourt, Product, Restaurant};

pub struct CreateFoodcourt;
pub struct CreateRestaurant;
pub struct CreateDiningTable;
pub struct CreateProduct;

fn create_foodcourt_statement() -> TableCreateStatement {
    Table::create()
        .table(Foodcourt::Table)
        .col(
            ColumnDef::new(Foodcourt::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(Foodcourt::Name).string().not_null())
        .col(
            ColumnDef::new(Foodcourt::CommissionRateBp)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(Foodcourt::Timezone).string().not_null())
        .col(
            ColumnDef::new(Foodcourt::Active)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(ColumnDef::new(Foodcourt::CreatedAt).big_integer().not_null())
        .to_owned()
}

fn create_restaurant_statement() -> TableCreateStatement {
    Table::create()
        .table(Restaurant::Table)
        .col(
            ColumnDef::new(Restaurant::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(Restaurant::FoodcourtId).string().not_null())
        .col(
            ColumnDef::new(Restaurant::OwnerPrincipalId)
                .string()
                .not_null(),
        )
        .col(ColumnDef::new(Restaurant::Name).string().not_null())
        .col(
            ColumnDef::new(Restaurant::CommissionRateBp)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(Restaurant::Timezone).string().not_null())
        .col(
            ColumnDef::new(Restaurant::Published)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(ColumnDef::new(Restaurant::Location).string())
        .col(
            ColumnDef::new(Restaurant::CreatedAt)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(Restaurant::UpdatedAt)
                .big_integer()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .from(Restaurant::Table, Restaurant::FoodcourtId)
                .to(Foodcourt::Table, Foodcourt::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

fn create_dining_table_statement() -> TableCreateStatement {
    Table::create()
        .table(DiningTable::Table)
        .col(
            ColumnDef::new(DiningTable::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(DiningTable::FoodcourtId).string().not_null())
        .col(ColumnDef::new(DiningTable::Label).string().not_null())
        .col(
            ColumnDef::new(DiningTable::CreatedAt)
                .big_integer()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .from(DiningTable::Table, DiningTable::FoodcourtId)
                .to(Foodcourt::Table, Foodcourt::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

fn create_product_statement() -> TableCreateStatement {
    Table::create()
        .table(Product::Table)
        .col(
            ColumnDef::new(Product::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(Product::RestaurantId).string().not_null())
        .col(ColumnDef::new(Product::Name).string().not_null())
        .col(
            ColumnDef::new(Product::BasePriceMinor)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(Product::Available)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(ColumnDef::new(Product::Variants).string())
        .col(ColumnDef::new(Product::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Product::UpdatedAt).big_integer().not_null())
        .foreign_key(
            ForeignKey::create()
                .from(Product::Table, Product::RestaurantId)
                .to(Restaurant::Table, Restaurant::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

table_operation!(CreateFoodcourt, create_foodcourt_statement, Foodcourt::Table);
table_operation!(
    CreateRestaurant,
    create_restaurant_statement,
    Restaurant::Table
);
table_operation!(
    CreateDiningTable,
    create_dining_table_statement,
    DiningTable::Table
);
table_operation!(CreateProduct, create_product_statement, Product::Table);
