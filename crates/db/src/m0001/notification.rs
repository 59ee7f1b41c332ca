use sea_query::{ColumnDef, Table, TableCreateStatement};

use super::table_operation;
use crate::table::Notification;

pub struct CreateNotification;

fn create_notification_statement() -> TableCreateStatement {
    Table::create()
        .table(Notification::Table)
        .col(
            ColumnDef::new(Notification::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(
            ColumnDef::new(Notification::DedupeKey)
                .string()
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(Notification::RecipientPrincipalId).string())
        .col(ColumnDef::new(Notification::Kind).string().not_null())
        .col(ColumnDef::new(Notification::Body).string().not_null())
        .col(
            ColumnDef::new(Notification::CreatedAt)
                .big_integer()
                .not_null(),
        )
        .to_owned()
}

table_operation!(
    CreateNotification,
    create_notification_statement,
    Notification::Table
);
