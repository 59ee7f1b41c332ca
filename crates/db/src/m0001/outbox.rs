use sea_query::{ColumnDef, Table, TableCreateStatement};

use super::{sql_operation, table_operation};
use crate::table::{Lease, OutboxCursor};

pub struct CreateOutbox;
pub struct CreateOutboxCursor;
pub struct CreateLease;

// The outbox sequence must follow commit order, so the table is created
// with a raw AUTOINCREMENT rowid alias.
sql_operation!(
    CreateOutbox,
    r#"CREATE TABLE outbox (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id TEXT NOT NULL UNIQUE,
        aggregate_type TEXT NOT NULL,
        aggregate_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        payload TEXT NOT NULL,
        created_at BIGINT NOT NULL
    )"#,
    "DROP TABLE outbox"
);

fn create_outbox_cursor_statement() -> TableCreateStatement {
    Table::create()
        .table(OutboxCursor::Table)
        .col(
            ColumnDef::new(OutboxCursor::Subscriber)
                .string()
                .not_null()
                .primary_key(),
        )
        .col(
            ColumnDef::new(OutboxCursor::Position)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(OutboxCursor::UpdatedAt)
                .big_integer()
                .not_null(),
        )
        .to_owned()
}

fn create_lease_statement() -> TableCreateStatement {
    Table::create()
        .table(Lease::Table)
        .col(ColumnDef::new(Lease::Name).string().not_null().primary_key())
        .col(ColumnDef::new(Lease::Holder).string().not_null())
        .col(ColumnDef::new(Lease::ExpiresAt).big_integer().not_null())
        .to_owned()
}

table_operation!(
    CreateOutboxCursor,
    create_outbox_cursor_statement,
    OutboxCursor::Table
);
table_operation!(CreateLease, create_lease_statement, Lease::Table);
