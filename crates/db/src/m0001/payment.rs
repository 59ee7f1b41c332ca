use sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Table, TableCreateStatement};

use super::{sql_operation, table_operation};
use crate::table::{CustomerOrder, Payment, ProcessedWebhook, Refund, Restaurant};

pub struct CreatePayment;
pub struct CreatePaymentOrderIdx;
pub struct CreatePaymentProviderRefIdx;
pub struct CreateRefund;
pub struct CreateProcessedWebhook;

fn create_payment_statement() -> TableCreateStatement {
    Table::create()
        .table(Payment::Table)
        .col(
            ColumnDef::new(Payment::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(Payment::OrderId).string().not_null())
        .col(ColumnDef::new(Payment::RestaurantId).string().not_null())
        .col(
            ColumnDef::new(Payment::AmountMinor)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(Payment::Currency)
                .string()
                .not_null()
                .string_len(3),
        )
        .col(
            ColumnDef::new(Payment::Method)
                .string()
                .not_null()
                .string_len(10),
        )
        .col(
            ColumnDef::new(Payment::Status)
                .string()
                .not_null()
                .string_len(10),
        )
        .col(
            ColumnDef::new(Payment::CommissionMinor)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(Payment::NetMinor).big_integer().not_null())
        .col(ColumnDef::new(Payment::ProviderRef).string())
        .col(ColumnDef::new(Payment::ProviderMetadata).string())
        .col(ColumnDef::new(Payment::Details).string())
        .col(ColumnDef::new(Payment::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Payment::UpdatedAt).big_integer().not_null())
        .foreign_key(
            ForeignKey::create()
                .from(Payment::Table, Payment::OrderId)
                .to(CustomerOrder::Table, CustomerOrder::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .foreign_key(
            ForeignKey::create()
                .from(Payment::Table, Payment::RestaurantId)
                .to(Restaurant::Table, Restaurant::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

fn create_refund_statement() -> TableCreateStatement {
    Table::create()
        .table(Refund::Table)
        .col(
            ColumnDef::new(Refund::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(Refund::PaymentId).string().not_null())
        .col(ColumnDef::new(Refund::AmountMinor).big_integer().not_null())
        .col(ColumnDef::new(Refund::Reason).string().not_null())
        .col(ColumnDef::new(Refund::ProviderRefundRef).string())
        .col(ColumnDef::new(Refund::CreatedAt).big_integer().not_null())
        .foreign_key(
            ForeignKey::create()
                .from(Refund::Table, Refund::PaymentId)
                .to(Payment::Table, Payment::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

fn create_processed_webhook_statement() -> TableCreateStatement {
    Table::create()
        .table(ProcessedWebhook::Table)
        .col(
            ColumnDef::new(ProcessedWebhook::Provider)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(ProcessedWebhook::ProviderEventId)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(ProcessedWebhook::ProcessedAt)
                .big_integer()
                .not_null(),
        )
        .primary_key(
            sea_query::Index::create()
                .col(ProcessedWebhook::Provider)
                .col(ProcessedWebhook::ProviderEventId),
        )
        .to_owned()
}

table_operation!(CreatePayment, create_payment_statement, Payment::Table);
table_operation!(CreateRefund, create_refund_statement, Refund::Table);
table_operation!(
    CreateProcessedWebhook,
    create_processed_webhook_statement,
    ProcessedWebhook::Table
);

sql_operation!(
    CreatePaymentOrderIdx,
    "CREATE UNIQUE INDEX payment_order_idx ON payment (order_id)",
    "DROP INDEX payment_order_idx"
);

sql_operation!(
    CreatePaymentProviderRefIdx,
    "CREATE INDEX payment_provider_ref_idx ON payment (provider_ref)",
    "DROP INDEX payment_provider_ref_idx"
);
