use sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Table, TableCreateStatement};

use super::{sql_operation, table_operation};
use crate::table::{Principal, Session};

pub struct CreatePrincipal;
pub struct CreatePrincipalExternalIdx;
pub struct CreateSession;

fn create_principal_statement() -> TableCreateStatement {
    Table::create()
        .table(Principal::Table)
        .col(
            ColumnDef::new(Principal::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(
            ColumnDef::new(Principal::Role)
                .string()
                .not_null()
                .string_len(20),
        )
        .col(
            ColumnDef::new(Principal::ExternalIdentityId)
                .string()
                .not_null(),
        )
        .col(ColumnDef::new(Principal::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Principal::UpdatedAt).big_integer().not_null())
        .to_owned()
}

fn create_session_statement() -> TableCreateStatement {
    Table::create()
        .table(Session::Table)
        .col(
            ColumnDef::new(Session::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(Session::PrincipalId).string().not_null())
        .col(ColumnDef::new(Session::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Session::ExpiresAt).big_integer().not_null())
        .foreign_key(
            ForeignKey::create()
                .from(Session::Table, Session::PrincipalId)
                .to(Principal::Table, Principal::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

table_operation!(CreatePrincipal, create_principal_statement, Principal::Table);
table_operation!(CreateSession, create_session_statement, Session::Table);

sql_operation!(
    CreatePrincipalExternalIdx,
    "CREATE UNIQUE INDEX principal_external_identity_idx ON principal (external_identity_id)",
    "DROP INDEX principal_external_identity_idx"
);
