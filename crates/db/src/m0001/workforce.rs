use sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Table, TableCreateStatement};

use super::{sql_operation, table_operation};
use crate::table::{Employee, InviteToken, Principal, Restaurant, Shift};

pub struct CreateEmployee;
pub struct CreateEmployeePhoneIdx;
pub struct CreateShift;
pub struct CreateShiftEmployeeIdx;
pub struct CreateInviteToken;
pub struct CreateInviteTokenIdx;

fn create_employee_statement() -> TableCreateStatement {
    Table::create()
        .table(Employee::Table)
        .col(
            ColumnDef::new(Employee::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(Employee::RestaurantId).string().not_null())
        .col(ColumnDef::new(Employee::PrincipalId).string())
        .col(ColumnDef::new(Employee::Name).string().not_null())
        .col(ColumnDef::new(Employee::Phone).string().not_null())
        .col(ColumnDef::new(Employee::Email).string())
        .col(
            ColumnDef::new(Employee::Role)
                .string()
                .not_null()
                .string_len(10),
        )
        .col(ColumnDef::new(Employee::HourlyWageMinor).big_integer())
        .col(
            ColumnDef::new(Employee::Active)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(ColumnDef::new(Employee::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Employee::UpdatedAt).big_integer().not_null())
        .foreign_key(
            ForeignKey::create()
                .from(Employee::Table, Employee::RestaurantId)
                .to(Restaurant::Table, Restaurant::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .foreign_key(
            ForeignKey::create()
                .from(Employee::Table, Employee::PrincipalId)
                .to(Principal::Table, Principal::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

fn create_shift_statement() -> TableCreateStatement {
    Table::create()
        .table(Shift::Table)
        .col(
            ColumnDef::new(Shift::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(Shift::EmployeeId).string().not_null())
        .col(
            ColumnDef::new(Shift::ScheduledStart)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(Shift::ScheduledEnd).big_integer().not_null())
        .col(ColumnDef::new(Shift::ActualStart).big_integer())
        .col(ColumnDef::new(Shift::ActualEnd).big_integer())
        .col(
            ColumnDef::new(Shift::BreakMinutes)
                .big_integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(Shift::Status)
                .string()
                .not_null()
                .string_len(10),
        )
        .col(ColumnDef::new(Shift::Notes).string())
        .col(ColumnDef::new(Shift::PayMinor).big_integer())
        .col(ColumnDef::new(Shift::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Shift::UpdatedAt).big_integer().not_null())
        .foreign_key(
            ForeignKey::create()
                .from(Shift::Table, Shift::EmployeeId)
                .to(Employee::Table, Employee::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

fn create_invite_token_statement() -> TableCreateStatement {
    Table::create()
        .table(InviteToken::Table)
        .col(
            ColumnDef::new(InviteToken::Id)
                .string()
                .not_null()
                .string_len(36)
                .primary_key(),
        )
        .col(ColumnDef::new(InviteToken::Token).string().not_null())
        .col(ColumnDef::new(InviteToken::RestaurantId).string().not_null())
        .col(
            ColumnDef::new(InviteToken::GrantedRole)
                .string()
                .not_null()
                .string_len(10),
        )
        .col(ColumnDef::new(InviteToken::HourlyWageMinor).big_integer())
        .col(
            ColumnDef::new(InviteToken::ExpiresAt)
                .big_integer()
                .not_null(),
        )
        .col(ColumnDef::new(InviteToken::MaxUses).big_integer().not_null())
        .col(
            ColumnDef::new(InviteToken::UsedCount)
                .big_integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(InviteToken::Status)
                .string()
                .not_null()
                .string_len(10),
        )
        .col(
            ColumnDef::new(InviteToken::CreatedByPrincipalId)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(InviteToken::CreatedAt)
                .big_integer()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .from(InviteToken::Table, InviteToken::RestaurantId)
                .to(Restaurant::Table, Restaurant::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

table_operation!(CreateEmployee, create_employee_statement, Employee::Table);
table_operation!(CreateShift, create_shift_statement, Shift::Table);
table_operation!(
    CreateInviteToken,
    create_invite_token_statement,
    InviteToken::Table
);

// Uniqueness among *active* employees only; a deactivated employee frees
// the phone number for re-hire.
sql_operation!(
    CreateEmployeePhoneIdx,
    "CREATE UNIQUE INDEX employee_phone_idx ON employee (restaurant_id, phone) WHERE active = TRUE",
    "DROP INDEX employee_phone_idx"
);

sql_operation!(
    CreateShiftEmployeeIdx,
    "CREATE INDEX shift_employee_idx ON shift (employee_id, status)",
    "DROP INDEX shift_employee_idx"
);

sql_operation!(
    CreateInviteTokenIdx,
    "CREATE UNIQUE INDEX invite_token_idx ON invite_token (token)",
    "DROP INDEX invite_token_idx"
);
