use foodcourtio_db::table::{Employee as EmployeeTable, InviteToken, Shift as ShiftTable};
use foodcourtio_shared::{Error, Result, now_unix};
use sea_query::{Expr, ExprTrait, Order as SortOrder, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::prelude::FromRow;
use sqlx::{SqliteConnection, SqlitePool};

use crate::types::{Employee, EmployeeRole, Invite, InviteStatus, Shift, ShiftStatus};

#[derive(FromRow)]
struct EmployeeRow {
    id: String,
    restaurant_id: String,
    principal_id: Option<String>,
    name: String,
    phone: String,
    email: Option<String>,
    role: sqlx::types::Text<EmployeeRole>,
    hourly_wage_minor: Option<i64>,
    active: bool,
    created_at: i64,
    updated_at: i64,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            restaurant_id: row.restaurant_id,
            principal_id: row.principal_id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            role: row.role.0,
            hourly_wage_minor: row.hourly_wage_minor,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ShiftRow {
    id: String,
    employee_id: String,
    scheduled_start: i64,
    scheduled_end: i64,
    actual_start: Option<i64>,
    actual_end: Option<i64>,
    break_minutes: i64,
    status: sqlx::types::Text<ShiftStatus>,
    notes: Option<String>,
    pay_minor: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Shift {
            id: row.id,
            employee_id: row.employee_id,
            scheduled_start: row.scheduled_start,
            scheduled_end: row.scheduled_end,
            actual_start: row.actual_start,
            actual_end: row.actual_end,
            break_minutes: row.break_minutes,
            status: row.status.0,
            notes: row.notes,
            pay_minor: row.pay_minor,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct InviteRow {
    id: String,
    token: String,
    restaurant_id: String,
    granted_role: sqlx::types::Text<EmployeeRole>,
    hourly_wage_minor: Option<i64>,
    expires_at: i64,
    max_uses: i64,
    used_count: i64,
    status: sqlx::types::Text<InviteStatus>,
    created_by_principal_id: String,
    created_at: i64,
}

impl From<InviteRow> for Invite {
    fn from(row: InviteRow) -> Self {
        Invite {
            id: row.id,
            token: row.token,
            restaurant_id: row.restaurant_id,
            granted_role: row.granted_role.0,
            hourly_wage_minor: row.hourly_wage_minor,
            expires_at: row.expires_at,
            max_uses: row.max_uses,
            used_count: row.used_count,
            status: row.status.0,
            created_by_principal_id: row.created_by_principal_id,
            created_at: row.created_at,
        }
    }
}

fn employee_columns() -> [EmployeeTable; 11] {
    [
        EmployeeTable::Id,
        EmployeeTable::RestaurantId,
        EmployeeTable::PrincipalId,
        EmployeeTable::Name,
        EmployeeTable::Phone,
        EmployeeTable::Email,
        EmployeeTable::Role,
        EmployeeTable::HourlyWageMinor,
        EmployeeTable::Active,
        EmployeeTable::CreatedAt,
        EmployeeTable::UpdatedAt,
    ]
}

fn shift_columns() -> [ShiftTable; 12] {
    [
        ShiftTable::Id,
        ShiftTable::EmployeeId,
        ShiftTable::ScheduledStart,
        ShiftTable::ScheduledEnd,
        ShiftTable::ActualStart,
        ShiftTable::ActualEnd,
        ShiftTable::BreakMinutes,
        ShiftTable::Status,
        ShiftTable::Notes,
        ShiftTable::PayMinor,
        ShiftTable::CreatedAt,
        ShiftTable::UpdatedAt,
    ]
}

pub enum FindEmployee {
    Id(String),
    /// Active employee bound to a principal.
    ActiveByPrincipal(String),
}

pub async fn find_employee(
    conn: &mut SqliteConnection,
    find: FindEmployee,
) -> Result<Option<Employee>> {
    let mut statement = Query::select()
        .columns(employee_columns())
        .from(EmployeeTable::Table)
        .limit(1)
        .to_owned();

    match find {
        FindEmployee::Id(id) => statement.and_where(Expr::col(EmployeeTable::Id).eq(id)),
        FindEmployee::ActiveByPrincipal(principal_id) => statement
            .and_where(Expr::col(EmployeeTable::PrincipalId).eq(principal_id))
            .and_where(Expr::col(EmployeeTable::Active).eq(true)),
    };

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, EmployeeRow, _>(&sql, values)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Employee::from))
}

pub async fn insert_employee(conn: &mut SqliteConnection, employee: &Employee) -> Result<()> {
    let statement = Query::insert()
        .into_table(EmployeeTable::Table)
        .columns(employee_columns())
        .values_panic([
            employee.id.clone().into(),
            employee.restaurant_id.clone().into(),
            employee.principal_id.clone().into(),
            employee.name.clone().into(),
            employee.phone.clone().into(),
            employee.email.clone().into(),
            employee.role.to_string().into(),
            employee.hourly_wage_minor.into(),
            employee.active.into(),
            employee.created_at.into(),
            employee.updated_at.into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

pub struct EmployeePatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: Option<EmployeeRole>,
    pub hourly_wage_minor: Option<Option<i64>>,
    pub active: Option<bool>,
}

pub async fn update_employee(
    conn: &mut SqliteConnection,
    employee_id: &str,
    patch: EmployeePatch,
) -> Result<()> {
    let mut statement = Query::update()
        .table(EmployeeTable::Table)
        .value(EmployeeTable::UpdatedAt, now_unix())
        .and_where(Expr::col(EmployeeTable::Id).eq(employee_id))
        .to_owned();

    if let Some(name) = patch.name {
        statement.value(EmployeeTable::Name, name);
    }
    if let Some(phone) = patch.phone {
        statement.value(EmployeeTable::Phone, phone);
    }
    if let Some(email) = patch.email {
        statement.value(EmployeeTable::Email, email);
    }
    if let Some(role) = patch.role {
        statement.value(EmployeeTable::Role, role.to_string());
    }
    if let Some(wage) = patch.hourly_wage_minor {
        statement.value(EmployeeTable::HourlyWageMinor, wage);
    }
    if let Some(active) = patch.active {
        statement.value(EmployeeTable::Active, active);
    }

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

/// Half-open interval overlap among the employee's non-terminal shifts:
/// `[a, b)` and `[c, d)` collide iff `a < d && c < b`.
pub async fn overlapping_shift_exists(
    conn: &mut SqliteConnection,
    employee_id: &str,
    scheduled_start: i64,
    scheduled_end: i64,
) -> Result<bool> {
    let statement = Query::select()
        .column(ShiftTable::Id)
        .from(ShiftTable::Table)
        .and_where(Expr::col(ShiftTable::EmployeeId).eq(employee_id))
        .and_where(
            Expr::col(ShiftTable::Status).is_in([
                ShiftStatus::Scheduled.to_string(),
                ShiftStatus::Active.to_string(),
            ]),
        )
        .and_where(Expr::col(ShiftTable::ScheduledStart).lt(scheduled_end))
        .and_where(Expr::col(ShiftTable::ScheduledEnd).gt(scheduled_start))
        .limit(1)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, (String,), _>(&sql, values)
        .fetch_optional(conn)
        .await?;

    Ok(row.is_some())
}

pub async fn insert_shift(conn: &mut SqliteConnection, shift: &Shift) -> Result<()> {
    let statement = Query::insert()
        .into_table(ShiftTable::Table)
        .columns(shift_columns())
        .values_panic([
            shift.id.clone().into(),
            shift.employee_id.clone().into(),
            shift.scheduled_start.into(),
            shift.scheduled_end.into(),
            shift.actual_start.into(),
            shift.actual_end.into(),
            shift.break_minutes.into(),
            shift.status.to_string().into(),
            shift.notes.clone().into(),
            shift.pay_minor.into(),
            shift.created_at.into(),
            shift.updated_at.into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

pub async fn find_shift(conn: &mut SqliteConnection, id: &str) -> Result<Option<Shift>> {
    let statement = Query::select()
        .columns(shift_columns())
        .from(ShiftTable::Table)
        .and_where(Expr::col(ShiftTable::Id).eq(id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, ShiftRow, _>(&sql, values)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Shift::from))
}

pub async fn find_active_shift(
    conn: &mut SqliteConnection,
    employee_id: &str,
) -> Result<Option<Shift>> {
    let statement = Query::select()
        .columns(shift_columns())
        .from(ShiftTable::Table)
        .and_where(Expr::col(ShiftTable::EmployeeId).eq(employee_id))
        .and_where(Expr::col(ShiftTable::Status).eq(ShiftStatus::Active.to_string()))
        .limit(1)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, ShiftRow, _>(&sql, values)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Shift::from))
}

/// Scheduled shifts for an employee, earliest first.
pub async fn scheduled_shifts(
    conn: &mut SqliteConnection,
    employee_id: &str,
) -> Result<Vec<Shift>> {
    let statement = Query::select()
        .columns(shift_columns())
        .from(ShiftTable::Table)
        .and_where(Expr::col(ShiftTable::EmployeeId).eq(employee_id))
        .and_where(Expr::col(ShiftTable::Status).eq(ShiftStatus::Scheduled.to_string()))
        .order_by(ShiftTable::ScheduledStart, SortOrder::Asc)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let rows = sqlx::query_as_with::<_, ShiftRow, _>(&sql, values)
        .fetch_all(conn)
        .await?;

    Ok(rows.into_iter().map(Shift::from).collect())
}

pub struct ShiftPatch {
    pub status: Option<ShiftStatus>,
    pub actual_start: Option<i64>,
    pub actual_end: Option<i64>,
    pub pay_minor: Option<Option<i64>>,
    pub notes: Option<String>,
}

pub async fn update_shift(
    conn: &mut SqliteConnection,
    shift_id: &str,
    patch: ShiftPatch,
) -> Result<()> {
    let mut statement = Query::update()
        .table(ShiftTable::Table)
        .value(ShiftTable::UpdatedAt, now_unix())
        .and_where(Expr::col(ShiftTable::Id).eq(shift_id))
        .to_owned();

    if let Some(status) = patch.status {
        statement.value(ShiftTable::Status, status.to_string());
    }
    if let Some(actual_start) = patch.actual_start {
        statement.value(ShiftTable::ActualStart, actual_start);
    }
    if let Some(actual_end) = patch.actual_end {
        statement.value(ShiftTable::ActualEnd, actual_end);
    }
    if let Some(pay_minor) = patch.pay_minor {
        statement.value(ShiftTable::PayMinor, pay_minor);
    }
    if let Some(notes) = patch.notes {
        statement.value(ShiftTable::Notes, notes);
    }

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

/// Scheduled shifts that never started and are past the no-show grace.
pub async fn shifts_past_grace(pool: &SqlitePool, cutoff: i64) -> Result<Vec<Shift>> {
    let statement = Query::select()
        .columns(shift_columns())
        .from(ShiftTable::Table)
        .and_where(Expr::col(ShiftTable::Status).eq(ShiftStatus::Scheduled.to_string()))
        .and_where(Expr::col(ShiftTable::ScheduledStart).lt(cutoff))
        .and_where(Expr::col(ShiftTable::ActualStart).is_null())
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let rows = sqlx::query_as_with::<_, ShiftRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Shift::from).collect())
}

/// Shifts of a restaurant's employees whose scheduled window touches
/// `[from, to)`, newest first.
pub async fn shifts_for_restaurant(
    pool: &SqlitePool,
    restaurant_id: &str,
    from: i64,
    to: i64,
) -> Result<Vec<Shift>> {
    let statement = Query::select()
        .columns(
            shift_columns().map(|column| (ShiftTable::Table, column)),
        )
        .from(ShiftTable::Table)
        .inner_join(
            EmployeeTable::Table,
            Expr::col((ShiftTable::Table, ShiftTable::EmployeeId))
                .equals((EmployeeTable::Table, EmployeeTable::Id)),
        )
        .and_where(Expr::col((EmployeeTable::Table, EmployeeTable::RestaurantId)).eq(restaurant_id))
        .and_where(Expr::col((ShiftTable::Table, ShiftTable::ScheduledStart)).lt(to))
        .and_where(Expr::col((ShiftTable::Table, ShiftTable::ScheduledEnd)).gt(from))
        .order_by(
            (ShiftTable::Table, ShiftTable::ScheduledStart),
            SortOrder::Desc,
        )
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let rows = sqlx::query_as_with::<_, ShiftRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Shift::from).collect())
}

/// Scheduled shifts starting inside `[from, to)`, for reminders.
pub async fn shifts_starting_between(
    pool: &SqlitePool,
    from: i64,
    to: i64,
) -> Result<Vec<Shift>> {
    let statement = Query::select()
        .columns(shift_columns())
        .from(ShiftTable::Table)
        .and_where(Expr::col(ShiftTable::Status).eq(ShiftStatus::Scheduled.to_string()))
        .and_where(Expr::col(ShiftTable::ScheduledStart).gte(from))
        .and_where(Expr::col(ShiftTable::ScheduledStart).lt(to))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let rows = sqlx::query_as_with::<_, ShiftRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Shift::from).collect())
}

fn invite_columns() -> [InviteToken; 11] {
    [
        InviteToken::Id,
        InviteToken::Token,
        InviteToken::RestaurantId,
        InviteToken::GrantedRole,
        InviteToken::HourlyWageMinor,
        InviteToken::ExpiresAt,
        InviteToken::MaxUses,
        InviteToken::UsedCount,
        InviteToken::Status,
        InviteToken::CreatedByPrincipalId,
        InviteToken::CreatedAt,
    ]
}

pub async fn insert_invite(conn: &mut SqliteConnection, invite: &Invite) -> Result<()> {
    let statement = Query::insert()
        .into_table(InviteToken::Table)
        .columns(invite_columns())
        .values_panic([
            invite.id.clone().into(),
            invite.token.clone().into(),
            invite.restaurant_id.clone().into(),
            invite.granted_role.to_string().into(),
            invite.hourly_wage_minor.into(),
            invite.expires_at.into(),
            invite.max_uses.into(),
            invite.used_count.into(),
            invite.status.to_string().into(),
            invite.created_by_principal_id.clone().into(),
            invite.created_at.into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

pub async fn find_invite_by_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> Result<Option<Invite>> {
    let statement = Query::select()
        .columns(invite_columns())
        .from(InviteToken::Table)
        .and_where(Expr::col(InviteToken::Token).eq(token))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, InviteRow, _>(&sql, values)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(Invite::from))
}

pub async fn update_invite(
    conn: &mut SqliteConnection,
    invite_id: &str,
    used_count: i64,
    status: InviteStatus,
) -> Result<()> {
    let statement = Query::update()
        .table(InviteToken::Table)
        .value(InviteToken::UsedCount, used_count)
        .value(InviteToken::Status, status.to_string())
        .and_where(Expr::col(InviteToken::Id).eq(invite_id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

/// Maps the partial unique index on active `(restaurant, phone)` to the
/// domain error.
pub fn map_phone_conflict(err: Error) -> Error {
    if let Error::Server(inner) = &err
        && let Some(sqlx::Error::Database(db_err)) = inner.downcast_ref::<sqlx::Error>()
        && db_err.message().contains("employee.restaurant_id")
    {
        return Error::AlreadyExists("an active employee with this phone".to_owned());
    }

    err
}
