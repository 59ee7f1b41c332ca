use foodcourtio_db::table::{Principal as PrincipalTable, Session};
use foodcourtio_shared::principal::{Principal, Role};
use foodcourtio_shared::{Result, conflict, new_id, now_unix};
use sea_query::{Expr, ExprTrait, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::prelude::FromRow;
use sqlx::{SqliteConnection, SqlitePool};

#[derive(FromRow)]
struct PrincipalRow {
    id: String,
    role: sqlx::types::Text<Role>,
    external_identity_id: String,
}

impl From<PrincipalRow> for Principal {
    fn from(row: PrincipalRow) -> Self {
        Principal {
            id: row.id,
            role: row.role.0,
            external_identity_id: row.external_identity_id,
        }
    }
}

pub enum FindType {
    Id(String),
    ExternalIdentityId(String),
}

pub async fn find(pool: &SqlitePool, find_type: FindType) -> Result<Option<Principal>> {
    let mut statement = Query::select()
        .columns([
            PrincipalTable::Id,
            PrincipalTable::Role,
            PrincipalTable::ExternalIdentityId,
        ])
        .from(PrincipalTable::Table)
        .limit(1)
        .to_owned();

    match find_type {
        FindType::Id(id) => statement.and_where(Expr::col(PrincipalTable::Id).eq(id)),
        FindType::ExternalIdentityId(external_id) => {
            statement.and_where(Expr::col(PrincipalTable::ExternalIdentityId).eq(external_id))
        }
    };

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, PrincipalRow, _>(&sql, values)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Principal::from))
}

/// First contact through the bootstrap endpoint creates a Customer.
pub async fn create_customer(
    conn: &mut SqliteConnection,
    external_identity_id: String,
) -> Result<Principal> {
    let id = new_id();
    let now = now_unix();

    let statement = Query::insert()
        .into_table(PrincipalTable::Table)
        .columns([
            PrincipalTable::Id,
            PrincipalTable::Role,
            PrincipalTable::ExternalIdentityId,
            PrincipalTable::CreatedAt,
            PrincipalTable::UpdatedAt,
        ])
        .values_panic([
            id.clone().into(),
            Role::Customer.to_string().into(),
            external_identity_id.clone().into(),
            now.into(),
            now.into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(&mut *conn).await?;

    Ok(Principal {
        id,
        role: Role::Customer,
        external_identity_id,
    })
}

/// Role changes guard the bootstrap invariant: the platform never loses
/// its last Superadmin.
pub async fn set_role(conn: &mut SqliteConnection, principal_id: &str, role: Role) -> Result<()> {
    if role != Role::Superadmin {
        let current = count_by_role(&mut *conn, Role::Superadmin).await?;
        let demoting_superadmin = is_role(&mut *conn, principal_id, Role::Superadmin).await?;
        if demoting_superadmin && current <= 1 {
            conflict!("at least one superadmin must exist");
        }
    }

    let statement = Query::update()
        .table(PrincipalTable::Table)
        .value(PrincipalTable::Role, role.to_string())
        .value(PrincipalTable::UpdatedAt, now_unix())
        .and_where(Expr::col(PrincipalTable::Id).eq(principal_id))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

async fn count_by_role(conn: &mut SqliteConnection, role: Role) -> Result<i64> {
    let statement = Query::select()
        .expr(Expr::col(PrincipalTable::Id).count())
        .from(PrincipalTable::Table)
        .and_where(Expr::col(PrincipalTable::Role).eq(role.to_string()))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let (count,) = sqlx::query_as_with::<_, (i64,), _>(&sql, values)
        .fetch_one(conn)
        .await?;

    Ok(count)
}

async fn is_role(conn: &mut SqliteConnection, principal_id: &str, role: Role) -> Result<bool> {
    let statement = Query::select()
        .column(PrincipalTable::Id)
        .from(PrincipalTable::Table)
        .and_where(Expr::col(PrincipalTable::Id).eq(principal_id))
        .and_where(Expr::col(PrincipalTable::Role).eq(role.to_string()))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    let row = sqlx::query_as_with::<_, (String,), _>(&sql, values)
        .fetch_optional(conn)
        .await?;

    Ok(row.is_some())
}

pub async fn create_session(
    conn: &mut SqliteConnection,
    principal_id: &str,
    expires_at: i64,
) -> Result<String> {
    let id = new_id();

    let statement = Query::insert()
        .into_table(Session::Table)
        .columns([
            Session::Id,
            Session::PrincipalId,
            Session::CreatedAt,
            Session::ExpiresAt,
        ])
        .values_panic([
            id.clone().into(),
            principal_id.into(),
            now_unix().into(),
            expires_at.into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(id)
}
