use foodcourtio_db::table::{Employee, Restaurant};
use foodcourtio_shared::principal::{Principal, Role};
use foodcourtio_shared::{Error, Result};
use sea_query::{Expr, ExprTrait, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::SqlitePool;

/// Verbs of the authorization matrix. One `authorize` call sits at the top
/// of every command handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    CreateOrder,
    ReadOrder,
    TransitionOrder,
    CancelOrder,
    CreatePayment,
    ProcessCashOrTerminal,
    RefundPayment,
    ManageEmployees,
    ClockInOut,
    CreateInvite,
    ConsumeInvite,
}

/// What the caller is acting on. Fields are filled from the loaded
/// aggregate before the check, never from client input.
#[derive(Debug, Default, Clone)]
pub struct ResourceScope {
    pub restaurant_id: Option<String>,
    /// Placing customer of the target order, when there is one.
    pub order_customer_principal_id: Option<String>,
    /// Current status of the target order; customers may cancel only
    /// while Pending.
    pub order_status: Option<String>,
    /// Principal bound to the employee being clocked in or out.
    pub employee_principal_id: Option<String>,
}

impl ResourceScope {
    pub fn restaurant(restaurant_id: impl Into<String>) -> Self {
        Self {
            restaurant_id: Some(restaurant_id.into()),
            ..Self::default()
        }
    }
}

/// Scope oracle: answers allow/deny from the principal's role and its
/// relation to the target restaurant.
#[derive(Clone)]
pub struct AccessResolver {
    read_db: SqlitePool,
}

impl AccessResolver {
    pub fn new(read_db: SqlitePool) -> Self {
        Self { read_db }
    }

    pub async fn authorize(
        &self,
        principal: &Principal,
        action: Action,
        scope: &ResourceScope,
    ) -> Result<()> {
        match principal.role {
            Role::Superadmin => match action {
                Action::ConsumeInvite => Err(Error::Forbidden),
                _ => Ok(()),
            },
            Role::RestaurantOwner => self.authorize_owner(principal, action, scope).await,
            Role::Employee => self.authorize_employee(principal, action, scope).await,
            Role::Customer => authorize_customer(principal, action, scope),
        }
    }

    async fn authorize_owner(
        &self,
        principal: &Principal,
        action: Action,
        scope: &ResourceScope,
    ) -> Result<()> {
        if action == Action::ConsumeInvite {
            return Err(Error::Forbidden);
        }

        let Some(restaurant_id) = scope.restaurant_id.as_deref() else {
            return Err(Error::Forbidden);
        };
        if !self.owns_restaurant(&principal.id, restaurant_id).await? {
            return Err(Error::Forbidden);
        }

        Ok(())
    }

    async fn authorize_employee(
        &self,
        principal: &Principal,
        action: Action,
        scope: &ResourceScope,
    ) -> Result<()> {
        match action {
            Action::RefundPayment
            | Action::ManageEmployees
            | Action::CreateInvite
            | Action::ConsumeInvite => return Err(Error::Forbidden),
            Action::ClockInOut => {
                // Self only; owners and superadmins clock others out.
                if let Some(target) = scope.employee_principal_id.as_deref()
                    && target != principal.id
                {
                    return Err(Error::Forbidden);
                }
            }
            _ => {}
        }

        let Some(restaurant_id) = scope.restaurant_id.as_deref() else {
            return Err(Error::Forbidden);
        };
        if !self
            .assigned_to_restaurant(&principal.id, restaurant_id)
            .await?
        {
            return Err(Error::Forbidden);
        }

        Ok(())
    }

    async fn owns_restaurant(&self, principal_id: &str, restaurant_id: &str) -> Result<bool> {
        let statement = Query::select()
            .column(Restaurant::Id)
            .from(Restaurant::Table)
            .and_where(Expr::col(Restaurant::Id).eq(restaurant_id))
            .and_where(Expr::col(Restaurant::OwnerPrincipalId).eq(principal_id))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let row = sqlx::query_as_with::<_, (String,), _>(&sql, values)
            .fetch_optional(&self.read_db)
            .await?;

        Ok(row.is_some())
    }

    async fn assigned_to_restaurant(
        &self,
        principal_id: &str,
        restaurant_id: &str,
    ) -> Result<bool> {
        let statement = Query::select()
            .column(Employee::Id)
            .from(Employee::Table)
            .and_where(Expr::col(Employee::PrincipalId).eq(principal_id))
            .and_where(Expr::col(Employee::RestaurantId).eq(restaurant_id))
            .and_where(Expr::col(Employee::Active).eq(true))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let row = sqlx::query_as_with::<_, (String,), _>(&sql, values)
            .fetch_optional(&self.read_db)
            .await?;

        Ok(row.is_some())
    }
}

fn authorize_customer(principal: &Principal, action: Action, scope: &ResourceScope) -> Result<()> {
    let self_placed = scope.order_customer_principal_id.as_deref() == Some(principal.id.as_str());

    match action {
        Action::ConsumeInvite => Ok(()),
        // Orders a customer creates are bound to them by the handler.
        Action::CreateOrder => Ok(()),
        Action::ReadOrder | Action::CreatePayment if self_placed => Ok(()),
        Action::CancelOrder if self_placed && scope.order_status.as_deref() == Some("Pending") => {
            Ok(())
        }
        _ => Err(Error::Forbidden),
    }
}
