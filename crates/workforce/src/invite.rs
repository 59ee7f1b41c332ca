use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use foodcourtio_shared::event::DomainEvent;
use foodcourtio_shared::principal::{Principal, Role};
use foodcourtio_shared::{Error, Result, conflict, new_id, not_found, now_unix, validation};
use rand::Rng;
use serde::Deserialize;
use sqlx::SqliteConnection;
use validator::Validate;

use crate::WorkforceLedger;
use crate::repository::{self, map_phone_conflict};
use crate::types::{Employee, EmployeeRole, Invite, InviteStatus};

const TOKEN_BYTES: usize = 32;
const MIN_LIFETIME_SECONDS: i64 = 60;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInviteInput {
    pub restaurant_id: String,
    pub granted_role: EmployeeRole,
    pub hourly_wage_minor: Option<i64>,
    pub expires_at: i64,
    #[validate(range(min = 1, max = 1000))]
    pub max_uses: i64,
    #[serde(skip)]
    pub created_by_principal_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConsumeInviteInput {
    pub token: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 5, max = 20))]
    pub phone: String,
}

impl WorkforceLedger {
    /// Mints a 256-bit URL-safe invite. The caller's scope was already
    /// checked against the restaurant.
    pub async fn create_invite(&self, input: CreateInviteInput) -> Result<Invite> {
        input.validate()?;
        if input.expires_at < now_unix() + MIN_LIFETIME_SECONDS {
            validation!("invite must be valid for at least one minute");
        }

        let mut token_bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut token_bytes);
        let token = URL_SAFE_NO_PAD.encode(token_bytes);

        let invite = Invite {
            id: new_id(),
            token,
            restaurant_id: input.restaurant_id.clone(),
            granted_role: input.granted_role,
            hourly_wage_minor: input.hourly_wage_minor,
            expires_at: input.expires_at,
            max_uses: input.max_uses,
            used_count: 0,
            status: InviteStatus::Active,
            created_by_principal_id: input.created_by_principal_id.clone(),
            created_at: now_unix(),
        };

        let invite_ref = &invite;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db().begin().await.map_err(Error::from)?;
            repository::insert_invite(&mut tx, invite_ref).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(())
        })
        .await?;

        Ok(invite)
    }

    /// Consumes an invite for an authenticated Customer: creates the
    /// employee bound to the principal, bumps the use counter and upgrades
    /// the principal's role. The new role lands in the caller's token at
    /// its next refresh.
    pub async fn consume_invite(
        &self,
        principal: &Principal,
        input: ConsumeInviteInput,
    ) -> Result<Employee> {
        input.validate()?;

        let input = &input;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db().begin().await.map_err(Error::from)?;
            let employee = consume_invite_in_tx(&mut tx, principal, input).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(employee)
        })
        .await
    }
}

async fn consume_invite_in_tx(
    conn: &mut SqliteConnection,
    principal: &Principal,
    input: &ConsumeInviteInput,
) -> Result<Employee> {
    let Some(invite) = repository::find_invite_by_token(&mut *conn, &input.token).await? else {
        not_found!("invite token");
    };

    let now = now_unix();
    if invite.status == InviteStatus::Active && invite.expires_at <= now {
        // Any fetch past the expiry observes Expired.
        repository::update_invite(&mut *conn, &invite.id, invite.used_count, InviteStatus::Expired)
            .await?;
        conflict!("invite token is expired");
    }
    if invite.status != InviteStatus::Active {
        conflict!("invite token is {}", invite.status);
    }
    if invite.used_count >= invite.max_uses {
        conflict!("invite token is exhausted");
    }

    let employee = Employee {
        id: new_id(),
        restaurant_id: invite.restaurant_id.clone(),
        principal_id: Some(principal.id.clone()),
        name: input.name.clone(),
        phone: input.phone.clone(),
        email: None,
        role: invite.granted_role,
        hourly_wage_minor: invite.hourly_wage_minor,
        active: true,
        created_at: now,
        updated_at: now,
    };
    repository::insert_employee(&mut *conn, &employee)
        .await
        .map_err(map_phone_conflict)?;

    let used_count = invite.used_count + 1;
    let status = if used_count >= invite.max_uses {
        InviteStatus::Consumed
    } else {
        InviteStatus::Active
    };
    repository::update_invite(&mut *conn, &invite.id, used_count, status).await?;

    if principal.role == Role::Customer {
        foodcourtio_identity::repository::set_role(&mut *conn, &principal.id, Role::Employee)
            .await?;
    }

    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::InviteConsumed {
            invite_id: invite.id.clone(),
            restaurant_id: invite.restaurant_id.clone(),
            employee_id: employee.id.clone(),
            principal_id: principal.id.clone(),
        },
    )
    .await?;

    Ok(employee)
}
