use foodcourtio_shared::principal::Role;
use foodcourtio_shared::{Error, now_unix};
use foodcourtio_workforce::{ConsumeInviteInput, CreateInviteInput, EmployeeRole, InviteStatus};

mod helpers;

fn invite_input(restaurant_id: &str, max_uses: i64) -> CreateInviteInput {
    CreateInviteInput {
        restaurant_id: restaurant_id.to_owned(),
        granted_role: EmployeeRole::Waiter,
        hourly_wage_minor: Some(900),
        expires_at: now_unix() + 3600,
        max_uses,
        created_by_principal_id: "p-owner".to_owned(),
    }
}

fn consume_input(token: &str, phone: &str) -> ConsumeInviteInput {
    ConsumeInviteInput {
        token: token.to_owned(),
        name: "New Hire".to_owned(),
        phone: phone.to_owned(),
    }
}

#[tokio::test]
async fn consume_creates_employee_and_upgrades_role() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let customer = helpers::seed_principal(&fx.pool, Role::Customer).await?;

    let invite = fx.ledger.create_invite(invite_input(&fx.restaurant_id, 1)).await?;
    assert_eq!(invite.status, InviteStatus::Active);
    // 256-bit token, URL-safe base64 without padding.
    assert_eq!(invite.token.len(), 43);

    let employee = fx
        .ledger
        .consume_invite(&customer, consume_input(&invite.token, "+79001112233"))
        .await?;
    assert_eq!(employee.restaurant_id, fx.restaurant_id);
    assert_eq!(employee.role, EmployeeRole::Waiter);
    assert_eq!(employee.hourly_wage_minor, Some(900));
    assert_eq!(employee.principal_id.as_deref(), Some(customer.id.as_str()));

    let (role,): (String,) = sqlx::query_as("SELECT role FROM principal WHERE id = ?1")
        .bind(&customer.id)
        .fetch_one(&fx.pool)
        .await?;
    assert_eq!(role, "Employee");

    let kinds: Vec<&str> = foodcourtio_store::fetch_after(&fx.pool, 0, 10)
        .await?
        .iter()
        .map(|event| event.event.kind())
        .collect();
    assert_eq!(kinds, ["InviteConsumed"]);

    Ok(())
}

#[tokio::test]
async fn consumption_stops_exactly_at_max_uses() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let invite = fx.ledger.create_invite(invite_input(&fx.restaurant_id, 2)).await?;

    let mut successes = 0;
    for n in 0..3 {
        let customer = helpers::seed_principal(&fx.pool, Role::Customer).await?;
        let result = fx
            .ledger
            .consume_invite(
                &customer,
                consume_input(&invite.token, &format!("+7900000000{n}")),
            )
            .await;

        match result {
            Ok(_) => successes += 1,
            Err(Error::Conflict(_)) => {}
            Err(other) => return Err(other.into()),
        }
    }

    assert_eq!(successes, 2);

    let (status, used): (String, i64) =
        sqlx::query_as("SELECT status, used_count FROM invite_token WHERE id = ?1")
            .bind(&invite.id)
            .fetch_one(&fx.pool)
            .await?;
    assert_eq!(status, "Consumed");
    assert_eq!(used, 2);

    Ok(())
}

#[tokio::test]
async fn expired_invite_is_observed_expired() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let invite = fx.ledger.create_invite(invite_input(&fx.restaurant_id, 1)).await?;

    sqlx::query("UPDATE invite_token SET expires_at = ?1 WHERE id = ?2")
        .bind(now_unix() - 10)
        .bind(&invite.id)
        .execute(&fx.pool)
        .await?;

    let customer = helpers::seed_principal(&fx.pool, Role::Customer).await?;
    let result = fx
        .ledger
        .consume_invite(&customer, consume_input(&invite.token, "+79001112233"))
        .await;
    assert!(matches!(result, Err(Error::Conflict(_))));

    let (status,): (String,) =
        sqlx::query_as("SELECT status FROM invite_token WHERE id = ?1")
            .bind(&invite.id)
            .fetch_one(&fx.pool)
            .await?;
    assert_eq!(status, "Expired");

    Ok(())
}

#[tokio::test]
async fn immediate_expiry_is_rejected_at_creation() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;

    let mut input = invite_input(&fx.restaurant_id, 1);
    input.expires_at = now_unix() + 5;
    let result = fx.ledger.create_invite(input).await;

    assert!(matches!(result, Err(Error::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn unknown_token_is_not_found() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let customer = helpers::seed_principal(&fx.pool, Role::Customer).await?;

    let result = fx
        .ledger
        .consume_invite(&customer, consume_input("nope", "+79001112233"))
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn duplicate_active_phone_is_rejected() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let invite = fx.ledger.create_invite(invite_input(&fx.restaurant_id, 5)).await?;

    let first = helpers::seed_principal(&fx.pool, Role::Customer).await?;
    fx.ledger
        .consume_invite(&first, consume_input(&invite.token, "+79001112233"))
        .await?;

    let second = helpers::seed_principal(&fx.pool, Role::Customer).await?;
    let result = fx
        .ledger
        .consume_invite(&second, consume_input(&invite.token, "+79001112233"))
        .await;
    assert!(matches!(result, Err(Error::AlreadyExists(_))));

    // The failed consumption must not burn a use.
    let (used,): (i64,) =
        sqlx::query_as("SELECT used_count FROM invite_token WHERE id = ?1")
            .bind(&invite.id)
            .fetch_one(&fx.pool)
            .await?;
    assert_eq!(used, 1);

    Ok(())
}
