use foodcourtio_shared::now_unix;
use foodcourtio_workforce::payroll_rollup;

mod helpers;

async fn seed_completed_shift(
    pool: &sqlx::SqlitePool,
    employee_id: &str,
    start: i64,
    minutes: i64,
    break_minutes: i64,
    pay_minor: Option<i64>,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO shift (id, employee_id, scheduled_start, scheduled_end, actual_start,
                            actual_end, break_minutes, status, notes, pay_minor, created_at,
                            updated_at)
         VALUES (?1, ?2, ?3, ?4, ?3, ?4, ?5, 'Completed', NULL, ?6, ?3, ?4)",
    )
    .bind(foodcourtio_shared::new_id())
    .bind(employee_id)
    .bind(start)
    .bind(start + minutes * 60)
    .bind(break_minutes)
    .bind(pay_minor)
    .execute(pool)
    .await?;

    Ok(())
}

#[tokio::test]
async fn rollup_sums_completed_shifts_per_employee() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let (cook, _) = helpers::seed_employee(&fx.pool, &fx.restaurant_id, Some(1200)).await?;
    let (waiter, _) = helpers::seed_employee(&fx.pool, &fx.restaurant_id, None).await?;

    let base = now_unix() - 7 * 24 * 3600;
    seed_completed_shift(&fx.pool, &cook, base, 480, 30, Some(9000)).await?;
    seed_completed_shift(&fx.pool, &cook, base + 24 * 3600, 240, 0, Some(4800)).await?;
    seed_completed_shift(&fx.pool, &waiter, base, 120, 0, None).await?;

    let lines = payroll_rollup(&fx.pool, &fx.restaurant_id, base - 3600, now_unix()).await?;
    assert_eq!(lines.len(), 2);

    let cook_line = lines.iter().find(|line| line.employee_id == cook).unwrap();
    assert_eq!(cook_line.shifts, 2);
    assert_eq!(cook_line.minutes_worked, 450 + 240);
    assert_eq!(cook_line.pay_minor, Some(13_800));

    let waiter_line = lines.iter().find(|line| line.employee_id == waiter).unwrap();
    assert_eq!(waiter_line.shifts, 1);
    assert_eq!(waiter_line.minutes_worked, 120);
    assert_eq!(waiter_line.pay_minor, None);

    Ok(())
}

#[tokio::test]
async fn rollup_is_bounded_by_the_period() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let (cook, _) = helpers::seed_employee(&fx.pool, &fx.restaurant_id, Some(1200)).await?;

    let inside = now_unix() - 24 * 3600;
    let outside = now_unix() - 40 * 24 * 3600;
    seed_completed_shift(&fx.pool, &cook, inside, 60, 0, Some(1200)).await?;
    seed_completed_shift(&fx.pool, &cook, outside, 60, 0, Some(1200)).await?;

    let lines = payroll_rollup(
        &fx.pool,
        &fx.restaurant_id,
        now_unix() - 7 * 24 * 3600,
        now_unix(),
    )
    .await?;

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].shifts, 1);

    Ok(())
}

#[tokio::test]
async fn other_restaurants_stay_out_of_the_rollup() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let other_restaurant = helpers::seed_restaurant(&fx.pool, "UTC").await?;
    let (mine, _) = helpers::seed_employee(&fx.pool, &fx.restaurant_id, Some(1000)).await?;
    let (theirs, _) = helpers::seed_employee(&fx.pool, &other_restaurant, Some(1000)).await?;

    let base = now_unix() - 24 * 3600;
    seed_completed_shift(&fx.pool, &mine, base, 60, 0, Some(1000)).await?;
    seed_completed_shift(&fx.pool, &theirs, base, 60, 0, Some(1000)).await?;

    let lines = payroll_rollup(&fx.pool, &fx.restaurant_id, base - 3600, now_unix()).await?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].employee_id, mine);

    Ok(())
}
