use foodcourtio_shared::event::DomainEvent;
use foodcourtio_shared::tz::{end_of_local_day, local_date};
use foodcourtio_shared::{Error, Result, conflict, new_id, now_unix, validation};
use serde::Deserialize;
use sqlx::SqliteConnection;
use time::OffsetDateTime;
use validator::Validate;

use crate::WorkforceLedger;
use crate::repository::{self, FindEmployee, ShiftPatch};
use crate::types::{Employee, Shift, ShiftStatus};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScheduleShiftInput {
    pub employee_id: String,
    pub scheduled_start: i64,
    pub scheduled_end: i64,
    #[validate(range(min = 0, max = 480))]
    pub break_minutes: Option<i64>,
    pub notes: Option<String>,
}

/// `effective_minutes = max(0, worked - break)`, pay rounded half-up from
/// minutes x hourly wage. No wage means no pay, not zero pay.
pub fn compute_shift_pay(
    actual_start: i64,
    actual_end: i64,
    break_minutes: i64,
    hourly_wage_minor: Option<i64>,
) -> (i64, Option<i64>) {
    let worked_minutes = (actual_end - actual_start) / 60;
    let effective_minutes = (worked_minutes - break_minutes).max(0);
    let pay_minor = hourly_wage_minor.map(|wage| (effective_minutes * wage + 30) / 60);

    (effective_minutes, pay_minor)
}

impl WorkforceLedger {
    /// Schedules a shift; any non-terminal shift of the employee whose
    /// `[start, end)` intersects the new interval rejects it.
    pub async fn schedule_shift(&self, input: ScheduleShiftInput) -> Result<Shift> {
        input.validate()?;
        if input.scheduled_start >= input.scheduled_end {
            validation!("shift must start before it ends");
        }

        let input = &input;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db().begin().await.map_err(Error::from)?;
            let shift = schedule_in_tx(&mut tx, input).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(shift)
        })
        .await
    }

    /// Clock-in: adopts today's Scheduled shift when there is one,
    /// otherwise opens an on-demand shift running to the end of the local
    /// day. A second clock-in while one is Active conflicts.
    pub async fn clock_in(&self, principal_id: &str) -> Result<Shift> {
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db().begin().await.map_err(Error::from)?;
            let shift = clock_in_tx(&mut tx, principal_id).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(shift)
        })
        .await
    }

    /// Clock-out: completes the Active shift and materializes the pay for
    /// payroll rollups.
    pub async fn clock_out(&self, principal_id: &str) -> Result<Shift> {
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db().begin().await.map_err(Error::from)?;
            let shift = clock_out_tx(&mut tx, principal_id).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(shift)
        })
        .await
    }
}

async fn schedule_in_tx(conn: &mut SqliteConnection, input: &ScheduleShiftInput) -> Result<Shift> {
    let employee = repository::find_employee(&mut *conn, FindEmployee::Id(input.employee_id.clone()))
        .await?
        .filter(|employee| employee.active)
        .ok_or_else(|| Error::NotFound(format!("employee {}", input.employee_id)))?;

    if repository::overlapping_shift_exists(
        &mut *conn,
        &employee.id,
        input.scheduled_start,
        input.scheduled_end,
    )
    .await?
    {
        return Err(Error::OverlappingShift);
    }

    let now = now_unix();
    let shift = Shift {
        id: new_id(),
        employee_id: employee.id.clone(),
        scheduled_start: input.scheduled_start,
        scheduled_end: input.scheduled_end,
        actual_start: None,
        actual_end: None,
        break_minutes: input.break_minutes.unwrap_or(0),
        status: ShiftStatus::Scheduled,
        notes: input.notes.clone(),
        pay_minor: None,
        created_at: now,
        updated_at: now,
    };
    repository::insert_shift(&mut *conn, &shift).await?;

    Ok(shift)
}

async fn clock_in_tx(conn: &mut SqliteConnection, principal_id: &str) -> Result<Shift> {
    let employee = repository::find_employee(
        &mut *conn,
        FindEmployee::ActiveByPrincipal(principal_id.to_owned()),
    )
    .await?
    .ok_or_else(|| Error::NotFound("employee for caller".to_owned()))?;

    if repository::find_active_shift(&mut *conn, &employee.id)
        .await?
        .is_some()
    {
        conflict!("an active shift already exists");
    }

    let timezone = restaurant_timezone(conn, &employee).await?;
    let now = now_unix();
    let now_utc =
        OffsetDateTime::from_unix_timestamp(now).map_err(|err| Error::Server(err.into()))?;
    let today = local_date(&timezone, now_utc)?;

    let scheduled = repository::scheduled_shifts(&mut *conn, &employee.id).await?;
    let todays = scheduled.into_iter().find(|shift| {
        OffsetDateTime::from_unix_timestamp(shift.scheduled_start)
            .ok()
            .and_then(|start| local_date(&timezone, start).ok())
            .is_some_and(|date| date == today)
    });

    let shift = match todays {
        Some(mut shift) => {
            repository::update_shift(
                &mut *conn,
                &shift.id,
                ShiftPatch {
                    status: Some(ShiftStatus::Active),
                    actual_start: Some(now),
                    actual_end: None,
                    pay_minor: None,
                    notes: None,
                },
            )
            .await?;
            shift.status = ShiftStatus::Active;
            shift.actual_start = Some(now);
            shift
        }
        None => {
            let shift = Shift {
                id: new_id(),
                employee_id: employee.id.clone(),
                scheduled_start: now,
                scheduled_end: end_of_local_day(&timezone, now_utc)?,
                actual_start: Some(now),
                actual_end: None,
                break_minutes: 0,
                status: ShiftStatus::Active,
                notes: None,
                pay_minor: None,
                created_at: now,
                updated_at: now,
            };
            repository::insert_shift(&mut *conn, &shift).await?;
            shift
        }
    };

    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::ShiftStarted {
            shift_id: shift.id.clone(),
            employee_id: employee.id.clone(),
            restaurant_id: employee.restaurant_id.clone(),
        },
    )
    .await?;

    Ok(shift)
}

async fn clock_out_tx(conn: &mut SqliteConnection, principal_id: &str) -> Result<Shift> {
    let employee = repository::find_employee(
        &mut *conn,
        FindEmployee::ActiveByPrincipal(principal_id.to_owned()),
    )
    .await?
    .ok_or_else(|| Error::NotFound("employee for caller".to_owned()))?;

    let Some(mut shift) = repository::find_active_shift(&mut *conn, &employee.id).await? else {
        conflict!("no active shift to clock out of");
    };

    let now = now_unix();
    let actual_start = shift.actual_start.unwrap_or(shift.scheduled_start);
    let (minutes_worked, pay_minor) = compute_shift_pay(
        actual_start,
        now,
        shift.break_minutes,
        employee.hourly_wage_minor,
    );

    repository::update_shift(
        &mut *conn,
        &shift.id,
        ShiftPatch {
            status: Some(ShiftStatus::Completed),
            actual_start: None,
            actual_end: Some(now),
            pay_minor: Some(pay_minor),
            notes: None,
        },
    )
    .await?;

    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::ShiftEnded {
            shift_id: shift.id.clone(),
            employee_id: employee.id.clone(),
            restaurant_id: employee.restaurant_id.clone(),
            minutes_worked,
            pay_minor,
        },
    )
    .await?;

    shift.status = ShiftStatus::Completed;
    shift.actual_end = Some(now);
    shift.pay_minor = pay_minor;

    Ok(shift)
}

async fn restaurant_timezone(conn: &mut SqliteConnection, employee: &Employee) -> Result<String> {
    let restaurant = foodcourtio_catalog::find_restaurant(&mut *conn, &employee.restaurant_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("restaurant {}", employee.restaurant_id)))?;

    Ok(restaurant.timezone)
}
