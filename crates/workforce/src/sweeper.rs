use foodcourtio_shared::event::DomainEvent;
use foodcourtio_shared::{Error, Result, new_id, now_unix};
use foodcourtio_store::TickHandler;
use sqlx::{SqliteConnection, SqlitePool};
use time::OffsetDateTime;

use crate::repository::{self, FindEmployee, ShiftPatch};
use crate::types::ShiftStatus;

const NO_SHOW_GRACE_SECONDS: i64 = 15 * 60;
const REMINDER_WINDOW_SECONDS: i64 = 60 * 60;

/// Marks Scheduled shifts that never started within the grace window as
/// Cancelled no-shows and emits `ShiftMissed` for the notification side.
pub struct MissedShiftSweeper {
    write_db: SqlitePool,
}

impl MissedShiftSweeper {
    pub fn new(write_db: SqlitePool) -> Self {
        Self { write_db }
    }
}

#[async_trait::async_trait]
impl TickHandler for MissedShiftSweeper {
    fn name(&self) -> &'static str {
        "missed_shift_sweeper"
    }

    async fn tick(&self, now: OffsetDateTime) -> anyhow::Result<()> {
        let cutoff = now.unix_timestamp() - NO_SHOW_GRACE_SECONDS;
        let candidates = repository::shifts_past_grace(&self.write_db, cutoff).await?;

        for candidate in candidates {
            let shift_id = candidate.id.as_str();
            let outcome = foodcourtio_store::with_retry(|| async move {
                let mut tx = self.write_db.begin().await.map_err(Error::from)?;
                sweep_shift(&mut tx, shift_id).await?;
                tx.commit().await.map_err(Error::from)?;

                Ok(())
            })
            .await;

            if let Err(err) = outcome {
                tracing::error!(shift_id = %candidate.id, err = %err, "missed-shift sweep failed");
            }
        }

        Ok(())
    }
}

async fn sweep_shift(conn: &mut SqliteConnection, shift_id: &str) -> Result<()> {
    // Re-check inside the transaction; the employee may have clocked in
    // since the scan.
    let Some(shift) = repository::find_shift(&mut *conn, shift_id).await? else {
        return Ok(());
    };
    if shift.status != ShiftStatus::Scheduled || shift.actual_start.is_some() {
        return Ok(());
    }

    repository::update_shift(
        &mut *conn,
        &shift.id,
        ShiftPatch {
            status: Some(ShiftStatus::Cancelled),
            actual_start: None,
            actual_end: None,
            pay_minor: None,
            notes: Some("NoShow".to_owned()),
        },
    )
    .await?;

    let Some(employee) =
        repository::find_employee(&mut *conn, FindEmployee::Id(shift.employee_id.clone())).await?
    else {
        return Ok(());
    };

    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::ShiftMissed {
            shift_id: shift.id.clone(),
            employee_id: employee.id.clone(),
            restaurant_id: employee.restaurant_id.clone(),
        },
    )
    .await?;

    Ok(())
}

/// Writes a reminder notification for shifts starting within the next
/// hour; the dedupe key makes repeated ticks idempotent.
pub struct ShiftReminder {
    write_db: SqlitePool,
}

impl ShiftReminder {
    pub fn new(write_db: SqlitePool) -> Self {
        Self { write_db }
    }
}

#[async_trait::async_trait]
impl TickHandler for ShiftReminder {
    fn name(&self) -> &'static str {
        "shift_reminder"
    }

    async fn tick(&self, now: OffsetDateTime) -> anyhow::Result<()> {
        let from = now.unix_timestamp();
        let upcoming =
            repository::shifts_starting_between(&self.write_db, from, from + REMINDER_WINDOW_SECONDS)
                .await?;

        for shift in upcoming {
            let mut conn = self.write_db.acquire().await?;
            let Some(employee) =
                repository::find_employee(&mut conn, FindEmployee::Id(shift.employee_id.clone()))
                    .await?
            else {
                continue;
            };

            let result = sqlx::query(
                r#"INSERT INTO notification (id, dedupe_key, recipient_principal_id, kind, body, created_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                   ON CONFLICT (dedupe_key) DO NOTHING"#,
            )
            .bind(new_id())
            .bind(format!("shift_reminder:{}", shift.id))
            .bind(employee.principal_id.as_deref())
            .bind("ShiftReminder")
            .bind(format!(
                "Shift for {} starts at {}",
                employee.name, shift.scheduled_start
            ))
            .bind(now_unix())
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 1 {
                tracing::info!(shift_id = %shift.id, employee_id = %employee.id, "shift reminder queued");
            }
        }

        Ok(())
    }
}
