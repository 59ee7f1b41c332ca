use foodcourtio_shared::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use sqlx::prelude::FromRow;

/// Per-employee aggregate over Completed shifts in a period.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PayrollLine {
    pub employee_id: String,
    pub employee_name: String,
    pub shifts: i64,
    pub minutes_worked: i64,
    pub pay_minor: Option<i64>,
}

/// Rollup over `[from, to)` by clock-out time. Shifts without a wage
/// contribute worked minutes but no pay.
pub async fn payroll_rollup(
    pool: &SqlitePool,
    restaurant_id: &str,
    from: i64,
    to: i64,
) -> Result<Vec<PayrollLine>> {
    let lines = sqlx::query_as::<_, PayrollLine>(
        r#"SELECT
               employee.id AS employee_id,
               employee.name AS employee_name,
               COUNT(shift.id) AS shifts,
               COALESCE(SUM(MAX(0, (shift.actual_end - shift.actual_start) / 60 - shift.break_minutes)), 0) AS minutes_worked,
               SUM(shift.pay_minor) AS pay_minor
           FROM shift
           JOIN employee ON employee.id = shift.employee_id
           WHERE employee.restaurant_id = ?1
             AND shift.status = 'Completed'
             AND shift.actual_end >= ?2
             AND shift.actual_end < ?3
           GROUP BY employee.id, employee.name
           ORDER BY employee.name"#,
    )
    .bind(restaurant_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .map_err(foodcourtio_shared::Error::from)?;

    Ok(lines)
}
