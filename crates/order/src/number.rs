use foodcourtio_shared::{Error, Result};
use sqlx::SqliteConnection;

pub use foodcourtio_shared::tz::local_date;

/// Next order number for `(restaurant, local day)`, formatted
/// `YYYYMMDD-NNN`. The counter row is created or incremented inside the
/// caller's transaction, so a crash before the order insert commits leaves
/// no gap and concurrent creators serialize on the row.
pub async fn allocate(
    conn: &mut SqliteConnection,
    restaurant_id: &str,
    local_date: &str,
) -> Result<String> {
    let (value,): (i64,) = sqlx::query_as(
        r#"INSERT INTO order_number_counter (restaurant_id, local_date, value)
           VALUES (?1, ?2, 1)
           ON CONFLICT (restaurant_id, local_date) DO UPDATE SET value = value + 1
           RETURNING value"#,
    )
    .bind(restaurant_id)
    .bind(local_date)
    .fetch_one(conn)
    .await
    .map_err(Error::from)?;

    Ok(format!("{local_date}-{value:03}"))
}
