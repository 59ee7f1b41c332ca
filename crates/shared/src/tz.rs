use anyhow::anyhow;
use time::OffsetDateTime;
use time_tz::ToTimezone;

use crate::{Error, Result};

/// Calendar date in an IANA timezone, formatted `YYYYMMDD`.
pub fn local_date(timezone: &str, now: OffsetDateTime) -> Result<String> {
    let tz = time_tz::timezones::get_by_name(timezone)
        .ok_or_else(|| Error::Server(anyhow!("unknown timezone {timezone}")))?;
    let local = now.to_timezone(tz);

    Ok(format!(
        "{:04}{:02}{:02}",
        local.year(),
        u8::from(local.month()),
        local.day()
    ))
}

/// Unix second of the next local midnight, using the zone's offset at
/// `now`.
pub fn end_of_local_day(timezone: &str, now: OffsetDateTime) -> Result<i64> {
    let tz = time_tz::timezones::get_by_name(timezone)
        .ok_or_else(|| Error::Server(anyhow!("unknown timezone {timezone}")))?;
    let local = now.to_timezone(tz);

    let seconds_into_day =
        local.hour() as i64 * 3600 + local.minute() as i64 * 60 + local.second() as i64;

    Ok(now.unix_timestamp() + (86_400 - seconds_into_day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn local_date_follows_timezone() {
        // 23:30 UTC is already the next day in Yekaterinburg (UTC+5).
        let now = datetime!(2024-03-01 23:30 UTC);
        assert_eq!(local_date("Asia/Yekaterinburg", now).unwrap(), "20240302");
        assert_eq!(local_date("UTC", now).unwrap(), "20240301");
    }

    #[test]
    fn unknown_timezone_is_a_server_error() {
        let now = datetime!(2024-03-01 12:00 UTC);
        assert!(local_date("Mars/Olympus_Mons", now).is_err());
    }

    #[test]
    fn end_of_day_lands_on_local_midnight() {
        let now = datetime!(2024-03-01 10:00 UTC);
        let end = end_of_local_day("UTC", now).unwrap();
        assert_eq!(end, datetime!(2024-03-02 00:00 UTC).unix_timestamp());

        let end = end_of_local_day("Asia/Yekaterinburg", now).unwrap();
        // 15:00 local, nine hours to local midnight.
        assert_eq!(end, now.unix_timestamp() + 9 * 3600);
    }
}
