mod command;
pub mod event;
pub mod money;
pub mod principal;
pub mod tz;

pub use command::*;

use uuid::Uuid;

/// Allocates a fresh aggregate identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall clock as unix seconds, the storage representation used by
/// every timestamp column.
pub fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
