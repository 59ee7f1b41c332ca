//! Notification fan-out: consumes domain events off the outbox and
//! persists per-recipient notification rows. The core emits and forgets;
//! delivery transports hang off this table.

mod service;

pub use service::NotificationFanout;
