mod dispatcher;
mod lease;
mod outbox;
mod ticker;
mod tx;

pub use dispatcher::{Dispatcher, DispatcherHandle, Subscriber};
pub use lease::acquire_lease;
pub use outbox::{append, fetch_after};
pub use ticker::{TickHandler, start_ticker};
pub use tx::{with_retry, with_tx};
