mod auth;
mod rate_limit;

pub use auth::CurrentPrincipal;
pub use rate_limit::{RateLimiter, rate_limit_middleware};
