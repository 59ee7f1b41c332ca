use serde_json::Value;

/// Stable error taxonomy shared by every command surface. The `code` string
/// sent over the wire comes from [`Error::code`], never from `Display`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Validation(String),

    #[error("illegal transition {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    #[error("overlapping shift")]
    OverlappingShift,

    #[error("payment already exists for order {0}")]
    PaymentAlreadyExists(String),

    #[error("refund failed: {0}")]
    RefundFailed(String),

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("invalid webhook signature")]
    InvalidWebhookSignature,

    #[error("rate limited")]
    RateLimited,

    #[error("{0}")]
    Server(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable taxonomy name carried in the `code` field of error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthenticated => "Unauthenticated",
            Error::Forbidden => "Forbidden",
            Error::NotFound(_) => "NotFound",
            Error::Conflict(_) => "Conflict",
            Error::AlreadyExists(_) => "AlreadyExists",
            Error::Validation(_) => "ValidationFailed",
            Error::IllegalTransition { .. } => "IllegalTransition",
            Error::OverlappingShift => "OverlappingShift",
            Error::PaymentAlreadyExists(_) => "PaymentAlreadyExists",
            Error::RefundFailed(_) => "RefundFailed",
            Error::ProviderUnavailable(_) => "ProviderUnavailable",
            Error::InvalidWebhookSignature => "InvalidWebhookSignature",
            Error::RateLimited => "RateLimited",
            Error::Server(_) => "Internal",
        }
    }

    /// Extra payload for error responses; per-item results of bulk
    /// operations and validation field breakdowns land here.
    pub fn details(&self) -> Option<Value> {
        None
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(value: validator::ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        Self::Server(value.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Server(value.into())
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(value: std::num::TryFromIntError) -> Self {
        Self::Server(value.into())
    }
}

#[macro_export]
macro_rules! validation {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Validation(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Validation(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! not_found {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::NotFound(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::NotFound(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! conflict {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Conflict(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Conflict(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! server {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Server(anyhow::anyhow!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Server(anyhow::anyhow!($fmt, $($arg)*)))
    };
}
