pub mod adapter;
mod broker;
pub mod repository;
mod types;

pub use broker::{
    CashPaymentInput, CreatePaymentInput, CreatedPayment, PaymentBroker, RefundInput,
    TerminalPaymentInput,
};
pub use types::{Payment, PaymentMethod, PaymentStatus, RefundRecord};
