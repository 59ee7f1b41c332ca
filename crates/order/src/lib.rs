mod command;
mod number;
pub mod query;
mod repository;
mod types;

pub use command::{
    BulkItemResult, CreateOrderInput, CreateOrderItemInput, OrderEngine, RefundPort,
};
pub use number::local_date;
pub use types::{DeliveryType, Order, OrderItem, OrderStatus};
