// src/domain/mod.rs
pub mod errors;
pub mod models;

// Re-export common types for convenience
pub use errors::{
    AppError, AppResult, CommandError, ExchangeError, ExchangeResult, TradingError, TradingResult,
    TransportError, WireError,
};
pub use models::{
    cents_to_dollars, Fill, OrderDirection, OrderList, OrderSpec, OrderStatus, OrderType,
};
