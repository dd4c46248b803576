// src/exchange/client.rs
use crate::domain::errors::ExchangeResult;
use crate::domain::models::{OrderSpec, OrderStatus, Quote};
use crate::exchange::dispatcher::Reply;

/// Order-level interface the trading strategies drive.
///
/// Calls block until the venue answers or the transport gives up. Implementations
/// must not be shared between concurrently running strategies.
pub trait OrderGateway {
    /// Place a new order
    fn place_order(&self, order: &OrderSpec) -> ExchangeResult<Reply<OrderStatus>>;

    /// Cancel an existing order; the reply carries its final state
    fn cancel_order(&self, venue: &str, symbol: &str, id: u64)
        -> ExchangeResult<Reply<OrderStatus>>;

    /// Get order status
    fn order_status(&self, venue: &str, symbol: &str, id: u64)
        -> ExchangeResult<Reply<OrderStatus>>;

    /// Get the latest quote for a stock
    fn quote(&self, venue: &str, symbol: &str) -> ExchangeResult<Reply<Quote>>;
}
