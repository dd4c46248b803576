// src/exchange/stockfighter.rs
use crate::domain::errors::ExchangeResult;
use crate::domain::models::{
    Heartbeat, OrderList, OrderSpec, OrderStatus, Orderbook, Quote, VenueHeartbeat, VenueStocks,
};
use crate::exchange::auth::{AuthStrategy, Credential};
use crate::exchange::client::OrderGateway;
use crate::exchange::command::{CommandRegistry, Operation};
use crate::exchange::dispatcher::{CommandDispatcher, Reply};
use crate::exchange::transport::Transport;
use crate::exchange::translate::{self, WireOrderList, WireOrderStatus};

pub const DEFAULT_API_URL: &str = "https://api.stockfighter.io/ob/api";

/// Trading venue client: header-authenticated, one registry per instance.
pub struct StockFighterClient {
    dispatcher: CommandDispatcher,
}

impl StockFighterClient {
    pub fn new(base_url: &str, api_key: &str, transport: Box<dyn Transport>) -> Self {
        let dispatcher = CommandDispatcher::new(
            base_url,
            CommandRegistry::trading(),
            AuthStrategy::starfighter_header(),
            Credential::new(api_key),
            transport,
        );

        Self { dispatcher }
    }

    /// Is the API up at all. Any failure reads as "no".
    pub fn heartbeat(&self) -> ExchangeResult<bool> {
        let reply: Reply<Heartbeat> = self.dispatcher.get(Operation::Heartbeat, &[])?;
        Ok(reply.is_success())
    }

    pub fn venue_heartbeat(&self, venue: &str) -> ExchangeResult<bool> {
        let reply: Reply<VenueHeartbeat> =
            self.dispatcher.get(Operation::VenueHeartbeat, &[venue])?;
        Ok(reply.is_success())
    }

    pub fn stocks(&self, venue: &str) -> ExchangeResult<Reply<VenueStocks>> {
        self.dispatcher.get(Operation::ListStocks, &[venue])
    }

    pub fn orderbook(&self, venue: &str, symbol: &str) -> ExchangeResult<Reply<Orderbook>> {
        self.dispatcher.get(Operation::GetOrderbook, &[venue, symbol])
    }

    pub fn account_orders(&self, venue: &str, account: &str) -> ExchangeResult<Reply<OrderList>> {
        let reply: Reply<WireOrderList> =
            self.dispatcher.get(Operation::ListOrders, &[venue, account])?;
        Ok(reply.try_map(translate::decode_list)?)
    }

    pub fn account_stock_orders(
        &self,
        venue: &str,
        account: &str,
        symbol: &str,
    ) -> ExchangeResult<Reply<OrderList>> {
        let reply: Reply<WireOrderList> = self
            .dispatcher
            .get(Operation::ListStockOrders, &[venue, account, symbol])?;
        Ok(reply.try_map(translate::decode_list)?)
    }
}

impl OrderGateway for StockFighterClient {
    fn place_order(&self, order: &OrderSpec) -> ExchangeResult<Reply<OrderStatus>> {
        let wire = translate::encode(order);
        log::debug!("Placing {}", order);

        let reply: Reply<WireOrderStatus> = self.dispatcher.post(
            Operation::PlaceOrder,
            Some(&wire),
            &[order.venue(), order.symbol()],
        )?;
        Ok(reply.try_map(translate::decode_status)?)
    }

    fn cancel_order(
        &self,
        venue: &str,
        symbol: &str,
        id: u64,
    ) -> ExchangeResult<Reply<OrderStatus>> {
        let id = id.to_string();
        let reply: Reply<WireOrderStatus> = self
            .dispatcher
            .delete(Operation::CancelOrder, &[venue, symbol, id.as_str()])?;
        Ok(reply.try_map(translate::decode_status)?)
    }

    fn order_status(
        &self,
        venue: &str,
        symbol: &str,
        id: u64,
    ) -> ExchangeResult<Reply<OrderStatus>> {
        let id = id.to_string();
        let reply: Reply<WireOrderStatus> = self
            .dispatcher
            .get(Operation::GetOrderStatus, &[venue, symbol, id.as_str()])?;
        Ok(reply.try_map(translate::decode_status)?)
    }

    fn quote(&self, venue: &str, symbol: &str) -> ExchangeResult<Reply<Quote>> {
        self.dispatcher.get(Operation::GetQuote, &[venue, symbol])
    }
}
