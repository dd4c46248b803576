// src/domain/models.rs
use crate::domain::errors::{ExchangeError, ExchangeResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;

/// Prices on the venue are integer cents.
pub fn cents_to_dollars(cents: u64) -> Decimal {
    Decimal::from(cents) / Decimal::ONE_HUNDRED
}

/// Core Trading Components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    Buy,
    Sell,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OrderDirection::Buy => write!(f, "BUY"),
            OrderDirection::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    Limit,
    Market,
    FillOrKill,
    ImmediateOrCancel,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
            OrderType::FillOrKill => write!(f, "FOK"),
            OrderType::ImmediateOrCancel => write!(f, "IOC"),
        }
    }
}

/// An order as a strategy describes it, before it is put on the wire.
///
/// Only [`OrderSpec::new`] builds one, so the quantity is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    account: String,
    venue: String,
    symbol: String,
    price: u64,
    quantity: u64,
    direction: OrderDirection,
    order_type: OrderType,
}

impl OrderSpec {
    pub fn new(
        account: &str,
        venue: &str,
        symbol: &str,
        price: u64,
        quantity: u64,
        direction: OrderDirection,
        order_type: OrderType,
    ) -> ExchangeResult<Self> {
        if quantity == 0 {
            return Err(ExchangeError::InvalidOrder(format!(
                "{} {} on {} with zero quantity",
                direction, symbol, venue
            )));
        }

        Ok(Self {
            account: account.to_string(),
            venue: venue.to_string(),
            symbol: symbol.to_string(),
            price,
            quantity,
            direction,
            order_type,
        })
    }

    /// Same order with a different size; used when the remaining quantity shrinks.
    pub fn with_quantity(&self, quantity: u64) -> ExchangeResult<Self> {
        Self::new(
            &self.account,
            &self.venue,
            &self.symbol,
            self.price,
            quantity,
            self.direction,
            self.order_type,
        )
    }

    /// Same order at another price. Market orders still carry one on the wire.
    pub fn with_price(mut self, price: u64) -> Self {
        self.price = price;
        self
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn venue(&self) -> &str {
        &self.venue
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Price in cents.
    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}@{} on {} ({})",
            self.order_type,
            self.direction,
            self.quantity,
            self.symbol,
            cents_to_dollars(self.price),
            self.venue,
            self.account
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Fill {
    pub price: u64,
    #[serde(rename = "qty")]
    pub quantity: u64,
    pub ts: DateTime<Utc>,
}

/// Order state as reported by the venue, with direction and type already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatus {
    pub id: u64,
    pub account: String,
    pub venue: String,
    pub symbol: String,
    pub direction: OrderDirection,
    pub order_type: OrderType,
    pub price: u64,
    pub original_quantity: u64,
    pub remaining_quantity: u64,
    pub fills: Vec<Fill>,
    pub total_filled: u64,
    pub open: bool,
    pub ts: Option<DateTime<Utc>>,
}

impl OrderStatus {
    pub fn fill_sum(&self) -> u64 {
        self.fills.iter().map(|f| f.quantity).sum()
    }

    /// Quantity-weighted fill price in cents, if anything filled.
    pub fn average_fill_price(&self) -> Option<Decimal> {
        let filled = self.fill_sum();
        if filled == 0 {
            return None;
        }
        let notional: Decimal = self
            .fills
            .iter()
            .map(|f| Decimal::from(f.price) * Decimal::from(f.quantity))
            .sum();
        Some(notional / Decimal::from(filled))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderList {
    pub venue: String,
    pub orders: Vec<OrderStatus>,
}

/// Market Data Structures
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Heartbeat {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueHeartbeat {
    pub venue: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Stock {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueStocks {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub symbols: Vec<Stock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookEntry {
    pub price: u64,
    #[serde(rename = "qty")]
    pub quantity: u64,
    pub is_buy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Orderbook {
    pub venue: String,
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bids: Vec<BookEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub asks: Vec<BookEntry>,
    pub ts: DateTime<Utc>,
}

impl Orderbook {
    pub fn best_bid(&self) -> Option<&BookEntry> {
        self.bids.iter().max_by_key(|e| e.price)
    }

    pub fn best_ask(&self) -> Option<&BookEntry> {
        self.asks.iter().min_by_key(|e| e.price)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub venue: String,
    pub symbol: String,
    #[serde(default)]
    pub bid: Option<u64>,
    #[serde(default)]
    pub ask: Option<u64>,
    #[serde(default)]
    pub bid_size: u64,
    #[serde(default)]
    pub ask_size: u64,
    #[serde(default)]
    pub bid_depth: u64,
    #[serde(default)]
    pub ask_depth: u64,
    #[serde(default)]
    pub last: Option<u64>,
    #[serde(default)]
    pub last_size: Option<u64>,
    #[serde(default)]
    pub last_trade: Option<DateTime<Utc>>,
    pub quote_time: DateTime<Utc>,
}

/// Game-master structures
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedLevel {
    pub account: String,
    pub instance_id: u64,
    #[serde(default)]
    pub instructions: BTreeMap<String, String>,
    #[serde(default)]
    pub seconds_per_trading_day: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tickers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub venues: Vec<String>,
    #[serde(default)]
    pub balances: BTreeMap<String, i64>,
}

impl StartedLevel {
    /// The first venue/ticker pair, which is all the early levels ever hand out.
    pub fn primary_market(&self) -> Option<(&str, &str)> {
        let venue = self.venues.first()?;
        let ticker = self.tickers.first()?;
        Some((venue.as_str(), ticker.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceProgress {
    pub end_of_the_world_day: u64,
    pub trading_day: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceDetails {
    pub id: u64,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub details: Option<InstanceProgress>,
}

/// Acknowledgement for stop/resume/restart.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelAck {
    #[serde(default)]
    pub instance_id: Option<u64>,
}

/// The venue sends `null` rather than `[]` for empty lists.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cents_to_dollars() {
        assert_eq!(cents_to_dollars(5025), dec!(50.25));
        assert_eq!(cents_to_dollars(0), dec!(0));
        // Beyond i64 range.
        assert_eq!(cents_to_dollars(u64::MAX), dec!(184467440737095516.15));
    }

    #[test]
    fn test_order_spec_rejects_zero_quantity() {
        let result = OrderSpec::new(
            "EXB123456",
            "TESTEX",
            "FOOBAR",
            100,
            0,
            OrderDirection::Buy,
            OrderType::Limit,
        );
        assert!(matches!(result, Err(ExchangeError::InvalidOrder(_))));
    }

    #[test]
    fn test_order_spec_with_quantity_keeps_other_fields() {
        let spec = OrderSpec::new(
            "EXB123456",
            "TESTEX",
            "FOOBAR",
            100,
            50,
            OrderDirection::Sell,
            OrderType::ImmediateOrCancel,
        )
        .unwrap();
        let smaller = spec.with_quantity(7).unwrap();
        assert_eq!(smaller.quantity(), 7);
        assert_eq!(smaller.price(), 100);
        assert_eq!(smaller.direction(), OrderDirection::Sell);
        assert!(spec.with_quantity(0).is_err());

        let repriced = smaller.with_price(125);
        assert_eq!(repriced.price(), 125);
        assert_eq!(repriced.quantity(), 7);
    }

    #[test]
    fn test_orderbook_null_sides_become_empty() {
        let book: Orderbook = serde_json::from_str(
            r#"{"ok":true,"venue":"OGEX","symbol":"FAC","bids":null,
                "asks":[{"price":5200,"qty":10,"isBuy":false},{"price":5100,"qty":3,"isBuy":false}],
                "ts":"2015-12-04T09:02:16.680986205Z"}"#,
        )
        .unwrap();
        assert!(book.bids.is_empty());
        assert!(book.best_bid().is_none());
        assert_eq!(book.best_ask().map(|e| e.price), Some(5100));
    }

    #[test]
    fn test_average_fill_price() {
        let ts = Utc::now();
        let status = OrderStatus {
            id: 1,
            account: "A".into(),
            venue: "V".into(),
            symbol: "S".into(),
            direction: OrderDirection::Buy,
            order_type: OrderType::Limit,
            price: 100,
            original_quantity: 30,
            remaining_quantity: 0,
            fills: vec![
                Fill { price: 100, quantity: 10, ts },
                Fill { price: 130, quantity: 20, ts },
            ],
            total_filled: 30,
            open: false,
            ts: None,
        };
        assert_eq!(status.fill_sum(), 30);
        assert_eq!(status.average_fill_price(), Some(dec!(120)));

        // price * qty overflows u64 but not Decimal.
        let large = OrderStatus {
            fills: vec![Fill { price: u64::MAX / 2, quantity: 4, ts }],
            ..status
        };
        assert_eq!(large.average_fill_price(), Some(Decimal::from(u64::MAX / 2)));
    }

    #[test]
    fn test_started_level_primary_market() {
        let level: StartedLevel = serde_json::from_str(
            r#"{"ok":true,"account":"EXB123456","instanceId":1234,
                "instructions":{"Instructions":"buy","Order Types":"limit"},
                "secondsPerTradingDay":5,"tickers":["FOOBAR"],"venues":["TESTEX"],
                "balances":{"USD":0}}"#,
        )
        .unwrap();
        assert_eq!(level.primary_market(), Some(("TESTEX", "FOOBAR")));
        assert_eq!(level.instructions.get("Order Types").map(String::as_str), Some("limit"));
    }
}
