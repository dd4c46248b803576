// src/exchange/translate.rs
//! Conversion between domain orders and their wire form.
//!
//! The wire spells direction and order type as lowercase hyphenated strings. The
//! mapping is total in both directions for the known values; anything else is
//! treated as protocol drift and fails, never defaulted.

use crate::domain::errors::{ExchangeResult, WireError, WireResult};
use crate::domain::models::{
    null_as_empty, Fill, OrderDirection, OrderList, OrderSpec, OrderStatus, OrderType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    pub account: String,
    pub venue: String,
    pub stock: String,
    pub price: u64,
    pub qty: u64,
    pub direction: String,
    pub order_type: String,
}

/// Order state as the venue reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrderStatus {
    pub id: u64,
    pub account: String,
    pub venue: String,
    pub symbol: String,
    pub direction: String,
    pub order_type: String,
    #[serde(default)]
    pub price: u64,
    pub original_qty: u64,
    pub qty: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fills: Vec<Fill>,
    pub total_filled: u64,
    pub open: bool,
    #[serde(default)]
    pub ts: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireOrderList {
    pub venue: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub orders: Vec<WireOrderStatus>,
}

pub fn direction_to_wire(direction: OrderDirection) -> &'static str {
    match direction {
        OrderDirection::Buy => "buy",
        OrderDirection::Sell => "sell",
    }
}

pub fn direction_from_wire(value: &str) -> WireResult<OrderDirection> {
    match value {
        "buy" => Ok(OrderDirection::Buy),
        "sell" => Ok(OrderDirection::Sell),
        other => Err(WireError::UnrecognizedWireValue {
            field: "direction",
            value: other.to_string(),
        }),
    }
}

pub fn order_type_to_wire(order_type: OrderType) -> &'static str {
    match order_type {
        OrderType::Limit => "limit",
        OrderType::Market => "market",
        OrderType::FillOrKill => "fill-or-kill",
        OrderType::ImmediateOrCancel => "immediate-or-cancel",
    }
}

pub fn order_type_from_wire(value: &str) -> WireResult<OrderType> {
    match value {
        "limit" => Ok(OrderType::Limit),
        "market" => Ok(OrderType::Market),
        "fill-or-kill" => Ok(OrderType::FillOrKill),
        "immediate-or-cancel" => Ok(OrderType::ImmediateOrCancel),
        other => Err(WireError::UnrecognizedWireValue {
            field: "orderType",
            value: other.to_string(),
        }),
    }
}

pub fn encode(order: &OrderSpec) -> WireOrder {
    WireOrder {
        account: order.account().to_string(),
        venue: order.venue().to_string(),
        stock: order.symbol().to_string(),
        price: order.price(),
        qty: order.quantity(),
        direction: direction_to_wire(order.direction()).to_string(),
        order_type: order_type_to_wire(order.order_type()).to_string(),
    }
}

/// Wire order back into a domain order; a zero quantity is refused like any other.
pub fn decode_order(order: WireOrder) -> ExchangeResult<OrderSpec> {
    let direction = direction_from_wire(&order.direction)?;
    let order_type = order_type_from_wire(&order.order_type)?;
    OrderSpec::new(
        &order.account,
        &order.venue,
        &order.stock,
        order.price,
        order.qty,
        direction,
        order_type,
    )
}

pub fn decode_status(status: WireOrderStatus) -> WireResult<OrderStatus> {
    let direction = direction_from_wire(&status.direction)?;
    let order_type = order_type_from_wire(&status.order_type)?;

    let fill_sum: u64 = status.fills.iter().map(|f| f.quantity).sum();
    if fill_sum != status.total_filled {
        log::warn!(
            "Order {} reports totalFilled={} but fills sum to {}",
            status.id,
            status.total_filled,
            fill_sum
        );
    }
    if status.total_filled > status.original_qty {
        log::warn!(
            "Order {} filled {} of an original {}",
            status.id,
            status.total_filled,
            status.original_qty
        );
    }

    Ok(OrderStatus {
        id: status.id,
        account: status.account,
        venue: status.venue,
        symbol: status.symbol,
        direction,
        order_type,
        price: status.price,
        original_quantity: status.original_qty,
        remaining_quantity: status.qty,
        fills: status.fills,
        total_filled: status.total_filled,
        open: status.open,
        ts: status.ts,
    })
}

pub fn decode_list(list: WireOrderList) -> WireResult<OrderList> {
    let orders = list
        .orders
        .into_iter()
        .map(decode_status)
        .collect::<WireResult<Vec<_>>>()?;

    Ok(OrderList {
        venue: list.venue,
        orders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ExchangeError;

    const DIRECTIONS: [OrderDirection; 2] = [OrderDirection::Buy, OrderDirection::Sell];
    const ORDER_TYPES: [OrderType; 4] = [
        OrderType::Limit,
        OrderType::Market,
        OrderType::FillOrKill,
        OrderType::ImmediateOrCancel,
    ];

    fn spec(direction: OrderDirection, order_type: OrderType) -> OrderSpec {
        OrderSpec::new("EXB123456", "TESTEX", "FOOBAR", 2500, 100, direction, order_type)
            .unwrap()
    }

    #[test]
    fn test_every_value_survives_encode_decode() {
        for direction in DIRECTIONS {
            for order_type in ORDER_TYPES {
                let order = spec(direction, order_type);
                assert_eq!(decode_order(encode(&order)).unwrap(), order);
            }
        }
    }

    #[test]
    fn test_decode_order_refuses_zero_quantity() {
        let mut wire = encode(&spec(OrderDirection::Buy, OrderType::Limit));
        wire.qty = 0;
        assert!(matches!(
            decode_order(wire),
            Err(ExchangeError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_decode_order_surfaces_wire_drift() {
        let mut wire = encode(&spec(OrderDirection::Buy, OrderType::Limit));
        wire.direction = "short".to_string();
        assert!(matches!(
            decode_order(wire),
            Err(ExchangeError::Wire(WireError::UnrecognizedWireValue { field: "direction", .. }))
        ));
    }

    #[test]
    fn test_wire_spellings() {
        let wire = encode(&spec(OrderDirection::Sell, OrderType::ImmediateOrCancel));
        assert_eq!(wire.direction, "sell");
        assert_eq!(wire.order_type, "immediate-or-cancel");
        assert_eq!(order_type_to_wire(OrderType::FillOrKill), "fill-or-kill");

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["stock"], "FOOBAR");
        assert_eq!(json["orderType"], "immediate-or-cancel");
        assert_eq!(json["qty"], 100);
    }

    #[test]
    fn test_unknown_wire_values_fail() {
        for bad in ["", "Buy", "BUY", "short", "limit"] {
            assert!(matches!(
                direction_from_wire(bad),
                Err(WireError::UnrecognizedWireValue { field: "direction", .. })
            ));
        }
        for bad in ["", "Limit", "stop", "fill_or_kill", "ioc", "buy"] {
            assert_eq!(
                order_type_from_wire(bad),
                Err(WireError::UnrecognizedWireValue {
                    field: "orderType",
                    value: bad.to_string(),
                })
            );
        }
    }

    #[test]
    fn test_decode_status() {
        let wire: WireOrderStatus = serde_json::from_str(
            r#"{"ok":true,"symbol":"FOOBAR","venue":"TESTEX","direction":"buy",
                "originalQty":100,"qty":20,"price":5100,"orderType":"limit","id":12345,
                "account":"EXB123456","ts":"2015-07-05T22:16:18+00:00",
                "fills":[{"price":5050,"qty":50,"ts":"2015-07-05T22:16:18+00:00"},
                         {"price":5100,"qty":30,"ts":"2015-07-05T22:16:18+00:00"}],
                "totalFilled":80,"open":true}"#,
        )
        .unwrap();

        let status = decode_status(wire).unwrap();
        assert_eq!(status.direction, OrderDirection::Buy);
        assert_eq!(status.order_type, OrderType::Limit);
        assert_eq!(status.remaining_quantity, 20);
        assert_eq!(status.total_filled, 80);
        assert_eq!(status.fill_sum(), 80);
        assert!(status.open);
    }

    #[test]
    fn test_decode_status_rejects_drifted_type() {
        let wire: WireOrderStatus = serde_json::from_str(
            r#"{"symbol":"FOOBAR","venue":"TESTEX","direction":"buy","originalQty":1,
                "qty":1,"price":1,"orderType":"stop-limit","id":1,"account":"A",
                "fills":null,"totalFilled":0,"open":true}"#,
        )
        .unwrap();
        assert!(decode_status(wire).is_err());
    }

    #[test]
    fn test_decode_list_fails_on_any_bad_order() {
        let list: WireOrderList = serde_json::from_str(
            r#"{"ok":true,"venue":"TESTEX","orders":[
                {"symbol":"A","venue":"TESTEX","direction":"sell","originalQty":1,"qty":0,
                 "price":1,"orderType":"market","id":1,"account":"X","fills":[],
                 "totalFilled":1,"open":false},
                {"symbol":"A","venue":"TESTEX","direction":"hold","originalQty":1,"qty":0,
                 "price":1,"orderType":"market","id":2,"account":"X","fills":[],
                 "totalFilled":1,"open":false}]}"#,
        )
        .unwrap();
        assert!(decode_list(list).is_err());
    }
}
