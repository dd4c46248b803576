// src/exchange/command.rs
use crate::domain::errors::{CommandError, CommandResult};
use std::collections::HashMap;
use std::fmt;

/// Logical command identity, independent of request/response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Heartbeat,
    VenueHeartbeat,
    ListStocks,
    GetOrderbook,
    GetQuote,
    PlaceOrder,
    GetOrderStatus,
    CancelOrder,
    ListOrders,
    ListStockOrders,
    StartLevel,
    StopLevel,
    ResumeLevel,
    RestartLevel,
    InstanceDetails,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Heartbeat => "heartbeat",
            Operation::VenueHeartbeat => "venue-heartbeat",
            Operation::ListStocks => "list-stocks",
            Operation::GetOrderbook => "get-orderbook",
            Operation::GetQuote => "get-quote",
            Operation::PlaceOrder => "place-order",
            Operation::GetOrderStatus => "get-order-status",
            Operation::CancelOrder => "cancel-order",
            Operation::ListOrders => "list-orders",
            Operation::ListStockOrders => "list-stock-orders",
            Operation::StartLevel => "start-level",
            Operation::StopLevel => "stop-level",
            Operation::ResumeLevel => "resume-level",
            Operation::RestartLevel => "restart-level",
            Operation::InstanceDetails => "instance-details",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(usize),
}

/// A path with positional `{n}` placeholders, parsed once at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
    segments: Vec<Segment>,
    arity: usize,
}

impl UrlTemplate {
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut arity = 0;
        let mut rest = raw;

        while let Some(open) = rest.find('{') {
            let placeholder = rest[open + 1..].find('}').and_then(|close| {
                let end = open + 1 + close;
                rest[open + 1..end].parse::<usize>().ok().map(|index| (index, end))
            });

            match placeholder {
                Some((index, end)) => {
                    literal.push_str(&rest[..open]);
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(index));
                    arity = arity.max(index + 1);
                    rest = &rest[end + 1..];
                }
                None => {
                    // Not a placeholder; keep the brace as text.
                    literal.push_str(&rest[..=open]);
                    rest = &rest[open + 1..];
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            raw: raw.to_string(),
            segments,
            arity,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn render(&self, args: &[&str]) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(index) => out.push_str(args[*index]),
            }
        }
        out
    }
}

/// Per-client table from operation to endpoint template.
///
/// Built by chaining [`CommandRegistry::register`] and then moved into a dispatcher;
/// nothing can add to it after that.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<Operation, UrlTemplate>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, operation: Operation, template: &str) -> Self {
        let parsed = UrlTemplate::parse(template);
        if let Some(previous) = self.commands.insert(operation, parsed) {
            log::warn!(
                "Operation {} re-registered; replacing {}",
                operation,
                previous.as_str()
            );
        }
        self
    }

    /// Endpoints of the trading venue API.
    pub fn trading() -> Self {
        Self::new()
            .register(Operation::Heartbeat, "/heartbeat")
            .register(Operation::VenueHeartbeat, "/venues/{0}/heartbeat")
            .register(Operation::ListStocks, "/venues/{0}/stocks")
            .register(Operation::GetOrderbook, "/venues/{0}/stocks/{1}")
            .register(Operation::GetQuote, "/venues/{0}/stocks/{1}/quote")
            .register(Operation::PlaceOrder, "/venues/{0}/stocks/{1}/orders")
            .register(Operation::GetOrderStatus, "/venues/{0}/stocks/{1}/orders/{2}")
            .register(Operation::CancelOrder, "/venues/{0}/stocks/{1}/orders/{2}")
            .register(Operation::ListOrders, "/venues/{0}/accounts/{1}/orders")
            .register(
                Operation::ListStockOrders,
                "/venues/{0}/accounts/{1}/stocks/{2}/orders",
            )
    }

    /// Endpoints of the game-master API.
    pub fn gamemaster() -> Self {
        Self::new()
            .register(Operation::StartLevel, "/levels/{0}")
            .register(Operation::StopLevel, "/instances/{0}/stop")
            .register(Operation::ResumeLevel, "/instances/{0}/resume")
            .register(Operation::RestartLevel, "/instances/{0}/restart")
            .register(Operation::InstanceDetails, "/instances/{0}")
    }

    pub fn contains(&self, operation: Operation) -> bool {
        self.commands.contains_key(&operation)
    }

    pub fn resolve(&self, operation: Operation, args: &[&str]) -> CommandResult<String> {
        let template = self
            .commands
            .get(&operation)
            .ok_or(CommandError::UnknownOperation(operation))?;

        if template.arity() != args.len() {
            return Err(CommandError::ArityMismatch {
                operation,
                expected: template.arity(),
                supplied: args.len(),
            });
        }

        Ok(template.render(args))
    }
}
