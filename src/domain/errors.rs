// src/domain/errors.rs
use crate::exchange::command::Operation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Trading error: {0}")]
    Trading(#[from] TradingError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Client/contract drift. These are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Operation {0} has no registered endpoint")]
    UnknownOperation(Operation),

    #[error("Operation {operation} expects {expected} argument(s), got {supplied}")]
    ArityMismatch {
        operation: Operation,
        expected: usize,
        supplied: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Unrecognized {field} on the wire: \"{value}\"")]
    UnrecognizedWireValue { field: &'static str, value: String },
}

/// Failures below the command envelope. The dispatcher turns these into an absent reply.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Malformed response body: {0}")]
    Body(String),
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Protocol drift: {0}")]
    Wire(#[from] WireError),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Request serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Could not start level: {0}")]
    LevelStart(String),

    #[error("Level {0} lists no venue or ticker to trade")]
    NoVenue(String),
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type CommandResult<T> = Result<T, CommandError>;
pub type WireResult<T> = Result<T, WireError>;
pub type TransportResult<T> = Result<T, TransportError>;
pub type ExchangeResult<T> = Result<T, ExchangeError>;
pub type TradingResult<T> = Result<T, TradingError>;
