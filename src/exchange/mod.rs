// src/exchange/mod.rs
pub mod auth;
pub mod client;
pub mod command;
pub mod dispatcher;
pub mod gamemaster;
pub mod stockfighter;
pub mod translate;
pub mod transport;

pub use auth::{AuthStrategy, Credential};
pub use client::OrderGateway;
pub use command::{CommandRegistry, Operation};
pub use dispatcher::{CommandDispatcher, Reply};
pub use gamemaster::GamemasterClient;
pub use stockfighter::StockFighterClient;
pub use transport::{HttpTransport, Transport, Verb};
