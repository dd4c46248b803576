// src/trading/levels.rs
use crate::domain::errors::{ExchangeResult, TradingError, TradingResult};
use crate::domain::models::{OrderDirection, OrderSpec, OrderType, StartedLevel};
use crate::exchange::client::OrderGateway;
use crate::exchange::dispatcher::Reply;
use crate::trading::accumulator::{AccumulatorConfig, CancellationToken, FillAccumulator, Outcome};

/// A game level that can be solved once the game master has started it.
pub trait Level {
    /// Name the game master knows the level by.
    fn name(&self) -> &'static str;

    fn solve(&self, gateway: &dyn OrderGateway, started: &StartedLevel) -> TradingResult<Outcome>;
}

/// Knobs shared by every level strategy
#[derive(Debug, Clone)]
pub struct LevelSettings {
    /// Overrides the level's own target when set.
    pub target: Option<u64>,
    /// Limit price in cents used when the venue has no ask.
    pub fallback_price: u64,
    pub accumulator: AccumulatorConfig,
    pub cancel: CancellationToken,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            target: None,
            fallback_price: 0,
            accumulator: AccumulatorConfig::default(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Look up a strategy by its game-master name.
pub fn level_for(name: &str, settings: LevelSettings) -> Option<Box<dyn Level>> {
    match name {
        FirstSteps::NAME => Some(Box::new(FirstSteps::new(settings))),
        ChockABlock::NAME => Some(Box::new(ChockABlock::new(settings))),
        _ => None,
    }
}

fn market_of(level: &str, started: &StartedLevel) -> TradingResult<(String, String)> {
    started
        .primary_market()
        .map(|(venue, symbol)| (venue.to_string(), symbol.to_string()))
        .ok_or_else(|| TradingError::NoVenue(level.to_string()))
}

/// Buy a small position with market orders.
pub struct FirstSteps {
    settings: LevelSettings,
}

impl FirstSteps {
    pub const NAME: &'static str = "first_steps";
    pub const DEFAULT_TARGET: u64 = 100;

    pub fn new(settings: LevelSettings) -> Self {
        Self { settings }
    }
}

impl Level for FirstSteps {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn solve(&self, gateway: &dyn OrderGateway, started: &StartedLevel) -> TradingResult<Outcome> {
        let (venue, symbol) = market_of(Self::NAME, started)?;
        let target = self.settings.target.unwrap_or(Self::DEFAULT_TARGET);

        // Market orders still need a price on the wire; the venue ignores it.
        let template = OrderSpec::new(
            &started.account,
            &venue,
            &symbol,
            0,
            1,
            OrderDirection::Buy,
            OrderType::Market,
        )?;

        let outcome = FillAccumulator::new(gateway, self.settings.accumulator.clone())
            .with_cancellation(self.settings.cancel.clone())
            .run(&template, target);
        Ok(outcome)
    }
}

/// Accumulate a large block with limit orders pegged to the current ask.
pub struct ChockABlock {
    settings: LevelSettings,
}

impl ChockABlock {
    pub const NAME: &'static str = "chock_a_block";
    pub const DEFAULT_TARGET: u64 = 100_000;

    pub fn new(settings: LevelSettings) -> Self {
        Self { settings }
    }

    /// Current ask, if any. Only an unusable quote call is an error.
    fn ask(gateway: &dyn OrderGateway, venue: &str, symbol: &str) -> ExchangeResult<Option<u64>> {
        Ok(match gateway.quote(venue, symbol)? {
            Reply::Success(quote) => quote.ask,
            Reply::Rejected(message) => {
                log::warn!("Quote for {} refused: {}", symbol, message);
                None
            }
            Reply::Absent => None,
        })
    }
}

impl Level for ChockABlock {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn solve(&self, gateway: &dyn OrderGateway, started: &StartedLevel) -> TradingResult<Outcome> {
        let (venue, symbol) = market_of(Self::NAME, started)?;
        let target = self.settings.target.unwrap_or(Self::DEFAULT_TARGET);

        let template = OrderSpec::new(
            &started.account,
            &venue,
            &symbol,
            self.settings.fallback_price,
            1,
            OrderDirection::Buy,
            OrderType::Limit,
        )?;

        let fallback = self.settings.fallback_price;
        let outcome = FillAccumulator::new(gateway, self.settings.accumulator.clone())
            .with_cancellation(self.settings.cancel.clone())
            .run_priced(&template, target, |gateway| {
                let price = Self::ask(gateway, &venue, &symbol)?;
                if price.is_none() {
                    log::debug!("No ask for {}, pricing at {}", symbol, fallback);
                }
                Ok(price)
            });
        Ok(outcome)
    }
}
