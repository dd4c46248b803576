// src/trading/accumulator.rs
use crate::domain::errors::ExchangeResult;
use crate::domain::models::{OrderSpec, OrderStatus};
use crate::exchange::client::OrderGateway;
use crate::exchange::dispatcher::Reply;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Accumulation loop parameters
#[derive(Debug, Clone)]
pub struct AccumulatorConfig {
    /// Largest quantity sent in a single order.
    pub chunk_size: u64,
    /// Consecutive absent/rejected replies tolerated; one more aborts the run.
    pub max_consecutive_failures: u32,
    /// Consecutive accepted-but-unfilled attempts after which the run is stalled.
    pub max_no_progress: u32,
    /// Pause before retrying after a failure or an unfilled attempt.
    pub backoff: Duration,
    /// Cancel an order still open after its attempt so its late fills cannot leak
    /// into the next one.
    pub cancel_open_remainder: bool,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1_000,
            max_consecutive_failures: 3,
            max_no_progress: 5,
            backoff: Duration::from_millis(500),
            cancel_open_remainder: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Too many attempts in a row produced no reply.
    Transport,
    /// Too many attempts in a row were refused; the venue's last message.
    Rejected(String),
    /// Client and venue disagree on the contract. Never retried.
    Protocol(String),
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AbortReason::Transport => write!(f, "venue unreachable"),
            AbortReason::Rejected(message) => write!(f, "rejected: {}", message),
            AbortReason::Protocol(message) => write!(f, "protocol error: {}", message),
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillState {
    Pending,
    Filled,
    Stalled,
    Aborted(AbortReason),
}

impl FillState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FillState::Pending)
    }
}

/// Percentage of `target` covered by `filled`, rounded down.
pub fn progress_percent(filled: u64, target: u64) -> u64 {
    if target == 0 {
        return 100;
    }
    // Multiply first; u128 keeps the product exact.
    (filled as u128 * 100 / target as u128) as u64
}

/// Terminal report of one accumulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub state: FillState,
    pub target: u64,
    pub filled: u64,
    pub remaining: u64,
    pub attempts: u32,
}

impl Outcome {
    pub fn progress_percent(&self) -> u64 {
        progress_percent(self.filled, self.target)
    }

    pub fn is_filled(&self) -> bool {
        self.state == FillState::Filled
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match &self.state {
            FillState::Pending => "Pending".to_string(),
            FillState::Filled => "Filled".to_string(),
            FillState::Stalled => "Stalled".to_string(),
            FillState::Aborted(reason) => format!("Aborted ({})", reason),
        };
        write!(
            f,
            "{}: {}/{} filled ({}%), {} remaining after {} attempt(s)",
            label,
            self.filled,
            self.target,
            self.progress_percent(),
            self.remaining,
            self.attempts
        )
    }
}

/// Cooperative stop signal, checked between attempts. An in-flight request is
/// always allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancel on Ctrl-C. Only one handler may be installed per process.
    pub fn cancel_on_interrupt(&self) -> Result<(), ctrlc::Error> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            log::warn!("Interrupted; stopping after the current order");
            token.cancel();
        })
    }
}

/// Repeatedly orders the unfilled remainder of a target quantity.
///
/// Submissions are strictly sequential: the next order is only sent once the
/// previous one has been settled.
pub struct FillAccumulator<'a, G: OrderGateway + ?Sized> {
    gateway: &'a G,
    config: AccumulatorConfig,
    cancel: CancellationToken,
}

impl<'a, G: OrderGateway + ?Sized> FillAccumulator<'a, G> {
    pub fn new(gateway: &'a G, config: AccumulatorConfig) -> Self {
        Self {
            gateway,
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fill `target` using `template` for everything but the quantity.
    pub fn run(&self, template: &OrderSpec, target: u64) -> Outcome {
        self.run_priced(template, target, |_| Ok(None))
    }

    /// Like [`run`](Self::run), but asks `reprice` for a fresh price before each
    /// attempt. `Ok(None)` keeps the template's price; an error ends the run.
    pub fn run_priced<F>(&self, template: &OrderSpec, target: u64, mut reprice: F) -> Outcome
    where
        F: FnMut(&G) -> ExchangeResult<Option<u64>>,
    {
        let mut remaining = target;
        let mut attempts: u32 = 0;
        let mut failures: u32 = 0;
        let mut no_progress: u32 = 0;

        log::info!("Accumulating {} {} on {}", target, template.symbol(), template.venue());

        let state = loop {
            if remaining == 0 {
                break FillState::Filled;
            }
            if self.cancel.is_cancelled() {
                break FillState::Aborted(AbortReason::Cancelled);
            }

            let quantity = remaining.min(self.config.chunk_size.max(1));
            let order = match template.with_quantity(quantity) {
                Ok(order) => order,
                Err(e) => break FillState::Aborted(AbortReason::Protocol(e.to_string())),
            };
            let order = match reprice(self.gateway) {
                Ok(Some(price)) => order.with_price(price),
                Ok(None) => order,
                Err(e) => {
                    log::error!("Repricing failed hard: {}", e);
                    break FillState::Aborted(AbortReason::Protocol(e.to_string()));
                }
            };

            attempts += 1;
            log::info!("Attempt {}: {}", attempts, order);

            let reply = match self.gateway.place_order(&order) {
                Ok(reply) => reply,
                Err(e) => {
                    log::error!("Order placement failed hard: {}", e);
                    break FillState::Aborted(AbortReason::Protocol(e.to_string()));
                }
            };

            match reply {
                Reply::Success(status) => {
                    failures = 0;
                    let filled = match self.settle(&status) {
                        Ok(filled) => filled,
                        Err(e) => break FillState::Aborted(AbortReason::Protocol(e.to_string())),
                    };

                    if filled > 0 {
                        remaining -= filled.min(remaining);
                        no_progress = 0;
                        log::info!(
                            "Order {} filled {}; {} remaining ({}%)",
                            status.id,
                            filled,
                            remaining,
                            progress_percent(target - remaining, target)
                        );
                        continue;
                    }

                    no_progress += 1;
                    log::warn!(
                        "Order {} accepted without fills ({}/{})",
                        status.id,
                        no_progress,
                        self.config.max_no_progress
                    );
                    if no_progress >= self.config.max_no_progress {
                        break FillState::Stalled;
                    }
                }
                Reply::Rejected(message) => {
                    failures += 1;
                    log::warn!("Order rejected ({}): {}", failures, message);
                    if failures > self.config.max_consecutive_failures {
                        break FillState::Aborted(AbortReason::Rejected(message));
                    }
                }
                Reply::Absent => {
                    failures += 1;
                    log::warn!("No reply to order ({})", failures);
                    if failures > self.config.max_consecutive_failures {
                        break FillState::Aborted(AbortReason::Transport);
                    }
                }
            }

            if !self.config.backoff.is_zero() {
                std::thread::sleep(self.config.backoff);
            }
        };

        let outcome = Outcome {
            state,
            target,
            filled: target - remaining,
            remaining,
            attempts,
        };
        match outcome.state {
            FillState::Filled => log::info!("{}", outcome),
            _ => log::warn!("{}", outcome),
        }
        outcome
    }

    /// Quantity this attempt finally filled. An order left open is cancelled first
    /// and the cancel reply's total counts, since fills may land in between.
    fn settle(&self, status: &OrderStatus) -> ExchangeResult<u64> {
        if !status.open || !self.config.cancel_open_remainder {
            return Ok(status.total_filled);
        }

        match self
            .gateway
            .cancel_order(&status.venue, &status.symbol, status.id)?
        {
            Reply::Success(closed) => Ok(closed.total_filled.max(status.total_filled)),
            Reply::Rejected(message) => {
                log::warn!("Could not cancel order {}: {}", status.id, message);
                Ok(status.total_filled)
            }
            Reply::Absent => {
                log::warn!("No reply cancelling order {}", status.id);
                Ok(status.total_filled)
            }
        }
    }
}
