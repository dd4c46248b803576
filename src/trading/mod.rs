// src/trading/mod.rs
pub mod accumulator;
pub mod levels;

pub use accumulator::{
    progress_percent, AbortReason, AccumulatorConfig, CancellationToken, FillAccumulator,
    FillState, Outcome,
};
pub use levels::{level_for, ChockABlock, FirstSteps, Level, LevelSettings};
