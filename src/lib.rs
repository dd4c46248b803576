// src/lib.rs
// Main library module declarations

pub mod config;
pub mod domain;
pub mod exchange;
pub mod trading;
