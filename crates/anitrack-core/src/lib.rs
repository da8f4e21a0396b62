//! Core logic for the anime release checker.
//!
//! This crate is framework-agnostic. The chat platform lives behind
//! [`notify::port::NotificationSink`] and the command surface drives
//! [`scheduler::PollService`] from an adapter crate.

pub mod catalog;
pub mod config;
pub mod dedup;
pub mod differ;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod notify;
pub mod scheduler;

pub use errors::{Error, Result};
