//! galick: an open-loop HTTP load-testing engine.
//!
//! See `engine::Engine` for the pacing/worker loop, `attacker::Attacker` for
//! the request-producing abstraction, and `stats::Stats` for the
//! thread-safe metrics aggregator these are built around.

pub mod attacker;
pub mod cli;
pub mod client;
pub mod connection_pool;
pub mod engine;
pub mod errors;
pub mod presenter;
pub mod result;
pub mod script;
pub mod stats;
