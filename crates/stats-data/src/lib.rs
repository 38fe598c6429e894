//! Data layer for chat-stats.
//!
//! Responsible for discovering conversation directories in an export inbox,
//! loading and normalising their message documents, aggregating message
//! counts and running the multi-conversation analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod loader;
pub mod reader;

pub use stats_core as core;
