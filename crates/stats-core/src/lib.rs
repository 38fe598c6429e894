//! Shared types for chat-stats.
//!
//! Holds the error taxonomy, the normalised conversation model, the mojibake
//! repair transform, calendar bucketing helpers, number formatting and the
//! command-line settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod text_repair;
pub mod time_utils;

pub use error::{Result, StatsError};
