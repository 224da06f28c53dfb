//! # Guide Common Library
//!
//! Shared code for the tourist-guide services including:
//! - Event types (GuideEvent enum) and the broadcast EventBus
//! - Landmark entity model
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
pub use models::Landmark;
