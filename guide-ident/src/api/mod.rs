//! HTTP API handlers for guide-ident

pub mod events;
pub mod health;
pub mod identify;

pub use events::event_routes;
pub use health::health_routes;
pub use identify::identify_routes;
