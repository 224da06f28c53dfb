//! Data models for guide-ident (Photo Identification microservice)

pub mod capture;
pub mod outcome;
pub mod session;

pub use capture::{CaptureRequest, ImageSource};
pub use outcome::{ClassificationResult, ClassifierOrigin, IdentOutcome};
pub use session::{IdentSession, StateTransition, WorkflowState};
