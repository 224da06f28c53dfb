//! Photo identification workflow engine
//!
//! Drives a capture through remote classification with on-device
//! fallback:
//! 1. Send the image to the classification server (when reachable)
//! 2. On transport failure or offline, run the on-device model
//! 3. Apply the confidence threshold, then resolve the label against
//!    the landmark directory
//! 4. Queue on-device results for remote submission once connectivity
//!    returns
//!
//! One capture at a time; a second start is rejected unless it
//! explicitly supersedes the one in flight.

pub mod identify;

pub use identify::{IdentWorkflow, WorkflowStatus, CONFIDENCE_THRESHOLD};
