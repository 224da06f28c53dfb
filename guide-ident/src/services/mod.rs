//! External collaborators of the identification workflow

pub mod connectivity;
pub mod labels;
pub mod landmark_directory;
pub mod local_classifier;
pub mod remote_classifier;
pub mod upload_queue;

pub use connectivity::{ConnectivityMonitor, ReachabilityProbe, TcpProbe};
pub use landmark_directory::{HttpLandmarkDirectory, LandmarkDirectory, StaticLandmarkDirectory};
pub use local_classifier::{LocalClassifier, LocalModel, UnconfiguredModel};
pub use remote_classifier::{HttpRemoteClassifier, RemoteClassifier};
pub use upload_queue::{DrainOutcome, PendingUpload, UploadQueue};
