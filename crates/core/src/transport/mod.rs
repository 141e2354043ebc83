//! Channel transport abstraction for platform uploads.

mod simulated;
mod types;

pub use simulated::SimulatedTransport;
pub use types::{PublishTransport, TransportError, UploadReceipt, UploadRequest};
