//! Publish jobs and their per-channel state machine.

mod types;

pub use types::{
    Asset, MediaKind, PublishJob, PublishRequest, PublishStatus, ScheduleMode, ValidationError,
};
