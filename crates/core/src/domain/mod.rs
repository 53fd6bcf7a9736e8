// Domain Layer - Pure types and invariants

pub mod command;
pub mod config;
pub mod error;
pub mod job;
pub mod layout;
pub mod params;
pub mod result;
pub mod volume;

// Re-exports
pub use command::{CommandLine, ConvertedPaths};
pub use config::ToolConfig;
pub use error::DomainError;
pub use job::{FscJob, JobId, JobState};
pub use layout::{artifacts, JobLayout};
pub use params::{ParameterViolation, RunParameters};
pub use result::{OutputVolume, ResultWarning, RunResult};
pub use volume::{MaskRef, VolumeRef};
