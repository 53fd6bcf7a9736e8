// Port Layer - Interfaces for external collaborators

pub mod cancel;
pub mod id_provider; // For deterministic testing
pub mod time_provider;
pub mod tool_runner;
pub mod viewer_launcher;
pub mod volume_converter;

// Re-exports
pub use cancel::{cancel_channel, CancelSender, CancelToken};
pub use id_provider::IdProvider;
pub use time_provider::TimeProvider;
pub use tool_runner::{
    ExecutionError, ExecutionRequest, ExecutionResult, ExecutionStatus, ToolRunner,
};
pub use viewer_launcher::ViewerLauncher;
pub use volume_converter::{ConversionError, VolumeConverter};
