// Application Layer - Use cases around the external tool

pub mod adapter;
pub mod install;
pub mod viewer;

// Re-exports
pub use adapter::{JobAdapter, RunRequest};
pub use install::InstallRecipe;
pub use viewer::{Plot, ResultViewer, VolumeSelection};
