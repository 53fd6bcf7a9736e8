// fsc3d Infrastructure - System Adapters
// Implements: ToolRunner, VolumeConverter, ViewerLauncher

pub mod external_viewer;
pub mod mrc_converter;
pub mod subprocess_runner;

pub use external_viewer::ExternalViewer;
pub use mrc_converter::MrcVolumeConverter;
pub use subprocess_runner::SubprocessRunner;
