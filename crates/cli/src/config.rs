//! Tool configuration assembled from flags and environment variables

use clap::Args;
use fsc3d_core::domain::config::{DEFAULT_CHIMERA_PROGRAM, DEFAULT_ENV_ACTIVATION, DEFAULT_IMAGE_VIEWER};
use fsc3d_core::domain::ToolConfig;
use std::path::PathBuf;

const DEFAULT_EM_ROOT: &str = "~/software/em";
pub const DEFAULT_WORK_ROOT: &str = "~/.fsc3d/jobs";

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Install root of 3DFSC (default: <em-root>/fsc3D-3.0)
    #[arg(long, env = "FSC3D_HOME", global = true)]
    pub home: Option<String>,

    /// Directory holding EM software packages
    #[arg(long, env = "EM_ROOT", default_value = DEFAULT_EM_ROOT, global = true)]
    pub em_root: String,

    /// Command activating the 3DFSC conda environment
    #[arg(long, env = "FSC3D_ENV_ACTIVATION", default_value = DEFAULT_ENV_ACTIVATION, global = true)]
    pub env_activation: String,

    /// Conda shell hook run before the activation
    #[arg(long, env = "CONDA_ACTIVATION_CMD", global = true)]
    pub conda_activation: Option<String>,

    /// Platform home prefix stripped from the activation command
    #[arg(long, env = "SCIPION_HOME", global = true)]
    pub platform_home: Option<String>,

    /// ChimeraX executable
    #[arg(long, env = "FSC3D_CHIMERA", default_value = DEFAULT_CHIMERA_PROGRAM, global = true)]
    pub chimera: String,

    /// Program used to open plot images
    #[arg(long, env = "FSC3D_IMAGE_VIEWER", default_value = DEFAULT_IMAGE_VIEWER, global = true)]
    pub image_viewer: String,
}

impl ConfigArgs {
    pub fn tool_config(&self) -> ToolConfig {
        let home = match &self.home {
            Some(home) => expand(home),
            None => ToolConfig::default_home(&expand(&self.em_root)),
        };

        ToolConfig::new(home)
            .with_env_activation(self.env_activation.clone())
            .with_conda_activation(self.conda_activation.clone())
            .with_platform_home(self.platform_home.as_deref().map(expand))
            .with_viewers(self.chimera.clone(), self.image_viewer.clone())
    }
}

/// Expand `~` in a user-supplied path
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
