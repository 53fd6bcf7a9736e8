// Tool configuration (immutable, injected into the adapter)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version of the wrapped 3DFSC distribution
pub const TOOL_VERSION: &str = "3.0";
pub const ENV_NAME: &str = "fsc3D-3.0";
pub const DEFAULT_ENV_ACTIVATION: &str = "conda activate fsc3D-3.0";

pub const TOOL_SUBDIR: &str = "ThreeDFSC";
pub const ENTRY_POINT: &str = "ThreeDFSC_Start.py";

pub const DEFAULT_CHIMERA_PROGRAM: &str = "chimerax";
pub const DEFAULT_IMAGE_VIEWER: &str = "xdg-open";

/// Where the tool lives and how to enter its environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Install root of the tool (`.../fsc3D-3.0`)
    pub home: PathBuf,
    pub env_activation: String,
    /// Conda shell hook run before `env_activation`
    pub conda_activation: Option<String>,
    /// Prefix stripped once from `env_activation`
    pub platform_home: Option<PathBuf>,
    pub chimera_program: String,
    pub image_viewer_program: String,
}

impl ToolConfig {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            env_activation: DEFAULT_ENV_ACTIVATION.to_string(),
            conda_activation: None,
            platform_home: None,
            chimera_program: DEFAULT_CHIMERA_PROGRAM.to_string(),
            image_viewer_program: DEFAULT_IMAGE_VIEWER.to_string(),
        }
    }

    /// Default install root under an EM software directory
    pub fn default_home(em_root: &Path) -> PathBuf {
        em_root.join(ENV_NAME)
    }

    pub fn with_env_activation(mut self, activation: impl Into<String>) -> Self {
        self.env_activation = activation.into();
        self
    }

    pub fn with_conda_activation(mut self, activation: Option<String>) -> Self {
        self.conda_activation = activation.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_platform_home(mut self, home: Option<PathBuf>) -> Self {
        self.platform_home = home;
        self
    }

    pub fn with_viewers(mut self, chimera: impl Into<String>, images: impl Into<String>) -> Self {
        self.chimera_program = chimera.into();
        self.image_viewer_program = images.into();
        self
    }

    /// Directory prepended to `PATH` for the tool process
    pub fn tool_dir(&self) -> PathBuf {
        self.home.join(TOOL_SUBDIR)
    }

    pub fn entry_point(&self) -> PathBuf {
        self.tool_dir().join(ENTRY_POINT)
    }

    /// `env_activation` with the platform home prefix removed once
    pub fn env_activation(&self) -> String {
        match &self.platform_home {
            Some(home) => {
                let mut prefix = home.to_string_lossy().into_owned();
                if !prefix.ends_with(std::path::MAIN_SEPARATOR) {
                    prefix.push(std::path::MAIN_SEPARATOR);
                }
                self.env_activation.replacen(&prefix, "", 1)
            }
            None => self.env_activation.clone(),
        }
    }

    /// Full shell prefix: conda hook (if any) followed by the env activation
    pub fn activation_command(&self) -> String {
        match &self.conda_activation {
            Some(hook) => chain_after_hook(hook, &self.env_activation()),
            None => self.env_activation(),
        }
    }
}

/// `<hook> && <next>`, or a plain space when the hook already ends in `&&` or `;`
///
/// Hooks like `eval "$(conda shell.bash hook)"` would otherwise swallow
/// `next` as extra arguments.
pub fn chain_after_hook(hook: &str, next: &str) -> String {
    let hook = hook.trim();
    if hook.ends_with("&&") || hook.ends_with(';') {
        format!("{} {}", hook, next)
    } else {
        format!("{} && {}", hook, next)
    }
}
