// Install recipe for the 3DFSC conda environment (declarative, never executed here)

use crate::domain::config::{chain_after_hook, ENTRY_POINT, TOOL_SUBDIR, TOOL_VERSION};
use crate::domain::ToolConfig;
use serde::Serialize;

/// Version of this plugin
pub const PLUGIN_VERSION: &str = "3.1";
pub const SUPPORTED_VERSIONS: &[&str] = &[TOOL_VERSION];
pub const DEFAULT_VERSION: &str = TOOL_VERSION;

const CONDA_PACKAGES: &str = "python=3 cudatoolkit numba";
const PIP_PACKAGES: &str = "scipy numpy click h5py scikit-image matplotlib mrcfile";
const SOURCE_REPO: &str = "https://github.com/azazellochg/fsc3D";
const SOURCE_BRANCH: &str = "scipion";

/// How to install one version of the tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallRecipe {
    pub package: String,
    pub version: String,
    pub env_name: String,
    /// Shell command run from the package directory
    pub command: String,
    /// File whose presence marks a finished install
    pub target: String,
    /// Programs that must exist before installing
    pub needed_programs: Vec<String>,
    pub default: bool,
}

impl InstallRecipe {
    /// Recipe for `version`, `None` if the version is not supported
    pub fn for_version(config: &ToolConfig, version: &str) -> Option<Self> {
        if !SUPPORTED_VERSIONS.contains(&version) {
            return None;
        }
        let env_name = format!("fsc3D-{}", version);

        let install = format!(
            "cd ../ && rmdir {env} && conda create -y -n {env} {CONDA_PACKAGES} && conda activate {env} && \
             pip install {PIP_PACKAGES} && git clone -b {SOURCE_BRANCH} {SOURCE_REPO} {env}",
            env = env_name
        );
        let command = match &config.conda_activation {
            Some(hook) => chain_after_hook(hook, &install),
            None => install,
        };

        let needed_programs = if config.conda_activation.is_none() {
            vec!["conda".to_string()]
        } else {
            Vec::new()
        };

        Some(Self {
            package: "fsc3D".to_string(),
            version: version.to_string(),
            env_name,
            command,
            target: format!("{}/{}", TOOL_SUBDIR, ENTRY_POINT),
            needed_programs,
            default: version == DEFAULT_VERSION,
        })
    }

    /// Recipes for every supported version
    pub fn all(config: &ToolConfig) -> Vec<Self> {
        SUPPORTED_VERSIONS
            .iter()
            .filter_map(|v| Self::for_version(config, v))
            .collect()
    }
}
