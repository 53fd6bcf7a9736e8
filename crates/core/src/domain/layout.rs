// Job-scoped directory tree expected by 3DFSC

use std::path::{Path, PathBuf};

pub const TMP_DIR: &str = "tmp";
pub const EXTRA_DIR: &str = "extra";
pub const LOGS_DIR: &str = "logs";

pub const INPUT_FULL: &str = "volume_full.mrc";
pub const INPUT_HALF1: &str = "volume_half1.mrc";
pub const INPUT_HALF2: &str = "volume_half2.mrc";
pub const INPUT_MASK: &str = "mask.mrc";

pub const STDOUT_LOG: &str = "run.stdout";
pub const STDERR_LOG: &str = "run.stderr";

/// Output artifacts, relative to the working directory
pub mod artifacts {
    pub const RESULTS_DIR: &str = "Results_vol";
    pub const VOLUME: &str = "Results_vol/vol.mrc";
    pub const VOLUME_THRESHOLDED: &str = "Results_vol/vol_Thresholded.mrc";
    pub const VOLUME_THRESHOLDED_BINARIZED: &str = "Results_vol/vol_ThresholdedBinarized.mrc";
    pub const HISTOGRAM: &str = "Results_vol/histogram.png";
    pub const PLOT_3DFSC: &str = "Results_vol/Plotsvol.jpg";
    pub const PLOT_FT: &str = "Results_vol/FTPlotvol.jpg";
    pub const CHIMERA_CMD: &str = "Results_vol/Chimera/3DFSCPlot_Chimera.cmd";
    pub const GLOBAL_FSC_CSV: &str = "Results_vol/ResEMvolOutglobalFSC.csv";
    /// Intermediate map the tool leaves behind; removed on registration
    pub const UNUSED_VOLUME: &str = "Results_vol/ResEMvolOut.mrc";
    pub const CHIMERA_VOLUMES_SCRIPT: &str = "chimera_volumes.cxc";
}

/// Directory tree of one job: `<root>/{tmp,extra,logs}`
///
/// `extra` is the working directory of the tool; every path on the
/// command line is relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLayout {
    root: PathBuf,
}

impl JobLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join(TMP_DIR)
    }

    pub fn working_dir(&self) -> PathBuf {
        self.root.join(EXTRA_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    pub fn tmp_path(&self, name: &str) -> PathBuf {
        self.tmp_dir().join(name)
    }

    /// Path of an artifact under the working directory
    pub fn artifact(&self, relative: &str) -> PathBuf {
        self.working_dir().join(relative)
    }

    pub fn stdout_log(&self) -> PathBuf {
        self.logs_dir().join(STDOUT_LOG)
    }

    pub fn stderr_log(&self) -> PathBuf {
        self.logs_dir().join(STDERR_LOG)
    }

    /// Path of `target` relative to the working directory
    ///
    /// Inputs live in `tmp/`, a sibling of the working directory, so the
    /// result is `../tmp/<name>` for them.
    pub fn relative_to_working_dir(&self, target: &Path) -> PathBuf {
        relative_path(&self.working_dir(), target)
    }
}

/// Lexical relative path from directory `base` to `target`
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<_> = base.components().collect();
    let target: Vec<_> = target.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for part in &target[common..] {
        out.push(part.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
