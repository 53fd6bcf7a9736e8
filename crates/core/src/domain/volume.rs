// Volume references handed over by the host workflow

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Format hint some hosts append to volume locations (`map.mrc:mrc`)
const MRC_FORMAT_HINT: &str = ":mrc";

/// Reference to a 3D density map owned by the host workflow
///
/// The adapter only reads the location, the sampling rate and, when no
/// half-maps are given explicitly, the associated half-map pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRef {
    pub location: PathBuf,
    /// Voxel size in Å/px
    pub sampling_rate: f64,
    pub half_maps: Option<(PathBuf, PathBuf)>,
}

impl VolumeRef {
    pub fn new(location: impl Into<PathBuf>, sampling_rate: f64) -> Self {
        Self {
            location: location.into(),
            sampling_rate,
            half_maps: None,
        }
    }

    /// Attach the half-map pair this map was reconstructed from
    pub fn with_half_maps(mut self, half1: impl Into<PathBuf>, half2: impl Into<PathBuf>) -> Self {
        self.half_maps = Some((half1.into(), half2.into()));
        self
    }

    pub fn has_half_maps(&self) -> bool {
        self.half_maps.is_some()
    }

    /// Location with any trailing `:mrc` hint removed
    pub fn file_path(&self) -> PathBuf {
        strip_format_hint(&self.location)
    }
}

/// Reference to a mask volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskRef {
    pub location: PathBuf,
    pub sampling_rate: Option<f64>,
}

impl MaskRef {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            sampling_rate: None,
        }
    }

    pub fn file_path(&self) -> PathBuf {
        strip_format_hint(&self.location)
    }
}

pub(crate) fn strip_format_hint(location: &Path) -> PathBuf {
    let raw = location.to_string_lossy();
    match raw.strip_suffix(MRC_FORMAT_HINT) {
        Some(stripped) => PathBuf::from(stripped),
        None => location.to_path_buf(),
    }
}
