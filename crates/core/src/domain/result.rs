// Run result and output registration record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Label given to the registered output volume
pub const OUTPUT_LABEL: &str = "3D FSC";

/// Non-fatal problems found while collecting a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultWarning {
    /// No `Sphericity is ` line in the report; sphericity defaulted to 0.0
    SphericityMissing { report: PathBuf },
    /// Marker found but the value did not parse; defaulted to 0.0
    SphericityUnparsable { report: PathBuf, line: String },
}

impl fmt::Display for ResultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultWarning::SphericityMissing { report } => write!(
                f,
                "no sphericity line in {}, reporting 0.0",
                report.display()
            ),
            ResultWarning::SphericityUnparsable { report, line } => write!(
                f,
                "unparsable sphericity line in {}: {:?}, reporting 0.0",
                report.display(),
                line
            ),
        }
    }
}

/// Artifacts of a successful run
///
/// Only `volume` is guaranteed; everything else is whatever the tool
/// happened to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub volume: PathBuf,
    pub volume_thresholded: Option<PathBuf>,
    pub volume_thresholded_binarized: Option<PathBuf>,
    pub histogram: Option<PathBuf>,
    pub plot_3dfsc: Option<PathBuf>,
    pub plot_ft: Option<PathBuf>,
    pub chimera_cmd: Option<PathBuf>,
    pub global_fsc_csv: Option<PathBuf>,
    pub sphericity: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ResultWarning>,
}

impl RunResult {
    /// Secondary artifacts as `(name, path)` pairs, in a fixed order
    pub fn secondary_artifacts(&self) -> [(&'static str, Option<&PathBuf>); 7] {
        [
            ("thresholded volume", self.volume_thresholded.as_ref()),
            (
                "thresholded binarized volume",
                self.volume_thresholded_binarized.as_ref(),
            ),
            ("histogram", self.histogram.as_ref()),
            ("3D FSC plot", self.plot_3dfsc.as_ref()),
            ("FT plot", self.plot_ft.as_ref()),
            ("Chimera command file", self.chimera_cmd.as_ref()),
            ("global FSC csv", self.global_fsc_csv.as_ref()),
        ]
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Output registered with the host workflow after a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputVolume {
    pub label: String,
    pub file_name: PathBuf,
    pub sampling_rate: f64,
    /// Location of the full map this output derives from
    pub source: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(warnings: Vec<ResultWarning>) -> RunResult {
        RunResult {
            volume: PathBuf::from("/jobs/j1/extra/Results_vol/vol.mrc"),
            volume_thresholded: None,
            volume_thresholded_binarized: None,
            histogram: Some(PathBuf::from("/jobs/j1/extra/Results_vol/histogram.png")),
            plot_3dfsc: None,
            plot_ft: None,
            chimera_cmd: None,
            global_fsc_csv: None,
            sphericity: 0.0,
            warnings,
        }
    }

    #[test]
    fn test_warnings_omitted_when_empty() {
        let value = serde_json::to_value(result(vec![])).unwrap();
        assert!(value.get("warnings").is_none());
        assert_eq!(value["sphericity"], 0.0);
        assert!(value["volume_thresholded"].is_null());
    }

    #[test]
    fn test_warning_tagged_by_kind() {
        let warning = ResultWarning::SphericityMissing {
            report: PathBuf::from("/jobs/j1/logs/run.stdout"),
        };
        let value = serde_json::to_value(result(vec![warning.clone()])).unwrap();
        assert_eq!(value["warnings"][0]["kind"], "sphericity_missing");

        let back: RunResult = serde_json::from_value(value).unwrap();
        assert_eq!(back.warnings, vec![warning]);
        assert!(back.has_warnings());
    }

    #[test]
    fn test_secondary_artifacts_order() {
        let names: Vec<_> = result(vec![])
            .secondary_artifacts()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(names[0], "thresholded volume");
        assert_eq!(names[2], "histogram");
        assert_eq!(names.len(), 7);
    }
}
