// Run parameters for a single 3DFSC invocation

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_D_THETA: f64 = 20.0;
pub const DEFAULT_FSC_CUTOFF: f64 = 0.143;
pub const DEFAULT_SPHERICITY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_HIGH_PASS_FILTER: f64 = 150.0;
pub const DEFAULT_NUM_THRESHOLDS: u32 = 1;

/// Immutable parameter set, built once per job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Cone half-angle in degrees
    pub d_theta: f64,
    pub fsc_cutoff: f64,
    pub sphericity_threshold: f64,
    /// High-pass filter cutoff in Å
    pub high_pass_filter: f64,
    pub num_thresholds: u32,
    pub use_gpu: bool,
    pub gpu_id: u32,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            d_theta: DEFAULT_D_THETA,
            fsc_cutoff: DEFAULT_FSC_CUTOFF,
            sphericity_threshold: DEFAULT_SPHERICITY_THRESHOLD,
            high_pass_filter: DEFAULT_HIGH_PASS_FILTER,
            num_thresholds: DEFAULT_NUM_THRESHOLDS,
            use_gpu: true,
            gpu_id: 0,
        }
    }
}

/// A parameter outside its accepted range
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterViolation {
    pub name: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl fmt::Display for ParameterViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} (expected {})", self.name, self.value, self.expected)
    }
}

impl RunParameters {
    /// Disable GPU flags on the command line
    pub fn without_gpu(mut self) -> Self {
        self.use_gpu = false;
        self
    }

    /// Collect every range violation (empty when the set is valid)
    pub fn violations(&self) -> Vec<ParameterViolation> {
        let mut out = Vec::new();

        if !(self.d_theta.is_finite() && self.d_theta > 0.0 && self.d_theta <= 90.0) {
            out.push(violation("dthetaInDegrees", self.d_theta, "0 < value <= 90"));
        }
        if !open_unit_interval(self.fsc_cutoff) {
            out.push(violation("FSCCutoff", self.fsc_cutoff, "0 < value < 1"));
        }
        if !open_unit_interval(self.sphericity_threshold) {
            out.push(violation(
                "ThresholdForSphericity",
                self.sphericity_threshold,
                "0 < value < 1",
            ));
        }
        if !(self.high_pass_filter.is_finite() && self.high_pass_filter > 0.0) {
            out.push(violation("HighPassFilter", self.high_pass_filter, "value > 0"));
        }
        if self.num_thresholds < 1 {
            out.push(ParameterViolation {
                name: "numThresholdsForSphericityCalcs",
                value: self.num_thresholds.to_string(),
                expected: "value >= 1",
            });
        }

        out
    }
}

/// Sampling rate check shared by the full map and `--apix`
pub fn sampling_rate_violation(apix: f64) -> Option<ParameterViolation> {
    if apix.is_finite() && apix > 0.0 {
        None
    } else {
        Some(violation("apix", apix, "value > 0"))
    }
}

fn open_unit_interval(v: f64) -> bool {
    v.is_finite() && v > 0.0 && v < 1.0
}

fn violation(name: &'static str, value: f64, expected: &'static str) -> ParameterViolation {
    ParameterViolation {
        name,
        value: format!("{:?}", value),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = RunParameters::default();
        assert!(params.violations().is_empty());
        assert_eq!(params.fsc_cutoff, 0.143);
        assert_eq!(params.sphericity_threshold, 0.5);
        assert!(params.use_gpu);
    }

    #[test]
    fn test_fsc_cutoff_bounds_are_exclusive() {
        for bad in [0.0, 1.0, -0.2, f64::NAN] {
            let params = RunParameters {
                fsc_cutoff: bad,
                ..Default::default()
            };
            let v = params.violations();
            assert_eq!(v.len(), 1, "cutoff {bad} should be rejected");
            assert_eq!(v[0].name, "FSCCutoff");
        }
    }

    #[test]
    fn test_d_theta_upper_bound_is_inclusive() {
        let ok = RunParameters {
            d_theta: 90.0,
            ..Default::default()
        };
        assert!(ok.violations().is_empty());

        for bad in [0.0, 90.5, f64::INFINITY] {
            let params = RunParameters {
                d_theta: bad,
                ..Default::default()
            };
            assert_eq!(params.violations()[0].name, "dthetaInDegrees");
        }
    }

    #[test]
    fn test_collects_all_violations() {
        let params = RunParameters {
            d_theta: 100.0,
            fsc_cutoff: 2.0,
            high_pass_filter: 0.0,
            num_thresholds: 0,
            ..Default::default()
        };
        let names: Vec<_> = params.violations().iter().map(|v| v.name).collect();
        assert_eq!(
            names,
            vec![
                "dthetaInDegrees",
                "FSCCutoff",
                "HighPassFilter",
                "numThresholdsForSphericityCalcs"
            ]
        );
    }

    #[test]
    fn test_sampling_rate() {
        assert!(sampling_rate_violation(3.54).is_none());
        assert!(sampling_rate_violation(0.0).is_some());
        assert!(sampling_rate_violation(f64::NAN).is_some());
    }
}
