// Command line and process environment for 3DFSC

use crate::domain::{CommandLine, ConvertedPaths, JobLayout, RunParameters, ToolConfig};
use std::collections::HashMap;

/// Results prefix passed as `--ThreeDFSC`; the tool writes `Results_<prefix>/`
pub const OUTPUT_PREFIX: &str = "vol";
pub const HISTOGRAM_NAME: &str = "histogram";

/// Interpreter search path that must not leak into the tool's environment
pub const PYTHONPATH: &str = "PYTHONPATH";
pub const PATH: &str = "PATH";

/// Map converted inputs and parameters onto the tool's flags
///
/// Pure and deterministic. Paths are relative to the working directory so
/// the invocation can be replayed from a relocated job tree.
pub fn build_invocation(
    config: &ToolConfig,
    layout: &JobLayout,
    paths: &ConvertedPaths,
    params: &RunParameters,
) -> CommandLine {
    let rel = |p: &std::path::Path| layout.relative_to_working_dir(p).display().to_string();

    let mut args = vec![
        format!("--halfmap1={}", rel(&paths.half1)),
        format!("--halfmap2={}", rel(&paths.half2)),
        format!("--fullmap={}", rel(&paths.full)),
        format!("--apix={:?}", paths.sampling_rate),
        format!("--ThreeDFSC={}", OUTPUT_PREFIX),
        format!("--dthetaInDegrees={:?}", params.d_theta),
        format!("--FSCCutoff={:?}", params.fsc_cutoff),
        format!("--ThresholdForSphericity={:?}", params.sphericity_threshold),
        format!("--HighPassFilter={:?}", params.high_pass_filter),
        format!("--numThresholdsForSphericityCalcs={}", params.num_thresholds),
        format!("--histogram={}", HISTOGRAM_NAME),
    ];

    if let Some(mask) = &paths.mask {
        args.push(format!("--mask={}", rel(mask)));
    }

    if params.use_gpu {
        args.push("--gpu".to_string());
        args.push(format!("--gpu_id={}", params.gpu_id));
    }

    CommandLine {
        activation: Some(config.activation_command()),
        program: config.entry_point(),
        args,
    }
}

/// Environment for the tool process, derived from `base`
///
/// Drops `PYTHONPATH` and puts the tool directory first on `PATH`.
pub fn build_environment(
    base: &HashMap<String, String>,
    config: &ToolConfig,
) -> HashMap<String, String> {
    let mut env = base.clone();
    env.remove(PYTHONPATH);

    let tool_dir = config.tool_dir().display().to_string();
    let path = match env.get(PATH).filter(|p| !p.is_empty()) {
        Some(existing) => format!("{}:{}", tool_dir, existing),
        None => tool_dir,
    };
    env.insert(PATH.to_string(), path);
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MAPPED_FLAGS: [&str; 11] = [
        "--halfmap1",
        "--halfmap2",
        "--fullmap",
        "--apix",
        "--ThreeDFSC",
        "--dthetaInDegrees",
        "--FSCCutoff",
        "--ThresholdForSphericity",
        "--HighPassFilter",
        "--numThresholdsForSphericityCalcs",
        "--histogram",
    ];

    fn fixture(mask: bool) -> (ToolConfig, JobLayout, ConvertedPaths) {
        let layout = JobLayout::new("/jobs/j1");
        let paths = ConvertedPaths {
            half1: layout.tmp_path("volume_half1.mrc"),
            half2: layout.tmp_path("volume_half2.mrc"),
            full: layout.tmp_path("volume_full.mrc"),
            mask: mask.then(|| layout.tmp_path("mask.mrc")),
            sampling_rate: 3.54,
        };
        (ToolConfig::new("/opt/em/fsc3D-3.0"), layout, paths)
    }

    #[test]
    fn test_every_flag_appears_once() {
        let (config, layout, paths) = fixture(true);
        let cmd = build_invocation(&config, &layout, &paths, &RunParameters::default());

        for flag in MAPPED_FLAGS.iter().chain(["--mask", "--gpu", "--gpu_id"].iter()) {
            assert_eq!(cmd.flag_count(flag), 1, "{flag} should appear exactly once");
        }
    }

    #[test]
    fn test_optional_flags_omitted() {
        let (config, layout, paths) = fixture(false);
        let params = RunParameters::default().without_gpu();
        let cmd = build_invocation(&config, &layout, &paths, &params);

        for flag in MAPPED_FLAGS {
            assert_eq!(cmd.flag_count(flag), 1, "{flag} should appear exactly once");
        }
        assert!(!cmd.has_flag("--mask"));
        assert!(!cmd.has_flag("--gpu"));
        assert!(!cmd.has_flag("--gpu_id"));
        assert_eq!(cmd.args.len(), MAPPED_FLAGS.len());
    }

    #[test]
    fn test_values_and_relative_paths() {
        let (config, layout, paths) = fixture(true);
        let params = RunParameters {
            gpu_id: 2,
            ..Default::default()
        };
        let cmd = build_invocation(&config, &layout, &paths, &params);

        assert_eq!(cmd.flag_value("--halfmap1"), Some("../tmp/volume_half1.mrc"));
        assert_eq!(cmd.flag_value("--fullmap"), Some("../tmp/volume_full.mrc"));
        assert_eq!(cmd.flag_value("--mask"), Some("../tmp/mask.mrc"));
        assert_eq!(cmd.flag_value("--apix"), Some("3.54"));
        assert_eq!(cmd.flag_value("--ThreeDFSC"), Some("vol"));
        assert_eq!(cmd.flag_value("--dthetaInDegrees"), Some("20.0"));
        assert_eq!(cmd.flag_value("--FSCCutoff"), Some("0.143"));
        assert_eq!(cmd.flag_value("--ThresholdForSphericity"), Some("0.5"));
        assert_eq!(cmd.flag_value("--HighPassFilter"), Some("150.0"));
        assert_eq!(cmd.flag_value("--numThresholdsForSphericityCalcs"), Some("1"));
        assert_eq!(cmd.flag_value("--histogram"), Some("histogram"));
        assert_eq!(cmd.flag_value("--gpu_id"), Some("2"));

        assert_eq!(
            cmd.program,
            PathBuf::from("/opt/em/fsc3D-3.0/ThreeDFSC/ThreeDFSC_Start.py")
        );
        assert_eq!(cmd.activation.as_deref(), Some("conda activate fsc3D-3.0"));
    }

    #[test]
    fn test_invocation_is_deterministic() {
        let (config, layout, paths) = fixture(true);
        let params = RunParameters::default();
        assert_eq!(
            build_invocation(&config, &layout, &paths, &params),
            build_invocation(&config, &layout, &paths, &params)
        );
    }

    #[test]
    fn test_environment_drops_pythonpath_and_prepends_tool_dir() {
        let config = ToolConfig::new("/opt/em/fsc3D-3.0");
        let mut base = HashMap::new();
        base.insert("PATH".to_string(), "/usr/bin:/bin".to_string());
        base.insert("PYTHONPATH".to_string(), "/host/site-packages".to_string());
        base.insert("HOME".to_string(), "/home/user".to_string());

        let env = build_environment(&base, &config);

        assert!(!env.contains_key("PYTHONPATH"));
        assert_eq!(env["PATH"], "/opt/em/fsc3D-3.0/ThreeDFSC:/usr/bin:/bin");
        assert_eq!(env["HOME"], "/home/user");
        // base is untouched
        assert!(base.contains_key("PYTHONPATH"));
    }

    #[test]
    fn test_environment_without_path() {
        let config = ToolConfig::new("/opt/em/fsc3D-3.0");
        let env = build_environment(&HashMap::new(), &config);
        assert_eq!(env["PATH"], "/opt/em/fsc3D-3.0/ThreeDFSC");
    }
}
