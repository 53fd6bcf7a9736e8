// Job Adapter - prepare inputs, invoke 3DFSC, collect its artifacts

pub mod invocation;
pub mod report;

pub use invocation::{build_environment, build_invocation};
pub use report::{scan_sphericity, SphericityScan, SPHERICITY_MARKER};

use crate::domain::layout::{artifacts, INPUT_FULL, INPUT_HALF1, INPUT_HALF2, INPUT_MASK};
use crate::domain::params::sampling_rate_violation;
use crate::domain::result::OUTPUT_LABEL;
use crate::domain::{
    CommandLine, ConvertedPaths, FscJob, JobLayout, MaskRef, OutputVolume, ResultWarning,
    RunParameters, RunResult, ToolConfig, VolumeRef,
};
use crate::error::{AdapterError, Result};
use crate::port::{
    CancelToken, ExecutionRequest, ExecutionResult, IdProvider, TimeProvider, ToolRunner,
    VolumeConverter,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Inputs of one job as the host hands them over
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub full_map: VolumeRef,
    pub half1: Option<VolumeRef>,
    pub half2: Option<VolumeRef>,
    pub mask: Option<MaskRef>,
    pub params: RunParameters,
}

impl RunRequest {
    pub fn new(full_map: VolumeRef) -> Self {
        Self {
            full_map,
            half1: None,
            half2: None,
            mask: None,
            params: RunParameters::default(),
        }
    }

    pub fn with_half_maps(mut self, half1: VolumeRef, half2: VolumeRef) -> Self {
        self.half1 = Some(half1);
        self.half2 = Some(half2);
        self
    }

    pub fn with_mask(mut self, mask: MaskRef) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_params(mut self, params: RunParameters) -> Self {
        self.params = params;
        self
    }
}

/// Adapter between typed job inputs and the external 3DFSC tool
///
/// Holds no per-job state: every call works on the job tree it is given,
/// so one adapter can serve concurrent jobs with distinct directories.
pub struct JobAdapter {
    config: Arc<ToolConfig>,
    converter: Arc<dyn VolumeConverter>,
    runner: Arc<dyn ToolRunner>,
    time_provider: Arc<dyn TimeProvider>,
}

impl JobAdapter {
    pub fn new(
        config: Arc<ToolConfig>,
        converter: Arc<dyn VolumeConverter>,
        runner: Arc<dyn ToolRunner>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            config,
            converter,
            runner,
            time_provider,
        }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Create a fresh job directory `<work_root>/<id>/{tmp,extra,logs}`
    ///
    /// Fails if the directory already exists, so two jobs never share a tree.
    pub fn allocate_job(&self, work_root: &Path, id_provider: &dyn IdProvider) -> Result<FscJob> {
        std::fs::create_dir_all(work_root)?;
        let id = id_provider.generate_id();
        let layout = JobLayout::new(work_root.join(&id));

        std::fs::create_dir(layout.root())?;
        for dir in [layout.tmp_dir(), layout.working_dir(), layout.logs_dir()] {
            std::fs::create_dir_all(dir)?;
        }

        info!(job_id = %id, root = %layout.root().display(), "Allocated job directory");
        Ok(FscJob::new(id, layout, self.time_provider.now_millis()))
    }

    /// Every problem with a request, as human-readable lines
    pub fn validate(&self, request: &RunRequest) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(e) = resolve_half_maps(&request.full_map, &request.half1, &request.half2) {
            errors.push(e.to_string());
        }
        if let Some(v) = sampling_rate_violation(request.full_map.sampling_rate) {
            errors.push(v.to_string());
        }
        errors.extend(request.params.violations().iter().map(|v| v.to_string()));

        errors
    }

    /// Copy the inputs into the job's `tmp/` tree under the names 3DFSC expects
    ///
    /// Half-maps are resolved before anything is written.
    pub fn prepare_inputs(
        &self,
        layout: &JobLayout,
        full_map: &VolumeRef,
        half1: Option<&VolumeRef>,
        half2: Option<&VolumeRef>,
        mask: Option<&MaskRef>,
    ) -> Result<ConvertedPaths> {
        let (src_half1, src_half2) =
            resolve_half_maps(full_map, &half1.cloned(), &half2.cloned())?;
        if let Some(v) = sampling_rate_violation(full_map.sampling_rate) {
            return Err(v.into());
        }

        std::fs::create_dir_all(layout.tmp_dir())?;

        let paths = ConvertedPaths {
            half1: layout.tmp_path(INPUT_HALF1),
            half2: layout.tmp_path(INPUT_HALF2),
            full: layout.tmp_path(INPUT_FULL),
            mask: mask.map(|_| layout.tmp_path(INPUT_MASK)),
            sampling_rate: full_map.sampling_rate,
        };

        self.converter.convert(&src_half1, &paths.half1)?;
        self.converter.convert(&src_half2, &paths.half2)?;
        self.converter.convert(&full_map.file_path(), &paths.full)?;
        if let (Some(mask), Some(dst)) = (mask, &paths.mask) {
            self.converter.convert(&mask.file_path(), dst)?;
        }

        debug!(tmp = %layout.tmp_dir().display(), masked = mask.is_some(), "Inputs converted");
        Ok(paths)
    }

    pub fn build_invocation(
        &self,
        layout: &JobLayout,
        paths: &ConvertedPaths,
        params: &RunParameters,
    ) -> CommandLine {
        build_invocation(&self.config, layout, paths, params)
    }

    /// Process environment for the tool derived from `base`
    pub fn environment(&self, base: &HashMap<String, String>) -> HashMap<String, String> {
        build_environment(base, &self.config)
    }

    /// Launch the tool once in the job's working directory and wait for it
    pub async fn execute(
        &self,
        layout: &JobLayout,
        command: &CommandLine,
        env: HashMap<String, String>,
        cancel: Option<CancelToken>,
    ) -> Result<ExecutionResult> {
        std::fs::create_dir_all(layout.working_dir())?;
        std::fs::create_dir_all(layout.logs_dir())?;

        let request = ExecutionRequest {
            command: command.clone(),
            working_dir: layout.working_dir(),
            env,
            logs_dir: layout.logs_dir(),
            cancel,
        };
        let result = self.runner.execute(request).await?;

        info!(
            exit_code = ?result.exit_code,
            duration_ms = %result.duration_ms,
            "3DFSC process exited"
        );
        Ok(result)
    }

    /// Reconcile the working directory into a `RunResult`
    pub fn collect_result(&self, layout: &JobLayout) -> Result<RunResult> {
        collect_result(layout)
    }

    /// Run a whole job: prepare, invoke, collect
    ///
    /// The job must be `NotStarted`; any other state is rejected before
    /// anything is written. Once started, an error leaves it `Failed` and
    /// its directory should be discarded.
    pub async fn run(
        &self,
        job: &mut FscJob,
        request: &RunRequest,
        base_env: &HashMap<String, String>,
        cancel: Option<CancelToken>,
    ) -> Result<RunResult> {
        job.ensure_not_started()?;
        if let Some(v) = request.params.violations().into_iter().next() {
            return Err(v.into());
        }

        match self.run_phases(job, request, base_env, cancel).await {
            Ok(result) => {
                job.succeed(self.time_provider.now_millis())?;
                info!(
                    job_id = %job.id,
                    sphericity = %result.sphericity,
                    duration_ms = ?job.run_duration_ms(),
                    "3DFSC job succeeded"
                );
                Ok(result)
            }
            Err(e) => {
                if !job.state.is_terminal() {
                    job.fail(self.time_provider.now_millis())?;
                }
                error!(job_id = %job.id, error = %e, "3DFSC job failed");
                Err(e)
            }
        }
    }

    async fn run_phases(
        &self,
        job: &mut FscJob,
        request: &RunRequest,
        base_env: &HashMap<String, String>,
        cancel: Option<CancelToken>,
    ) -> Result<RunResult> {
        let layout = job.layout.clone();

        let paths = self.prepare_inputs(
            &layout,
            &request.full_map,
            request.half1.as_ref(),
            request.half2.as_ref(),
            request.mask.as_ref(),
        )?;
        job.inputs_prepared()?;

        let command = self.build_invocation(&layout, &paths, &request.params);
        info!(job_id = %job.id, command = %command.to_shell_string(), "Invoking 3DFSC");

        job.invoke(self.time_provider.now_millis())?;
        self.execute(&layout, &command, self.environment(base_env), cancel)
            .await?;

        self.collect_result(&layout)
    }

    /// Turn a finished run into the record registered with the host
    ///
    /// Removes the intermediate `ResEMvolOut.mrc` the tool leaves behind.
    pub fn register_outputs(
        &self,
        layout: &JobLayout,
        result: &RunResult,
        full_map: &VolumeRef,
    ) -> Result<OutputVolume> {
        let unused = layout.artifact(artifacts::UNUSED_VOLUME);
        match std::fs::remove_file(&unused) {
            Ok(()) => debug!(path = %unused.display(), "Removed intermediate volume"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(OutputVolume {
            label: OUTPUT_LABEL.to_string(),
            file_name: result.volume.clone(),
            sampling_rate: full_map.sampling_rate,
            source: full_map.location.clone(),
        })
    }

    /// One-line summary of a job tree
    pub fn summary(&self, layout: &JobLayout) -> Vec<String> {
        summary(layout)
    }
}

/// Pick the half-map pair: both given directly, else the full map's association
fn resolve_half_maps(
    full_map: &VolumeRef,
    half1: &Option<VolumeRef>,
    half2: &Option<VolumeRef>,
) -> Result<(PathBuf, PathBuf)> {
    match (half1, half2) {
        (Some(h1), Some(h2)) => Ok((h1.file_path(), h2.file_path())),
        (None, None) => match &full_map.half_maps {
            Some((h1, h2)) => Ok((
                crate::domain::volume::strip_format_hint(h1),
                crate::domain::volume::strip_format_hint(h2),
            )),
            None => Err(AdapterError::MissingHalfMaps(
                "Input volume has no associated half-maps.".to_string(),
            )),
        },
        _ => Err(AdapterError::MissingHalfMaps(
            "Both half-maps must be provided when supplying them separately.".to_string(),
        )),
    }
}

/// Build a `RunResult` from the working directory of a finished run
///
/// Fails with `RunFailed` unless `Results_vol/vol.mrc` exists. Secondary
/// artifacts are optional. A missing sphericity line yields 0.0 and a
/// warning in the result.
pub fn collect_result(layout: &JobLayout) -> Result<RunResult> {
    let volume = layout.artifact(artifacts::VOLUME);
    if !volume.is_file() {
        return Err(AdapterError::RunFailed {
            expected: volume,
            stdout_tail: report::read_tail(&layout.stdout_log(), report::FAILURE_TAIL_LINES),
            stderr_tail: report::read_tail(&layout.stderr_log(), report::FAILURE_TAIL_LINES),
        });
    }

    let optional = |rel: &str| Some(layout.artifact(rel)).filter(|p| p.is_file());

    let report_path = layout.stdout_log();
    let mut warnings = Vec::new();
    let sphericity = match report::scan_sphericity_file(&report_path)? {
        SphericityScan::Found(value) => value,
        SphericityScan::Missing => {
            warnings.push(ResultWarning::SphericityMissing {
                report: report_path.clone(),
            });
            0.0
        }
        SphericityScan::Unparsable(line) => {
            warnings.push(ResultWarning::SphericityUnparsable {
                report: report_path.clone(),
                line,
            });
            0.0
        }
    };
    for w in &warnings {
        warn!(warning = %w, "Sphericity not reported");
    }

    Ok(RunResult {
        volume,
        volume_thresholded: optional(artifacts::VOLUME_THRESHOLDED),
        volume_thresholded_binarized: optional(artifacts::VOLUME_THRESHOLDED_BINARIZED),
        histogram: optional(artifacts::HISTOGRAM),
        plot_3dfsc: optional(artifacts::PLOT_3DFSC),
        plot_ft: optional(artifacts::PLOT_FT),
        chimera_cmd: optional(artifacts::CHIMERA_CMD),
        global_fsc_csv: optional(artifacts::GLOBAL_FSC_CSV),
        sphericity,
        warnings,
    })
}

/// `Sphericity: x.xxx` once the output exists
pub fn summary(layout: &JobLayout) -> Vec<String> {
    match collect_result(layout) {
        Ok(result) => vec![format!("Sphericity: {:0.3}", result.sphericity)],
        Err(_) => vec!["Output is not ready yet.".to_string()],
    }
}
