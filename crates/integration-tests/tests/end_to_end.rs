//! End-to-end adapter runs against a stubbed tool
//!
//! Real MRC hand-off into the job tree, canned tool behaviour.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use fsc3d_core::application::{JobAdapter, RunRequest};
use fsc3d_core::domain::{artifacts, JobState, RunParameters, ToolConfig, VolumeRef};
use fsc3d_core::port::id_provider::UuidProvider;
use fsc3d_core::port::time_provider::SystemTimeProvider;
use fsc3d_core::port::tool_runner::mocks::StubToolRunner;
use fsc3d_core::AdapterError;
use fsc3d_infra_system::MrcVolumeConverter;

fn write_inputs(dir: &Path) -> (VolumeRef, VolumeRef, VolumeRef) {
    for name in ["betagal.mrc", "betagal_half1.mrc", "betagal_half2.mrc"] {
        std::fs::write(dir.join(name), name.as_bytes()).unwrap();
    }
    (
        VolumeRef::new(dir.join("betagal.mrc"), 3.54),
        VolumeRef::new(dir.join("betagal_half1.mrc"), 3.54),
        VolumeRef::new(dir.join("betagal_half2.mrc"), 3.54),
    )
}

fn adapter(runner: Arc<StubToolRunner>) -> JobAdapter {
    JobAdapter::new(
        Arc::new(ToolConfig::new("/opt/em/fsc3D-3.0")),
        Arc::new(MrcVolumeConverter::new()),
        runner,
        Arc::new(SystemTimeProvider),
    )
}

/// Full map + two half-maps, no mask, default parameters, stub writes only vol.mrc
#[tokio::test]
async fn test_default_run_without_sphericity_line() {
    let inputs = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let (full, half1, half2) = write_inputs(inputs.path());

    let runner = Arc::new(StubToolRunner::canonical_only());
    let adapter = adapter(runner.clone());
    let mut job = adapter.allocate_job(work.path(), &UuidProvider).unwrap();

    let layout = job.layout.clone();
    let paths = adapter
        .prepare_inputs(&layout, &full, Some(&half1), Some(&half2), None)
        .unwrap();
    job.inputs_prepared().unwrap();
    assert_eq!(std::fs::read(&paths.half2).unwrap(), b"betagal_half2.mrc");

    let cmd = adapter.build_invocation(&layout, &paths, &RunParameters::default());
    assert!(!cmd.has_flag("--mask"));

    job.invoke(0).unwrap();
    adapter
        .execute(&layout, &cmd, adapter.environment(&HashMap::new()), None)
        .await
        .unwrap();
    let result = adapter.collect_result(&layout).unwrap();
    job.succeed(1).unwrap();

    assert_eq!(result.sphericity, 0.0);
    assert_eq!(result.volume, layout.artifact(artifacts::VOLUME));
    assert!(result.has_warnings());
    assert_eq!(runner.call_count(), 1);
    assert_eq!(job.state, JobState::Succeeded);
}

#[tokio::test]
async fn test_run_reports_sphericity_and_json_shape() {
    let inputs = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let (full, half1, half2) = write_inputs(inputs.path());

    let runner = Arc::new(StubToolRunner::producing(
        vec![
            (artifacts::VOLUME, b"MRC".to_vec()),
            (artifacts::HISTOGRAM, b"PNG".to_vec()),
            (artifacts::GLOBAL_FSC_CSV, b"0.1,0.9\n".to_vec()),
        ],
        "Loading\nSphericity is 0.847 at threshold 0.5\n",
    ));
    let adapter = adapter(runner);
    let mut job = adapter.allocate_job(work.path(), &UuidProvider).unwrap();

    let request = RunRequest::new(full.clone()).with_half_maps(half1, half2);
    let result = adapter
        .run(&mut job, &request, &HashMap::new(), None)
        .await
        .unwrap();

    assert_eq!(result.sphericity, 0.847);
    assert!(result.histogram.is_some());
    assert!(result.plot_ft.is_none());

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["sphericity"], 0.847);
    assert!(value.get("warnings").is_none());
    assert!(value["plot_ft"].is_null());

    let output = adapter.register_outputs(&job.layout, &result, &full).unwrap();
    assert_eq!(output.label, "3D FSC");
}

#[tokio::test]
async fn test_missing_input_file_fails_before_invocation() {
    let work = tempfile::tempdir().unwrap();
    let runner = Arc::new(StubToolRunner::canonical_only());
    let adapter = adapter(runner.clone());
    let mut job = adapter.allocate_job(work.path(), &UuidProvider).unwrap();

    let request = RunRequest::new(
        VolumeRef::new("/nonexistent/map.mrc", 1.0)
            .with_half_maps("/nonexistent/h1.mrc", "/nonexistent/h2.mrc"),
    );
    let err = adapter
        .run(&mut job, &request, &HashMap::new(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::Conversion(_)));
    assert_eq!(runner.call_count(), 0);
    assert_eq!(job.state, JobState::Failed);
}

#[tokio::test]
async fn test_concurrent_jobs_use_separate_directories() {
    let inputs = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let (full, half1, half2) = write_inputs(inputs.path());

    let adapter = Arc::new(adapter(Arc::new(StubToolRunner::canonical_only())));
    let request = RunRequest::new(full).with_half_maps(half1, half2);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let adapter = adapter.clone();
        let request = request.clone();
        let root = work.path().to_path_buf();
        handles.push(tokio::spawn(async move {
            let mut job = adapter.allocate_job(&root, &UuidProvider).unwrap();
            adapter
                .run(&mut job, &request, &HashMap::new(), None)
                .await
                .map(|r| r.volume)
        }));
    }

    let mut volumes = Vec::new();
    for h in handles {
        volumes.push(h.await.unwrap().unwrap());
    }
    volumes.sort();
    volumes.dedup();
    assert_eq!(volumes.len(), 4);
}
