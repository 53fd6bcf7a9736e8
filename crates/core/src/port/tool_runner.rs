// Tool Runner Port
// Abstraction over the external 3DFSC binary so the adapter runs against a stub in tests

use crate::domain::CommandLine;
use crate::port::cancel::CancelToken;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Everything needed to launch the tool once
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub command: CommandLine,
    /// Process current directory
    pub working_dir: PathBuf,
    /// Complete environment of the child (nothing is inherited)
    pub env: HashMap<String, String>,
    /// Directory receiving `run.stdout` / `run.stderr`
    pub logs_dir: PathBuf,
    pub cancel: Option<CancelToken>,
}

/// Outcome of a finished process
///
/// The exit status is informational only; success of a run is decided by
/// the artifacts it leaves behind.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub duration_ms: i64,
    pub exit_code: Option<i32>,
    /// Last lines of the captured output; the full logs stay in `logs_dir`
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

/// Execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process cancelled by host")]
    Cancelled,

    #[error("Process killed: {0}")]
    Killed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Tool Runner trait
///
/// Implementations:
/// - SubprocessRunner: spawns the real tool (fsc3d-infra-system)
/// - mocks::StubToolRunner: writes canned artifacts
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the command to completion; never retries
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the process cannot be started
    /// - ExecutionError::Cancelled if the cancel token fired first
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::layout::{STDERR_LOG, STDOUT_LOG};
    use std::sync::{Arc, Mutex};

    /// Stub behavior
    #[derive(Debug, Clone)]
    pub enum StubBehavior {
        /// Write files (relative to the working dir) and print `stdout`
        Produce {
            files: Vec<(String, Vec<u8>)>,
            stdout: String,
            exit_code: i32,
        },
        /// Fail to spawn with message
        SpawnFail(String),
    }

    /// Stand-in for the external tool
    pub struct StubToolRunner {
        behavior: StubBehavior,
        requests: Arc<Mutex<Vec<ExecutionRequest>>>,
    }

    impl StubToolRunner {
        pub fn new(behavior: StubBehavior) -> Self {
            Self {
                behavior,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Writes only the canonical volume, prints nothing
        pub fn canonical_only() -> Self {
            Self::producing(vec![(crate::domain::artifacts::VOLUME, b"MRC".to_vec())], "")
        }

        /// Exits without producing anything
        pub fn silent_failure(output: &str) -> Self {
            Self::new(StubBehavior::Produce {
                files: Vec::new(),
                stdout: output.to_string(),
                exit_code: 1,
            })
        }

        pub fn producing(files: Vec<(&str, Vec<u8>)>, stdout: &str) -> Self {
            Self::new(StubBehavior::Produce {
                files: files
                    .into_iter()
                    .map(|(p, c)| (p.to_string(), c))
                    .collect(),
                stdout: stdout.to_string(),
                exit_code: 0,
            })
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        /// Requests seen so far
        pub fn requests(&self) -> Vec<ExecutionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolRunner for StubToolRunner {
        async fn execute(
            &self,
            request: ExecutionRequest,
        ) -> Result<ExecutionResult, ExecutionError> {
            self.requests.lock().unwrap().push(request.clone());

            match &self.behavior {
                StubBehavior::SpawnFail(msg) => Err(ExecutionError::SpawnFailed(msg.clone())),
                StubBehavior::Produce {
                    files,
                    stdout,
                    exit_code,
                } => {
                    let io = |e: std::io::Error| ExecutionError::IoError(e.to_string());
                    for (rel, contents) in files {
                        let path = request.working_dir.join(rel);
                        if let Some(parent) = path.parent() {
                            std::fs::create_dir_all(parent).map_err(io)?;
                        }
                        std::fs::write(&path, contents).map_err(io)?;
                    }
                    std::fs::create_dir_all(&request.logs_dir).map_err(io)?;
                    std::fs::write(request.logs_dir.join(STDOUT_LOG), stdout).map_err(io)?;
                    std::fs::write(request.logs_dir.join(STDERR_LOG), "").map_err(io)?;

                    Ok(ExecutionResult {
                        status: if *exit_code == 0 {
                            ExecutionStatus::Success
                        } else {
                            ExecutionStatus::Failed
                        },
                        duration_ms: 10,
                        exit_code: Some(*exit_code),
                        stdout: Some(stdout.clone()),
                        stderr: None,
                    })
                }
            }
        }
    }
}
