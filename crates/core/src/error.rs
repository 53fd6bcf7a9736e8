// Central Error Type for the adapter

use std::path::PathBuf;
use thiserror::Error;

/// Adapter-level error type
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Missing half-maps: {0}")]
    MissingHalfMaps(String),

    #[error("Invalid parameter {name} = {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("3D FSC run failed: {} was not produced{}", .expected.display(), format_tail(.stdout_tail, .stderr_tail))]
    RunFailed {
        expected: PathBuf,
        stdout_tail: Option<String>,
        stderr_tail: Option<String>,
    },

    #[error("Conversion error: {0}")]
    Conversion(#[from] crate::port::ConversionError),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::domain::ParameterViolation> for AdapterError {
    fn from(v: crate::domain::ParameterViolation) -> Self {
        AdapterError::InvalidParameter {
            name: v.name,
            value: v.value,
            expected: v.expected,
        }
    }
}

fn format_tail(stdout: &Option<String>, stderr: &Option<String>) -> String {
    let mut out = String::new();
    if let Some(s) = stdout.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str("\n--- stdout (tail) ---\n");
        out.push_str(s.trim_end());
    }
    if let Some(s) = stderr.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str("\n--- stderr (tail) ---\n");
        out.push_str(s.trim_end());
    }
    out
}

/// Result type alias using AdapterError
pub type Result<T> = std::result::Result<T, AdapterError>;
