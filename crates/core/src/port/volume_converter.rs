// Volume Converter Port
// Stand-in for the host image library: puts a volume where 3DFSC expects it

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Source volume not found: {0}")]
    SourceMissing(String),

    #[error("Unsupported volume format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts one volume file into an MRC file at `dst`
pub trait VolumeConverter: Send + Sync {
    fn convert(&self, src: &Path, dst: &Path) -> Result<(), ConversionError>;
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records conversions and writes a small placeholder instead
    #[derive(Default)]
    pub struct RecordingConverter {
        calls: Mutex<Vec<(std::path::PathBuf, std::path::PathBuf)>>,
    }

    impl RecordingConverter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<(std::path::PathBuf, std::path::PathBuf)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl VolumeConverter for RecordingConverter {
        fn convert(&self, src: &Path, dst: &Path) -> Result<(), ConversionError> {
            self.calls
                .lock()
                .unwrap()
                .push((src.to_path_buf(), dst.to_path_buf()));
            std::fs::write(dst, src.to_string_lossy().as_bytes())?;
            Ok(())
        }
    }
}
