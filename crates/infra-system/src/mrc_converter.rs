// Volume hand-off for MRC inputs
// 3DFSC reads MRC only; other formats need the host image library first

use fsc3d_core::port::{ConversionError, VolumeConverter};
use std::path::Path;
use tracing::debug;

const MRC_EXTENSIONS: [&str; 3] = ["mrc", "map", "mrcs"];

/// Copies MRC-family volumes into the job tree
#[derive(Debug, Default, Clone)]
pub struct MrcVolumeConverter;

impl MrcVolumeConverter {
    pub fn new() -> Self {
        Self
    }

    fn is_mrc(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| MRC_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)))
            .unwrap_or(false)
    }
}

impl VolumeConverter for MrcVolumeConverter {
    fn convert(&self, src: &Path, dst: &Path) -> Result<(), ConversionError> {
        if !src.is_file() {
            return Err(ConversionError::SourceMissing(src.display().to_string()));
        }
        if !Self::is_mrc(src) {
            return Err(ConversionError::UnsupportedFormat(src.display().to_string()));
        }
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let bytes = std::fs::copy(src, dst)?;
        debug!(src = %src.display(), dst = %dst.display(), bytes, "Volume copied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_mrc() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("half1.MRC");
        std::fs::write(&src, b"MRC data").unwrap();
        let dst = dir.path().join("tmp/volume_half1.mrc");

        MrcVolumeConverter::new().convert(&src, &dst).unwrap();

        assert_eq!(std::fs::read(&dst).unwrap(), b"MRC data");
    }

    #[test]
    fn test_rejects_other_formats() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("map.spi");
        std::fs::write(&src, b"spider").unwrap();

        let err = MrcVolumeConverter::new()
            .convert(&src, &dir.path().join("out.mrc"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = MrcVolumeConverter::new()
            .convert(&dir.path().join("none.mrc"), &dir.path().join("out.mrc"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::SourceMissing(_)));
    }
}
