// Result viewer - picks artifacts and hands them to external programs

use crate::domain::layout::relative_path;
use crate::domain::{artifacts, JobLayout, ToolConfig};
use crate::port::ViewerLauncher;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Artifact not found: {0}")]
    ArtifactMissing(PathBuf),

    #[error("Unsupported view: {0}")]
    Unsupported(String),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which 3D FSC volumes to display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeSelection {
    #[default]
    Original,
    Thresholded,
    ThresholdedBinarized,
    All,
}

/// Plots produced by the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plot {
    /// Histogram and directional FSC plot
    Histogram,
    /// Fourier transform power plot
    FourierTransform,
    Fsc3d,
}

impl Plot {
    pub fn artifact(self) -> &'static str {
        match self {
            Plot::Histogram => artifacts::HISTOGRAM,
            Plot::FourierTransform => artifacts::PLOT_FT,
            Plot::Fsc3d => artifacts::PLOT_3DFSC,
        }
    }
}

/// Candidate volume paths for a selection (existing or not)
pub fn selected_volumes(layout: &JobLayout, selection: VolumeSelection) -> Vec<PathBuf> {
    let rels: &[&str] = match selection {
        VolumeSelection::Original => &[artifacts::VOLUME],
        VolumeSelection::Thresholded => &[artifacts::VOLUME_THRESHOLDED],
        VolumeSelection::ThresholdedBinarized => &[artifacts::VOLUME_THRESHOLDED_BINARIZED],
        VolumeSelection::All => &[
            artifacts::VOLUME,
            artifacts::VOLUME_THRESHOLDED,
            artifacts::VOLUME_THRESHOLDED_BINARIZED,
        ],
    };
    rels.iter().map(|rel| layout.artifact(rel)).collect()
}

/// Write `chimera_volumes.cxc` into the working directory
///
/// One `open` per existing volume (paths relative to the script), then `tile`.
pub fn write_chimera_script(
    layout: &JobLayout,
    selection: VolumeSelection,
) -> Result<PathBuf, ViewerError> {
    let working_dir = layout.working_dir();
    let script = working_dir.join(artifacts::CHIMERA_VOLUMES_SCRIPT);

    let mut file = std::fs::File::create(&script)?;
    for vol in selected_volumes(layout, selection) {
        if vol.is_file() {
            writeln!(file, "open {}", relative_path(&working_dir, &vol).display())?;
        }
    }
    writeln!(file, "tile")?;

    Ok(script)
}

/// Displays a job's results through external programs
pub struct ResultViewer {
    config: Arc<ToolConfig>,
    launcher: Arc<dyn ViewerLauncher>,
}

impl ResultViewer {
    pub fn new(config: Arc<ToolConfig>, launcher: Arc<dyn ViewerLauncher>) -> Self {
        Self { config, launcher }
    }

    /// Open the selected volumes as surfaces in ChimeraX
    pub fn show_volumes(
        &self,
        layout: &JobLayout,
        selection: VolumeSelection,
    ) -> Result<PathBuf, ViewerError> {
        let script = write_chimera_script(layout, selection)?;
        self.launch(&self.config.chimera_program, script.clone())?;
        Ok(script)
    }

    pub fn show_plot(&self, layout: &JobLayout, plot: Plot) -> Result<PathBuf, ViewerError> {
        let path = layout.artifact(plot.artifact());
        if !path.is_file() {
            return Err(ViewerError::ArtifactMissing(path));
        }
        self.launch(&self.config.image_viewer_program, path.clone())?;
        Ok(path)
    }

    /// Chimera animation colouring the map by angular resolution
    ///
    /// The generated `.cmd` targets legacy Chimera and does not run in ChimeraX.
    pub fn show_chimera_animation(&self, _layout: &JobLayout) -> Result<PathBuf, ViewerError> {
        Err(ViewerError::Unsupported(
            "ChimeraX is not supported for this animation yet.".to_string(),
        ))
    }

    fn launch(&self, program: &str, file: PathBuf) -> Result<(), ViewerError> {
        info!(program = %program, file = %file.display(), "Launching viewer");
        self.launcher
            .launch(program, &file)
            .map_err(|source| ViewerError::Launch {
                program: program.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::viewer_launcher::mocks::RecordingLauncher;

    fn touch(layout: &JobLayout, rel: &str) {
        let path = layout.artifact(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_selection() {
        let layout = JobLayout::new("/jobs/j");
        assert_eq!(
            selected_volumes(&layout, VolumeSelection::Original),
            vec![layout.artifact(artifacts::VOLUME)]
        );
        assert_eq!(selected_volumes(&layout, VolumeSelection::All).len(), 3);
    }

    #[test]
    fn test_chimera_script_skips_missing_volumes() {
        let dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::new(dir.path());
        touch(&layout, artifacts::VOLUME);
        touch(&layout, artifacts::VOLUME_THRESHOLDED_BINARIZED);

        let script = write_chimera_script(&layout, VolumeSelection::All).unwrap();

        assert_eq!(script, layout.working_dir().join("chimera_volumes.cxc"));
        assert_eq!(
            std::fs::read_to_string(script).unwrap(),
            "open Results_vol/vol.mrc\nopen Results_vol/vol_ThresholdedBinarized.mrc\ntile\n"
        );
    }

    #[test]
    fn test_show_volumes_launches_chimera() {
        let dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::new(dir.path());
        touch(&layout, artifacts::VOLUME);

        let launcher = Arc::new(RecordingLauncher::new());
        let viewer = ResultViewer::new(Arc::new(ToolConfig::new("/opt")), launcher.clone());
        let script = viewer
            .show_volumes(&layout, VolumeSelection::Original)
            .unwrap();

        assert_eq!(launcher.launched(), vec![("chimerax".to_string(), script)]);
    }

    #[test]
    fn test_missing_plot() {
        let dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::new(dir.path());
        let launcher = Arc::new(RecordingLauncher::new());
        let viewer = ResultViewer::new(Arc::new(ToolConfig::new("/opt")), launcher.clone());

        let err = viewer.show_plot(&layout, Plot::Histogram).unwrap_err();
        assert!(matches!(err, ViewerError::ArtifactMissing(_)));

        touch(&layout, artifacts::PLOT_FT);
        viewer.show_plot(&layout, Plot::FourierTransform).unwrap();
        assert_eq!(launcher.launched()[0].0, "xdg-open");
    }

    #[test]
    fn test_animation_unsupported() {
        let viewer = ResultViewer::new(
            Arc::new(ToolConfig::new("/opt")),
            Arc::new(RecordingLauncher::new()),
        );
        let err = viewer
            .show_chimera_animation(&JobLayout::new("/jobs/j"))
            .unwrap_err();
        assert!(matches!(err, ViewerError::Unsupported(_)));
    }
}
