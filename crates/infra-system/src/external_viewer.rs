// Launches external viewers (ChimeraX, image viewer) detached from this process

use fsc3d_core::port::ViewerLauncher;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::info;

#[derive(Debug, Default, Clone)]
pub struct ExternalViewer;

impl ExternalViewer {
    pub fn new() -> Self {
        Self
    }
}

impl ViewerLauncher for ExternalViewer {
    fn launch(&self, program: &str, file: &Path) -> std::io::Result<()> {
        let child = Command::new(program)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        // never waited on; the viewer outlives this short-lived CLI process
        info!(program = %program, pid = child.id(), "Viewer started");
        Ok(())
    }
}
