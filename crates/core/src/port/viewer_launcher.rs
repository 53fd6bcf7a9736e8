// Viewer Launcher Port
// External programs (ChimeraX, an image viewer) that display results

use std::path::Path;

/// Opens a file in an external program without waiting for it
pub trait ViewerLauncher: Send + Sync {
    fn launch(&self, program: &str, file: &Path) -> std::io::Result<()>;
}

pub mod mocks {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records launches instead of spawning anything
    #[derive(Default)]
    pub struct RecordingLauncher {
        launched: Mutex<Vec<(String, PathBuf)>>,
    }

    impl RecordingLauncher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn launched(&self) -> Vec<(String, PathBuf)> {
            self.launched.lock().unwrap().clone()
        }
    }

    impl ViewerLauncher for RecordingLauncher {
        fn launch(&self, program: &str, file: &Path) -> std::io::Result<()> {
            self.launched
                .lock()
                .unwrap()
                .push((program.to_string(), file.to_path_buf()));
            Ok(())
        }
    }
}
