use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Diagnostic log lives in the state dir, away from the child's view.
    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("classhub");
            Some(state_dir.join("classhub.log"))
        } else {
            ProjectDirs::from("", "", "classhub")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("classhub.log"))
        }
    }
}
