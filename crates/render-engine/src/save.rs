//! File-save collaborators: where a finished artifact goes.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use photostrip_common::error::PhotostripResult;

use crate::export::ExportArtifact;

/// Hands a finished artifact to the user.
///
/// The exporter does not wait for any confirmation beyond this call
/// returning; an error means the hand-off itself failed.
pub trait FileSaver: Send + Sync {
    fn trigger_download(&self, artifact: &ExportArtifact) -> PhotostripResult<()>;
}

/// Saves artifacts into a directory.
///
/// Bytes go to a hidden sibling first and are renamed into place, so a
/// failed write never leaves a truncated file under the final name.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path for `filename`.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

impl FileSaver for DirectorySaver {
    fn trigger_download(&self, artifact: &ExportArtifact) -> PhotostripResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.path_for(&artifact.filename);
        let partial = self.dir.join(format!(".{}.partial", artifact.filename));

        if let Err(e) = std::fs::write(&partial, &artifact.png) {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&partial, &target) {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }

        tracing::info!(
            path = %target.display(),
            bytes = artifact.png.len(),
            "Saved photo strip"
        );
        Ok(())
    }
}

/// Keeps artifacts in memory for hosts that handle the bytes themselves
/// (clipboard, UI preview).
#[derive(Debug, Default)]
pub struct MemorySaver {
    saved: Mutex<Vec<ExportArtifact>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifacts received so far, oldest first.
    pub fn saved(&self) -> Vec<ExportArtifact> {
        self.saved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self) -> usize {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl FileSaver for MemorySaver {
    fn trigger_download(&self, artifact: &ExportArtifact) -> PhotostripResult<()> {
        self.saved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(artifact.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str) -> ExportArtifact {
        ExportArtifact {
            filename: name.to_string(),
            width: 1,
            height: 1,
            png: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_directory_saver_writes_final_file_only() {
        let dir = std::env::temp_dir().join("photostrip_test_saver");
        let _ = std::fs::remove_dir_all(&dir);

        let saver = DirectorySaver::new(&dir);
        saver.trigger_download(&artifact("strip.png")).unwrap();

        assert_eq!(std::fs::read(dir.join("strip.png")).unwrap(), vec![1, 2, 3]);
        assert!(!dir.join(".strip.png.partial").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_memory_saver_collects_in_order() {
        let saver = MemorySaver::new();
        saver.trigger_download(&artifact("a.png")).unwrap();
        saver.trigger_download(&artifact("b.png")).unwrap();
        let names: Vec<String> = saver.saved().into_iter().map(|a| a.filename).collect();
        assert_eq!(names, ["a.png", "b.png"]);
    }
}
