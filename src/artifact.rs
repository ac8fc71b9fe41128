use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::InstallResult;

/// A generated file: target path, full contents, and permission bits.
/// Artifacts are always overwritten in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
    pub mode: u32,
}

impl Artifact {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
            mode: 0o644,
        }
    }

    #[must_use]
    pub const fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Write the file, creating parent directories as needed.
    ///
    /// Contents go to a temporary file in the target directory that is
    /// renamed over the target, so a symlink planted at the target path
    /// is replaced rather than followed.
    pub fn write(&self) -> InstallResult<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        staged.write_all(self.contents.as_bytes())?;
        staged.as_file().sync_all()?;
        set_mode(staged.path(), self.mode)?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), mode = format!("{:o}", self.mode), "wrote artifact");
        Ok(())
    }

    /// Print the artifact for `--dry-run`.
    pub fn preview(&self) {
        println!("--- {} ({:o}) ---", self.path.display(), self.mode);
        println!("{}", self.contents.trim_end());
    }
}

pub fn set_mode(path: &Path, mode: u32) -> InstallResult<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}
