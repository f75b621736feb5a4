//! Persistent storage for the bearer token.
//!
//! One file holding the token as a plain string. Absence means
//! logged-out. The token is the only piece of state that survives a
//! process restart.

use std::io;
use std::path::{Path, PathBuf};

/// On-disk home of the bearer token.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    /// Creates a token file handle at the given path.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location: `<config dir>/taskdeck/token`.
    ///
    /// Returns `None` when no config directory can be determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskdeck").join("token"))
    }

    /// Returns the path this handle reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted token. Absent, unreadable, or empty files
    /// all read as logged-out.
    #[must_use]
    pub fn load(&self) -> Option<String> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let token = contents.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    /// Writes the token, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; callers treat it as non-fatal.
    pub fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
    }

    /// Removes the token file. A missing file is already cleared.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; callers treat it as non-fatal.
    pub fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
