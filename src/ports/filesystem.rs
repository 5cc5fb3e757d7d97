//! Filesystem port for the ledger's append-only files.

use std::path::Path;

use super::PortError;

/// Provides the filesystem operations the ledger needs.
///
/// Writes are append-only; nothing in the crate rewrites a file in place.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, PortError>;

    /// Appends `contents` to a file, creating it and its parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    fn append(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Creates a directory and all of its missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> Result<(), PortError>;

    /// Returns `true` if the path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists the entry names of a directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a directory or cannot be read.
    fn list_dir(&self, path: &Path) -> Result<Vec<String>, PortError>;
}
