//! Filesystem port for file I/O operations.

use std::path::Path;

use super::PortError;

/// Provides filesystem access for reading and writing files.
///
/// Abstracting the filesystem allows testing the backup reader and writer
/// without touching the real disk.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, PortError>;

    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        Ok(String::from_utf8(self.read_bytes(path)?)?)
    }

    /// Writes the given contents to a file, creating parent directories and
    /// overwriting any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), PortError>;

    /// Returns `true` if the path exists.
    fn exists(&self, path: &Path) -> bool;
}
