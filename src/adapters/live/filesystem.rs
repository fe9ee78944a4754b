//! Live filesystem adapter using `std::fs`.

use std::path::Path;

use crate::ports::{FileSystem, PortError};

/// Live filesystem adapter backed by real disk I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, PortError> {
        Ok(std::fs::read(path)?)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), PortError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(std::fs::write(path, contents)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_parents_and_reads_back() {
        let dir = std::env::temp_dir().join("mangabridge_live_fs_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("out").join("backup.json");

        let fs = LiveFileSystem;
        fs.write(&path, b"{\"ok\":true}").unwrap();
        assert!(fs.exists(&path));
        assert_eq!(fs.read_to_string(&path).unwrap(), "{\"ok\":true}");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reading_missing_file_is_an_error() {
        let fs = LiveFileSystem;
        let missing = std::env::temp_dir().join("mangabridge_definitely_missing.zip");
        assert!(!fs.exists(&missing));
        assert!(fs.read_bytes(&missing).is_err());
    }
}
