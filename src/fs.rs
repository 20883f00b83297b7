//! Synchronous file helpers used where the caller cannot await, such as the session store.

use crate::Result;
use anyhow::Context;
use std::io::ErrorKind;
use std::path::Path;

pub(crate) fn create_dir_all(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::create_dir_all(path)
        .with_context(|| format!("Unable to create directory {}", path.display()))
}

/// Writes `data` to `path`, creating the parent directory if needed.
pub(crate) fn write(path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    std::fs::write(path, data).with_context(|| format!("Unable to write data to {}", path.display()))
}

/// Reads `path` to a `String`, returning `None` if the file does not exist.
pub(crate) fn read_optional(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Unable to read file {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("file.txt");
        write(&path, "hello").unwrap();
        assert_eq!(read_optional(&path).unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_read_missing() {
        let dir = TempDir::new().unwrap();
        assert!(read_optional(dir.path().join("nope.json")).unwrap().is_none());
    }
}
