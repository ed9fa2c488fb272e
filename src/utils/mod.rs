//! CLI helpers: device prompt and program file input

pub mod prompt;

pub use prompt::{format_device_list, prompt_pick_index};

use crate::error::{RemoteError, Result};
use std::path::Path;
use tracing::warn;

/// Read a program image as-is
///
/// An empty file is still returned; the device decides what to do with it.
pub async fn read_program(path: &Path) -> Result<Vec<u8>> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        RemoteError::invalid_input(format!("Cannot read program {}: {}", path.display(), e))
    })?;

    if bytes.is_empty() {
        warn!("⚠️  Program {} is empty", path.display());
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_program() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.prg");
        std::fs::write(&path, [0x01, 0x08, 0x60]).unwrap();

        assert_eq!(read_program(&path).await.unwrap(), vec![0x01, 0x08, 0x60]);
    }

    #[tokio::test]
    async fn test_read_program_passes_empty_file_through() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.prg");
        std::fs::write(&empty, b"").unwrap();

        assert_eq!(read_program(&empty).await.unwrap(), Vec::<u8>::new());
    }

    #[tokio::test]
    async fn test_read_program_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_program(&dir.path().join("missing.prg")).await,
            Err(RemoteError::InvalidInput(_))
        ));
    }
}
