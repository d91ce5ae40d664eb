//! Rename seam used by the stager.

use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Raw OS error code for a cross-device link (EXDEV on Linux and macOS).
const EXDEV: i32 = 18;

/// Moves a file within one filesystem.
#[async_trait]
pub trait FileMover: Send + Sync {
    /// Renames `from` to `to`.
    ///
    /// Must fail with a cross-device error when the paths are on different
    /// filesystems, so the caller can fall back to copying.
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// `FileMover` backed by `tokio::fs::rename`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileMover;

#[async_trait]
impl FileMover for TokioFileMover {
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }
}

/// Whether an error is the cross-device rename failure.
pub fn is_cross_device(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::CrossesDevices || error.raw_os_error() == Some(EXDEV)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cross_device() {
        assert!(is_cross_device(&io::Error::from_raw_os_error(EXDEV)));
        assert!(is_cross_device(&io::Error::from(io::ErrorKind::CrossesDevices)));
        assert!(!is_cross_device(&io::Error::from(io::ErrorKind::NotFound)));
    }

    #[tokio::test]
    async fn test_tokio_mover_renames() {
        let temp = tempfile::TempDir::new().unwrap();
        let from = temp.path().join("a.esp");
        let to = temp.path().join("b.esp");
        tokio::fs::write(&from, b"plugin").await.unwrap();

        TokioFileMover.rename(&from, &to).await.unwrap();
        assert!(!from.exists());
        assert!(to.exists());
    }
}
