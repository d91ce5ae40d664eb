//! File mover that simulates a cross-device boundary.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::staging::FileMover;

/// A `FileMover` whose renames always fail with EXDEV, forcing the
/// copy-and-delete path.
#[derive(Debug, Default)]
pub struct CrossDeviceMover {
    attempts: AtomicUsize,
}

impl CrossDeviceMover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of renames attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileMover for CrossDeviceMover {
    async fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::from_raw_os_error(18))
    }
}
