//! Configuration for the staging transfer.

use serde::{Deserialize, Serialize};

/// Configuration for moving creation files into staging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Whether to try a rename before falling back to copy.
    #[serde(default = "default_true")]
    pub prefer_atomic_moves: bool,

    /// Maximum file operations in flight for one creation.
    #[serde(default = "default_max_parallel")]
    pub max_parallel_file_ops: usize,
}

fn default_buffer_size() -> usize {
    1024 * 1024 // 1 MB
}

fn default_true() -> bool {
    true
}

fn default_max_parallel() -> usize {
    4
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            prefer_atomic_moves: true,
            max_parallel_file_ops: default_max_parallel(),
        }
    }
}

impl TransferConfig {
    /// Enables or disables rename-first moves.
    pub fn with_atomic_moves(mut self, enabled: bool) -> Self {
        self.prefer_atomic_moves = enabled;
        self
    }

    /// Sets the buffer size for copies.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets how many files may be transferred at once.
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel_file_ops = max;
        self
    }
}
