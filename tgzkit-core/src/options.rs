//! Operation options.

use crate::blockio::{BLOCK_SIZE, MAX_BLOCKS_IN_MEMORY};

/// Options shared by tar pack and extract operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TarOptions {
    /// Reject headers whose stored checksum does not match their contents.
    pub strict_checksum: bool,
    chunk_blocks: usize,
}

impl TarOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable strict checksum validation on extraction.
    pub fn with_strict_checksum(mut self, strict: bool) -> Self {
        self.strict_checksum = strict;
        self
    }

    /// Set the number of blocks copied per step, clamped to
    /// `1..=MAX_BLOCKS_IN_MEMORY`.
    pub fn with_chunk_blocks(mut self, blocks: usize) -> Self {
        self.chunk_blocks = blocks.clamp(1, MAX_BLOCKS_IN_MEMORY);
        self
    }

    /// Number of 512-byte blocks copied per step.
    pub fn chunk_blocks(&self) -> usize {
        self.chunk_blocks
    }

    /// Chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_blocks * BLOCK_SIZE
    }
}

impl Default for TarOptions {
    fn default() -> Self {
        Self {
            strict_checksum: false,
            chunk_blocks: MAX_BLOCKS_IN_MEMORY,
        }
    }
}

/// Gzip compression level (0-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipLevel(u8);

impl GzipLevel {
    /// No compression (store only).
    pub const NONE: Self = Self(0);
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a custom compression level (0-9).
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for GzipLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for GzipLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}
