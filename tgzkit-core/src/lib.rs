//! # tgzkit Core
//!
//! Shared building blocks for the tgzkit archive engines.
//!
//! - [`blockio`]: 512-byte block arithmetic and bounded chunked copying
//! - [`progress`]: the progress-reporting capability and stock sinks
//! - [`options`]: tar and gzip operation options
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```rust
//! use tgzkit_core::blockio::{blocks_for, copy_chunked, CHUNK_SIZE};
//! use std::io::Cursor;
//!
//! assert_eq!(blocks_for(1000), 2);
//!
//! let mut out = Vec::new();
//! let copied = copy_chunked(&mut Cursor::new(b"data"), &mut out, None, CHUNK_SIZE, |_| {}).unwrap();
//! assert_eq!(copied, 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod blockio;
pub mod error;
pub mod options;
pub mod progress;

// Re-exports for convenience
pub use blockio::{BLOCK_SIZE, CHUNK_SIZE, MAX_BLOCKS_IN_MEMORY};
pub use error::{ErrorKind, Result, TgzError};
pub use options::{GzipLevel, TarOptions};
pub use progress::{FnProgress, NoProgress, Progress, VirtualProgress};
