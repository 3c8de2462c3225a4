//! # tgzkit Archive
//!
//! Tar, gzip and tar.gz support for tgzkit.
//!
//! - **TAR**: pack directory trees into UStar archives and extract them
//! - **GZIP**: whole-file compression over `flate2`
//! - **Façade**: one-call tar, gzip and tar.gz workflows
//! - **Tasks**: run any of the above on a background worker
//!
//! ## Example
//!
//! ```rust,no_run
//! use tgzkit_archive::detect::ArchiveFormat;
//! use tgzkit_archive::facade;
//! use std::path::Path;
//!
//! let archive = Path::new("backup.tar.gz");
//! facade::tar_gzip_file(Path::new("project"), archive).unwrap();
//!
//! match ArchiveFormat::detect_path(archive).unwrap() {
//!     ArchiveFormat::Gzip => facade::untar_gzip_file(archive, Path::new("out")).unwrap(),
//!     ArchiveFormat::Tar => facade::untar_file(archive, Path::new("out")).unwrap(),
//!     ArchiveFormat::Unknown => eprintln!("not an archive"),
//! }
//! ```
//!
//! ## Format Detection
//!
//! Use [`detect::ArchiveFormat`] to tell gzip streams and tar archives apart
//! by their magic bytes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod detect;
pub mod facade;
pub mod gzip;
pub mod tar;
pub mod task;

// Re-exports
pub use detect::ArchiveFormat;
pub use facade::Settings;
pub use gzip::GzipFile;
pub use tar::{ArchiveSummary, TarEntry, TarFile, TarHeader, TarReader, TarWriter};
