//! TAR archive format support.
//!
//! This module packs directory trees into UStar (POSIX.1-1988) archives and
//! extracts them again. Only regular files and directories are written;
//! entries of any other type are skipped on extraction.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tgzkit_archive::tar::TarFile;
//! use tgzkit_core::VirtualProgress;
//! use std::path::Path;
//!
//! let tar = TarFile::new("backup.tar");
//! tar.pack_from(Path::new("project"), &mut VirtualProgress::new()).unwrap();
//! tar.extract_to(Path::new("restored"), &mut VirtualProgress::new()).unwrap();
//! ```

pub mod header;
mod reader;
mod writer;

pub use header::{EntryKind, Field, TarHeader};
pub use reader::{extract_archive, sanitize_entry_path, TarEntry, TarReader};
pub use writer::{pack_tree, tree_size, TarWriter};

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tgzkit_core::error::{Result, TgzError};
use tgzkit_core::{NoProgress, Progress, TarOptions};
use tracing::debug;

/// Counts of what a pack or extract operation processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Regular files written or extracted.
    pub files: u64,
    /// Directories written or created.
    pub directories: u64,
    /// Entries skipped (unsupported types, unusable names).
    pub skipped: u64,
    /// Total file content in bytes, padding excluded.
    pub data_bytes: u64,
}

/// A tar archive on disk.
#[derive(Debug, Clone)]
pub struct TarFile {
    path: PathBuf,
    options: TarOptions,
}

impl TarFile {
    /// Refer to the archive at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: TarOptions::default(),
        }
    }

    /// Set the options used by every operation on this archive.
    pub fn with_options(mut self, options: TarOptions) -> Self {
        self.options = options;
        self
    }

    /// Path of the archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pack the tree rooted at `source` into this archive, replacing any
    /// existing file.
    ///
    /// On failure the archive is left partially written.
    pub fn pack_from(&self, source: &Path, progress: &mut dyn Progress) -> Result<ArchiveSummary> {
        if !source.exists() {
            return Err(TgzError::source_not_found(source));
        }
        debug!(archive = %self.path.display(), "creating tar archive");

        let file = File::create(&self.path)?;
        let mut tar = TarWriter::with_options(BufWriter::new(file), self.options);
        pack_tree(source, &mut tar, progress)
    }

    /// Extract this archive under `destination`, creating it if needed.
    pub fn extract_to(&self, destination: &Path, progress: &mut dyn Progress) -> Result<ArchiveSummary> {
        debug!(
            archive = %self.path.display(),
            destination = %destination.display(),
            "extracting tar archive"
        );

        let mut reader = self.open()?;
        extract_archive(&mut reader, destination, progress)
    }

    /// List the entries of this archive without extracting anything.
    pub fn list(&self) -> Result<Vec<TarEntry>> {
        self.open()?.entries()
    }

    /// Pack with progress reports discarded.
    pub fn pack(&self, source: &Path) -> Result<ArchiveSummary> {
        self.pack_from(source, &mut NoProgress)
    }

    /// Extract with progress reports discarded.
    pub fn extract(&self, destination: &Path) -> Result<ArchiveSummary> {
        self.extract_to(destination, &mut NoProgress)
    }

    fn open(&self) -> Result<TarReader<BufReader<File>>> {
        let file = File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TgzError::source_not_found(&self.path),
            _ => TgzError::Io(e),
        })?;
        let len = file.metadata()?.len();
        TarReader::new(BufReader::new(file), len, self.options)
    }
}
