//! One-call entry points for tar, gzip and tar.gz workflows.
//!
//! Every operation comes in two forms: a plain call that uses default
//! settings and discards progress, and a `_with` call that takes
//! [`Settings`] and a progress sink. The combined `.tar.gz` operations stage
//! an intermediate `.tar` in the system temp directory; the staged file is
//! removed whether the operation succeeds or fails.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tgzkit_archive::facade;
//!
//! facade::tar_gzip_file(Path::new("project"), Path::new("project.tar.gz")).unwrap();
//! facade::untar_gzip_file(Path::new("project.tar.gz"), Path::new("restored")).unwrap();
//! ```

use crate::gzip::GzipFile;
use crate::tar::TarFile;
use std::path::Path;
use tempfile::NamedTempFile;
use tgzkit_core::error::Result;
use tgzkit_core::{GzipLevel, NoProgress, Progress, TarOptions};
use tracing::debug;

/// Settings shared by the façade operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    /// Options for the tar stage.
    pub tar: TarOptions,
    /// Compression level for the gzip stage.
    pub level: GzipLevel,
}

impl Settings {
    /// Set the tar options.
    pub fn with_tar_options(mut self, tar: TarOptions) -> Self {
        self.tar = tar;
        self
    }

    /// Set the gzip compression level.
    pub fn with_level(mut self, level: GzipLevel) -> Self {
        self.level = level;
        self
    }
}

/// Pack `source` into the tar archive `destination`.
pub fn tar_file(source: &Path, destination: &Path) -> Result<()> {
    tar_file_with(source, destination, &Settings::default(), &mut NoProgress)
}

/// Pack `source` into the tar archive `destination`, reporting progress.
pub fn tar_file_with(
    source: &Path,
    destination: &Path,
    settings: &Settings,
    progress: &mut dyn Progress,
) -> Result<()> {
    TarFile::new(destination)
        .with_options(settings.tar)
        .pack_from(source, progress)?;
    Ok(())
}

/// Extract the tar archive `source` under `destination`.
pub fn untar_file(source: &Path, destination: &Path) -> Result<()> {
    untar_file_with(source, destination, &Settings::default(), &mut NoProgress)
}

/// Extract the tar archive `source` under `destination`, reporting progress.
pub fn untar_file_with(
    source: &Path,
    destination: &Path,
    settings: &Settings,
    progress: &mut dyn Progress,
) -> Result<()> {
    TarFile::new(source)
        .with_options(settings.tar)
        .extract_to(destination, progress)?;
    Ok(())
}

/// Compress the file `source` into `destination`.
pub fn gzip_file(source: &Path, destination: &Path) -> Result<()> {
    gzip_file_with(source, destination, &Settings::default(), &mut NoProgress)
}

/// Compress the file `source` into `destination`, reporting progress.
pub fn gzip_file_with(
    source: &Path,
    destination: &Path,
    settings: &Settings,
    progress: &mut dyn Progress,
) -> Result<()> {
    GzipFile::new(destination)
        .with_level(settings.level)
        .deflate_from(source, progress)?;
    Ok(())
}

/// Decompress the gzip file `source` into `destination`.
pub fn ungzip_file(source: &Path, destination: &Path) -> Result<()> {
    ungzip_file_with(source, destination, &Settings::default(), &mut NoProgress)
}

/// Decompress the gzip file `source` into `destination`, reporting progress.
pub fn ungzip_file_with(
    source: &Path,
    destination: &Path,
    _settings: &Settings,
    progress: &mut dyn Progress,
) -> Result<()> {
    GzipFile::new(source).inflate_to(destination, progress)?;
    Ok(())
}

/// Pack `source` into a tar archive and compress it into `destination`.
pub fn tar_gzip_file(source: &Path, destination: &Path) -> Result<()> {
    tar_gzip_file_with(source, destination, &Settings::default(), &mut NoProgress)
}

/// Pack and compress, reporting progress for each stage in turn.
pub fn tar_gzip_file_with(
    source: &Path,
    destination: &Path,
    settings: &Settings,
    progress: &mut dyn Progress,
) -> Result<()> {
    let staged = staging_file(source)?;
    debug!(staged = %staged.path().display(), "staging tar for compression");

    tar_file_with(source, staged.path(), settings, progress)?;
    gzip_file_with(staged.path(), destination, settings, progress)?;
    staged.close()?;
    Ok(())
}

/// Decompress the gzip file `source` and extract the tar inside it under
/// `destination`.
pub fn untar_gzip_file(source: &Path, destination: &Path) -> Result<()> {
    untar_gzip_file_with(source, destination, &Settings::default(), &mut NoProgress)
}

/// Decompress and extract, reporting progress for each stage in turn.
pub fn untar_gzip_file_with(
    source: &Path,
    destination: &Path,
    settings: &Settings,
    progress: &mut dyn Progress,
) -> Result<()> {
    let staged = staging_file(source)?;
    debug!(staged = %staged.path().display(), "staging tar for extraction");

    ungzip_file_with(source, staged.path(), settings, progress)?;
    untar_file_with(staged.path(), destination, settings, progress)?;
    staged.close()?;
    Ok(())
}

/// Create a uniquely named `.tar` in the system temp directory, named
/// after `path` without its extension. Dropping the handle deletes it.
fn staging_file(path: &Path) -> Result<NamedTempFile> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let file = tempfile::Builder::new()
        .prefix(&format!("{}-", stem))
        .suffix(".tar")
        .tempfile()?;
    Ok(file)
}
