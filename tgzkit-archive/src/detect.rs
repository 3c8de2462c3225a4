//! Archive format auto-detection.
//!
//! This module distinguishes gzip streams from ustar archives based on
//! their magic numbers.

use crate::gzip::GZIP_MAGIC;
use crate::tar::header::{field, USTAR_MAGIC};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tgzkit_core::error::{Result, TgzError};

/// Number of leading bytes needed to recognise every supported format.
pub const DETECT_LEN: usize = 262;

/// Known archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// GZIP compressed file (.gz, .tgz).
    Gzip,
    /// TAR archive (.tar).
    Tar,
    /// Unknown format.
    Unknown,
}

impl ArchiveFormat {
    /// Detect format from magic bytes.
    pub fn from_magic(magic: &[u8]) -> Self {
        if magic.starts_with(&GZIP_MAGIC) {
            return Self::Gzip;
        }

        // "ustar" at offset 257; the trailing NUL or space varies between
        // POSIX and GNU writers.
        let ustar = &USTAR_MAGIC[..5];
        let start = field::MAGIC.offset;
        if magic.len() >= start + ustar.len() && &magic[start..start + ustar.len()] == ustar {
            return Self::Tar;
        }

        Self::Unknown
    }

    /// Detect format from a reader.
    pub fn detect<R: Read>(reader: &mut R) -> Result<(Self, Vec<u8>)> {
        let mut magic = Vec::with_capacity(DETECT_LEN);
        reader.take(DETECT_LEN as u64).read_to_end(&mut magic)?;

        let format = Self::from_magic(&magic);
        Ok((format, magic))
    }

    /// Detect the format of the file at `path`.
    pub fn detect_path(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TgzError::source_not_found(path),
            _ => TgzError::Io(e),
        })?;
        Ok(Self::detect(&mut file)?.0)
    }

    /// Guess the format from a file name.
    ///
    /// `.tar.gz`, `.tgz` and `.gz` map to gzip, `.tar` to tar.
    pub fn from_extension(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".gz") || name.ends_with(".tgz") {
            Self::Gzip
        } else if name.ends_with(".tar") {
            Self::Tar
        } else {
            Self::Unknown
        }
    }

    /// Get the typical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Tar => "tar",
            Self::Unknown => "",
        }
    }

    /// Get the MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Gzip => "application/gzip",
            Self::Tar => "application/x-tar",
            Self::Unknown => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gzip => write!(f, "GZIP"),
            Self::Tar => write!(f, "TAR"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
