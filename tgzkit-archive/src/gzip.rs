//! GZIP compression and decompression of whole files.
//!
//! A thin streaming layer over `flate2`: data moves through a fixed
//! 256 KiB buffer, so memory use does not depend on file size. The tar
//! codec never sees compressed bytes; `.tar.gz` workflows go through an
//! intermediate `.tar` file (see [`crate::facade`]).

use flate2::read::MultiGzDecoder;
use flate2::{Compression, GzBuilder};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tgzkit_core::error::{Result, TgzError};
use tgzkit_core::{GzipLevel, Progress};
use tracing::debug;

/// Size of the transfer buffer.
pub const BUFFER_SIZE: usize = 256 * 1024;

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// A gzip file on disk.
#[derive(Debug, Clone)]
pub struct GzipFile {
    path: PathBuf,
    level: GzipLevel,
}

impl GzipFile {
    /// Refer to the gzip file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            level: GzipLevel::default(),
        }
    }

    /// Set the compression level used by [`GzipFile::deflate_from`].
    pub fn with_level(mut self, level: GzipLevel) -> Self {
        self.level = level;
        self
    }

    /// Path of the gzip file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decompress this file into `destination`.
    ///
    /// Concatenated gzip members are decoded one after another into the
    /// same output. Progress is measured in compressed bytes consumed.
    pub fn inflate_to(&self, destination: &Path, progress: &mut dyn Progress) -> Result<u64> {
        if self.path.as_os_str().is_empty() || destination.as_os_str().is_empty() {
            return Err(TgzError::source_not_found(&self.path));
        }

        let source = open_source(&self.path)?;
        let total = source.metadata()?.len();
        progress.set_total(total);
        debug!(
            source = %self.path.display(),
            destination = %destination.display(),
            total,
            "inflating"
        );

        let mut output = BufWriter::new(File::create(destination)?);
        let mut decoder = MultiGzDecoder::new(CountingReader::new(BufReader::new(source)));
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut produced = 0u64;

        loop {
            let n = match decoder.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(TgzError::decompression_failed(format!("read failed: {}", e)));
                }
            };
            progress.set_completed(decoder.get_ref().count());
            output
                .write_all(&buffer[..n])
                .map_err(|e| TgzError::decompression_failed(format!("write failed: {}", e)))?;
            produced += n as u64;
        }

        output
            .flush()
            .map_err(|e| TgzError::decompression_failed(format!("write failed: {}", e)))?;
        progress.set_completed_to_total();
        debug!(produced, "inflate finished");
        Ok(produced)
    }

    /// Compress `source` into this file.
    ///
    /// Progress is measured in uncompressed bytes read. The source file
    /// name is recorded in the gzip header.
    pub fn deflate_from(&self, source: &Path, progress: &mut dyn Progress) -> Result<u64> {
        if self.path.as_os_str().is_empty() || source.as_os_str().is_empty() {
            return Err(TgzError::source_not_found(source));
        }

        let input = open_source(source)?;
        let total = input.metadata()?.len();
        progress.set_total(total);
        debug!(
            source = %source.display(),
            destination = %self.path.display(),
            total,
            level = self.level.level(),
            "deflating"
        );

        let mut builder = GzBuilder::new();
        if let Some(name) = source.file_name() {
            builder = builder.filename(name.to_string_lossy().as_bytes());
        }
        let output = BufWriter::new(File::create(&self.path)?);
        let mut encoder = builder.write(output, Compression::new(self.level.level() as u32));

        let mut input = BufReader::new(input);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut consumed = 0u64;

        loop {
            let n = match input.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(TgzError::compression_failed(format!("read failed: {}", e)));
                }
            };
            encoder
                .write_all(&buffer[..n])
                .map_err(|e| TgzError::compression_failed(format!("write failed: {}", e)))?;
            consumed += n as u64;
            progress.set_completed(consumed);
        }

        let mut output = encoder
            .finish()
            .map_err(|e| TgzError::unexpected_state(format!("closing gzip stream: {}", e)))?;
        output
            .flush()
            .map_err(|e| TgzError::unexpected_state(format!("closing gzip stream: {}", e)))?;

        progress.set_completed_to_total();
        debug!(consumed, "deflate finished");
        Ok(consumed)
    }
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TgzError::source_not_found(path),
        _ => TgzError::Io(e),
    })
}

/// Counts bytes pulled through a reader.
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use flate2::write::GzEncoder;
    use std::fs;
    use tgzkit_core::{NoProgress, VirtualProgress};

    #[test]
    fn test_gzip_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("original.txt");
        let compressed = dir.path().join("compressed.gz");
        let restored = dir.path().join("restored.txt");
        let text = "This is a test file for gzip compression. ".repeat(200);
        fs::write(&original, &text).unwrap();

        let gz = GzipFile::new(&compressed);
        let consumed = gz.deflate_from(&original, &mut NoProgress).unwrap();
        assert_eq!(consumed, text.len() as u64);

        let bytes = fs::read(&compressed).unwrap();
        assert_eq!(&bytes[..2], &GZIP_MAGIC);
        assert!(bytes.len() < text.len());

        let mut progress = VirtualProgress::new();
        let produced = gz.inflate_to(&restored, &mut progress).unwrap();
        assert_eq!(produced, text.len() as u64);
        assert_eq!(progress.completed_units(), 100);
        assert_eq!(fs::read_to_string(&restored).unwrap(), text);
    }

    #[test]
    fn test_gzip_records_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("named.txt");
        let compressed = dir.path().join("named.txt.gz");
        fs::write(&original, "x").unwrap();

        GzipFile::new(&compressed)
            .with_level(GzipLevel::BEST)
            .deflate_from(&original, &mut NoProgress)
            .unwrap();

        let decoder = GzDecoder::new(File::open(&compressed).unwrap());
        let header = decoder.header().unwrap();
        assert_eq!(header.filename(), Some(&b"named.txt"[..]));
    }

    #[test]
    fn test_inflate_concatenated_members() {
        let dir = tempfile::tempdir().unwrap();
        let joined = dir.path().join("joined.gz");
        let restored = dir.path().join("joined.txt");

        let mut bytes = Vec::new();
        for payload in [&b"first-member\n"[..], &b"second-member\n"[..]] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(payload).unwrap();
            bytes.extend_from_slice(&encoder.finish().unwrap());
        }
        fs::write(&joined, &bytes).unwrap();

        let mut progress = VirtualProgress::new();
        let produced = GzipFile::new(&joined)
            .inflate_to(&restored, &mut progress)
            .unwrap();

        assert_eq!(produced, 27);
        assert_eq!(
            fs::read_to_string(&restored).unwrap(),
            "first-member\nsecond-member\n"
        );
        assert_eq!(progress.completed_units(), 100);
    }

    #[test]
    fn test_inflate_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = GzipFile::new(dir.path().join("absent.gz"))
            .inflate_to(&dir.path().join("out"), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, TgzError::SourceNotFound { .. }));
    }

    #[test]
    fn test_inflate_corrupt_stream() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.gz");
        fs::write(&bogus, b"definitely not gzip data at all").unwrap();

        let err = GzipFile::new(&bogus)
            .inflate_to(&dir.path().join("out"), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, TgzError::DecompressionFailed { .. }));
    }

    #[test]
    fn test_deflate_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = GzipFile::new(dir.path().join("out.gz"))
            .deflate_from(&dir.path().join("absent"), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, TgzError::SourceNotFound { .. }));
        assert!(!dir.path().join("out.gz").exists());
    }

    #[test]
    fn test_empty_paths_rejected() {
        let err = GzipFile::new("")
            .inflate_to(Path::new("out"), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, TgzError::SourceNotFound { .. }));
    }
}
