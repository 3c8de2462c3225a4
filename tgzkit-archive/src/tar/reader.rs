//! Sequential archive walking and extraction.

use super::header::{self, EntryKind, TarHeader};
use super::ArchiveSummary;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use tgzkit_core::blockio::{copy_chunked, entry_span, BLOCK_SIZE};
use tgzkit_core::error::{Result, TgzError};
use tgzkit_core::{Progress, TarOptions};
use tracing::{debug, trace, warn};

/// A header together with its position in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarEntry {
    /// Decoded header.
    pub header: TarHeader,
    /// Byte offset of the header block.
    pub offset: u64,
}

impl TarEntry {
    /// Byte offset of the entry's data region.
    pub fn data_offset(&self) -> u64 {
        self.offset + BLOCK_SIZE as u64
    }

    /// Number of bytes this entry occupies, header included.
    ///
    /// Directories always occupy a single block, whatever size they
    /// declare.
    pub fn span(&self) -> u64 {
        match self.header.kind {
            EntryKind::Directory => BLOCK_SIZE as u64,
            EntryKind::File | EntryKind::Other(_) => entry_span(self.header.size),
        }
    }
}

/// Walks an archive header by header.
///
/// The cursor starts at zero and moves by each entry's block-padded span;
/// the walk ends when the cursor reaches the archive length or a header
/// with an empty name is found.
pub struct TarReader<R: Read + Seek> {
    reader: R,
    len: u64,
    cursor: u64,
    position: u64,
    options: TarOptions,
    finished: bool,
}

impl<R: Read + Seek> TarReader<R> {
    /// Create a reader over an archive of `len` bytes.
    pub fn new(mut reader: R, len: u64, options: TarOptions) -> Result<Self> {
        let position = reader.stream_position()?;
        Ok(Self {
            reader,
            len,
            cursor: 0,
            position,
            options,
            finished: false,
        })
    }

    /// Create a reader, taking the length from the stream itself.
    pub fn from_stream(mut reader: R, options: TarOptions) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Self::new(reader, len, options)
    }

    /// Total archive length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Check if the archive holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current cursor position (always block-aligned).
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Decode the next header and advance the cursor past its entry.
    pub fn next_entry(&mut self) -> Result<Option<TarEntry>> {
        if self.finished || self.cursor >= self.len {
            return Ok(None);
        }

        let offset = self.cursor;
        let mut block = [0u8; BLOCK_SIZE];
        self.seek_to(offset)?;
        self.read_block(offset, &mut block)?;

        let header = header::decode(&block);
        if header.is_end_marker() {
            trace!(offset, "end-of-archive marker");
            self.finished = true;
            return Ok(None);
        }

        if self.options.strict_checksum {
            let computed = header::compute_checksum(&block);
            let stored = header::stored_checksum(&block).unwrap_or(0);
            if stored != computed {
                return Err(TgzError::checksum_mismatch(offset, stored, computed));
            }
        }

        let entry = TarEntry { header, offset };
        self.cursor = offset + entry.span();
        Ok(Some(entry))
    }

    /// Read all remaining entries.
    pub fn entries(&mut self) -> Result<Vec<TarEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Copy exactly `entry.header.size` bytes of an entry's data to
    /// `writer`, ignoring the padding that follows.
    ///
    /// `on_chunk` receives the cumulative number of bytes copied.
    pub fn copy_data<W, F>(&mut self, entry: &TarEntry, writer: &mut W, on_chunk: F) -> Result<u64>
    where
        W: Write + ?Sized,
        F: FnMut(u64),
    {
        let size = entry.header.size;
        if size == 0 {
            return Ok(0);
        }

        self.seek_to(entry.data_offset())?;
        let chunk_size = self.options.chunk_size();
        let copied = copy_chunked(&mut self.reader, writer, Some(size), chunk_size, on_chunk)?;
        self.position += copied;

        if copied < size {
            return Err(TgzError::bad_block(
                entry.offset,
                format!(
                    "data region of '{}' truncated: expected {} bytes, found {}",
                    entry.header.name, size, copied
                ),
            ));
        }
        Ok(copied)
    }

    /// Read an entry's data into memory.
    pub fn read_data(&mut self, entry: &TarEntry) -> Result<Vec<u8>> {
        // Never reserve past the end of the stream, whatever the header claims.
        let available = self.len.saturating_sub(entry.data_offset());
        let reserve = entry.header.size.min(available).min(usize::MAX as u64) as usize;
        let mut data = Vec::with_capacity(reserve);
        self.copy_data(entry, &mut data, |_| {})?;
        Ok(data)
    }

    fn seek_to(&mut self, offset: u64) -> Result<()> {
        if self.position != offset {
            self.reader.seek(SeekFrom::Start(offset))?;
            self.position = offset;
        }
        Ok(())
    }

    fn read_block(&mut self, offset: u64, block: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        match self.reader.read_exact(block) {
            Ok(()) => {
                self.position += BLOCK_SIZE as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                // Position is unknown after a short read.
                self.position = u64::MAX;
                Err(TgzError::bad_block(offset, "archive ends inside a header block"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Make an entry name safe to join onto the destination root.
///
/// Drops `.`, `..`, and root/prefix components so every resulting path
/// stays under the root.
pub fn sanitize_entry_path(name: &str) -> PathBuf {
    Path::new(name)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            Component::CurDir
            | Component::ParentDir
            | Component::RootDir
            | Component::Prefix(_) => None,
        })
        .collect()
}

/// Recreate the files and directories of an archive under `destination`.
pub fn extract_archive<R: Read + Seek>(
    reader: &mut TarReader<R>,
    destination: &Path,
    progress: &mut dyn Progress,
) -> Result<ArchiveSummary> {
    fs::create_dir_all(destination)?;
    progress.set_total(reader.len());

    let mut summary = ArchiveSummary::default();

    loop {
        progress.set_completed(reader.cursor());
        let Some(entry) = reader.next_entry()? else {
            break;
        };

        let relative = sanitize_entry_path(&entry.header.name);
        if relative.as_os_str().is_empty() && !matches!(entry.header.kind, EntryKind::Other(_)) {
            warn!(name = %entry.header.name, offset = entry.offset, "skipping entry with no usable path");
            summary.skipped += 1;
            continue;
        }
        let target = destination.join(&relative);

        match entry.header.kind {
            EntryKind::File => {
                trace!(name = %entry.header.name, size = entry.header.size, "extracting file");
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }

                let file = File::create(&target)?;
                let mut writer = BufWriter::new(file);
                let base = entry.data_offset();
                reader.copy_data(&entry, &mut writer, |n| progress.set_completed(base + n))?;
                writer.flush()?;

                summary.files += 1;
                summary.data_bytes += entry.header.size;
            }
            EntryKind::Directory => {
                trace!(name = %entry.header.name, "creating directory");
                fs::create_dir_all(&target)?;
                summary.directories += 1;
            }
            EntryKind::Other(flag) => {
                warn!(
                    name = %entry.header.name,
                    typeflag = %char::from(flag),
                    size = entry.header.size,
                    "skipping unsupported entry type"
                );
                summary.skipped += 1;
            }
        }
    }

    progress.set_completed_to_total();
    debug!(
        files = summary.files,
        directories = summary.directories,
        skipped = summary.skipped,
        "extraction finished"
    );
    Ok(summary)
}
