//! Archive writing and directory-tree packing.

use super::header::{TarHeader, MAX_ENTRY_SIZE};
use super::ArchiveSummary;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tgzkit_core::blockio::{copy_chunked, padding_for, write_padding, BLOCK_SIZE, ZERO_BLOCK};
use tgzkit_core::error::{Result, TgzError};
use tgzkit_core::{Progress, TarOptions};
use tracing::{debug, trace, warn};

/// TAR archive writer.
pub struct TarWriter<W: Write> {
    writer: W,
    options: TarOptions,
    written: u64,
    finished: bool,
}

impl<W: Write> TarWriter<W> {
    /// Create a new TAR writer.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, TarOptions::default())
    }

    /// Create a new TAR writer with explicit options.
    pub fn with_options(writer: W, options: TarOptions) -> Self {
        Self {
            writer,
            options,
            written: 0,
            finished: false,
        }
    }

    /// Number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Add a directory entry.
    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        let dir_name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{}/", name)
        };
        self.write_header(&TarHeader::directory(dir_name))
    }

    /// Add a file entry from an in-memory buffer.
    pub fn add_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.add_file_from_reader(name, data.len() as u64, &mut &data[..], |_| {})
    }

    /// Add a file entry of `size` bytes read from `reader`.
    ///
    /// `on_chunk` receives the cumulative number of data bytes written for
    /// this entry. Fails if the reader yields fewer than `size` bytes.
    pub fn add_file_from_reader<R, F>(
        &mut self,
        name: &str,
        size: u64,
        reader: &mut R,
        on_chunk: F,
    ) -> Result<()>
    where
        R: Read + ?Sized,
        F: FnMut(u64),
    {
        if size > MAX_ENTRY_SIZE {
            return Err(TgzError::bad_block(
                self.written,
                format!("'{}' is {} bytes, too large for a ustar size field", name, size),
            ));
        }

        let offset = self.written;
        self.write_header(&TarHeader::file(name, size))?;

        let chunk_size = self.options.chunk_size();
        let copied = copy_chunked(reader, &mut self.writer, Some(size), chunk_size, on_chunk)?;
        self.written += copied;
        if copied < size {
            return Err(TgzError::bad_block(
                offset,
                format!("'{}' shrank while packing: expected {} bytes, read {}", name, size, copied),
            ));
        }

        write_padding(&mut self.writer, size)?;
        self.written += padding_for(size) as u64;
        Ok(())
    }

    fn write_header(&mut self, header: &TarHeader) -> Result<()> {
        if header.name_is_truncated() {
            warn!(name = %header.name, "name exceeds 100 bytes and will be truncated");
        }
        self.writer.write_all(&header.to_block())?;
        self.written += BLOCK_SIZE as u64;
        Ok(())
    }

    /// Finish the archive by writing two zero blocks.
    pub fn finish(&mut self) -> Result<()> {
        if !self.finished {
            self.writer.write_all(&ZERO_BLOCK)?;
            self.writer.write_all(&ZERO_BLOCK)?;
            self.writer.flush()?;
            self.written += 2 * BLOCK_SIZE as u64;
            self.finished = true;
        }
        Ok(())
    }

    /// Finish the archive and return the inner writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.finish()?;
        Ok(self.writer)
    }
}

/// Sum of the sizes of all regular files under `path`.
///
/// Used only to size progress reports; unreadable entries count as zero.
/// Symbolic links below the root are not followed.
pub fn tree_size(path: &Path) -> u64 {
    let Ok(metadata) = fs::metadata(path) else {
        return 0;
    };
    if metadata.is_file() {
        metadata.len()
    } else if metadata.is_dir() {
        dir_size(path)
    } else {
        0
    }
}

fn dir_size(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| match entry.file_type() {
            Ok(kind) if kind.is_dir() => dir_size(&entry.path()),
            Ok(kind) if kind.is_file() => entry.metadata().map(|m| m.len()).unwrap_or(0),
            _ => 0,
        })
        .sum()
}

/// Pack the tree rooted at `source` into `tar`.
///
/// A directory root contributes its children (in lexicographic order of
/// their names, recursively) but no header of its own; a file root is
/// stored under its own file name. The archive is finished with the
/// two-block terminator.
pub fn pack_tree<W: Write>(
    source: &Path,
    tar: &mut TarWriter<W>,
    progress: &mut dyn Progress,
) -> Result<ArchiveSummary> {
    let metadata = fs::metadata(source).map_err(|_| TgzError::source_not_found(source))?;

    let total = tree_size(source);
    progress.set_total(total);
    debug!(source = %source.display(), total, "packing tree");

    let mut packer = Packer {
        tar: &mut *tar,
        progress: &mut *progress,
        completed: 0,
        summary: ArchiveSummary::default(),
    };

    if metadata.is_dir() {
        packer.pack_children(source, "")?;
    } else {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| TgzError::source_not_found(source))?;
        packer.pack_node(source, &name)?;
    }

    let summary = packer.summary;
    tar.finish()?;
    progress.set_completed_to_total();
    debug!(
        files = summary.files,
        directories = summary.directories,
        bytes = tar.bytes_written(),
        "packing finished"
    );
    Ok(summary)
}

struct Packer<'a, W: Write> {
    tar: &'a mut TarWriter<W>,
    progress: &'a mut dyn Progress,
    completed: u64,
    summary: ArchiveSummary,
}

impl<W: Write> Packer<'_, W> {
    fn pack_children(&mut self, dir: &Path, relative: &str) -> Result<()> {
        let mut names = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();

        for name in names {
            let name_str = name.to_string_lossy();
            let child_relative = if relative.is_empty() {
                name_str.into_owned()
            } else {
                format!("{}/{}", relative, name_str)
            };
            self.pack_node(&dir.join(&name), &child_relative)?;
        }
        Ok(())
    }

    fn pack_node(&mut self, path: &Path, relative: &str) -> Result<()> {
        // Links are never followed; they fall through to the skip branch.
        let metadata = fs::symlink_metadata(path)?;

        if metadata.is_dir() {
            trace!(name = relative, "adding directory");
            self.tar.add_directory(relative)?;
            self.summary.directories += 1;
            self.pack_children(path, relative)
        } else if metadata.is_file() {
            let size = metadata.len();
            trace!(name = relative, size, "adding file");

            let mut reader = BufReader::new(File::open(path)?);
            let base = self.completed;
            let progress = &mut *self.progress;
            self.tar
                .add_file_from_reader(relative, size, &mut reader, |n| {
                    progress.set_completed(base + n)
                })?;

            self.completed += size;
            self.summary.files += 1;
            self.summary.data_bytes += size;
            Ok(())
        } else {
            warn!(name = relative, "skipping entry that is neither a file nor a directory");
            self.summary.skipped += 1;
            Ok(())
        }
    }
}
