//! Block-aligned I/O helpers.
//!
//! Archive data is measured in 512-byte blocks. File contents move between
//! streams in bounded chunks of at most [`MAX_BLOCKS_IN_MEMORY`] blocks so
//! peak memory stays flat no matter how large an entry is.

use crate::error::Result;
use std::io::{ErrorKind, Read, Write};

/// TAR block size.
pub const BLOCK_SIZE: usize = 512;

/// Maximum number of blocks held in memory by a single copy step.
pub const MAX_BLOCKS_IN_MEMORY: usize = 100;

/// Default chunk size for [`copy_chunked`].
pub const CHUNK_SIZE: usize = BLOCK_SIZE * MAX_BLOCKS_IN_MEMORY;

/// An all-zero block, used for padding and the end-of-archive marker.
pub const ZERO_BLOCK: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// Number of data blocks needed to hold `size` bytes.
pub fn blocks_for(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE as u64)
}

/// Number of zero bytes that pad `size` bytes up to a block boundary.
pub fn padding_for(size: u64) -> usize {
    let remainder = (size % BLOCK_SIZE as u64) as usize;
    (BLOCK_SIZE - remainder) % BLOCK_SIZE
}

/// Length in bytes of an entry whose data region holds `size` bytes,
/// header block included.
pub fn entry_span(size: u64) -> u64 {
    (1 + blocks_for(size)) * BLOCK_SIZE as u64
}

/// Write the zero padding that follows `size` bytes of data.
pub fn write_padding<W: Write + ?Sized>(writer: &mut W, size: u64) -> Result<()> {
    let padding = padding_for(size);
    if padding > 0 {
        writer.write_all(&ZERO_BLOCK[..padding])?;
    }
    Ok(())
}

/// Copy from `reader` to `writer` in chunks of at most `chunk_size` bytes.
///
/// With `limit` set, stops after that many bytes even if the reader has
/// more. A zero-length read ends the copy; a read error is returned as is.
/// `on_chunk` receives the cumulative byte count after every chunk.
///
/// Returns the total number of bytes copied, which may be less than
/// `limit` if the reader ended early.
pub fn copy_chunked<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    limit: Option<u64>,
    chunk_size: usize,
    mut on_chunk: F,
) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    F: FnMut(u64),
{
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut copied = 0u64;

    loop {
        let want = match limit {
            Some(limit) => (limit - copied).min(buffer.len() as u64) as usize,
            None => buffer.len(),
        };
        if want == 0 {
            break;
        }

        let n = match reader.read(&mut buffer[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        writer.write_all(&buffer[..n])?;
        copied += n as u64;
        on_chunk(copied);
    }

    Ok(copied)
}
