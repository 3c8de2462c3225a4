//! UStar header encoding and decoding.
//!
//! A header is a single 512-byte block. Every field lives at a fixed
//! offset described by a [`Field`]; numbers are zero-padded octal ASCII
//! terminated by NUL, strings are NUL-padded.

use std::ops::Range;
use std::time::{SystemTime, UNIX_EPOCH};
use tgzkit_core::blockio::BLOCK_SIZE;

/// Location of a header field within the 512-byte block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Byte offset of the field.
    pub offset: usize,
    /// Width of the field in bytes.
    pub len: usize,
}

impl Field {
    const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Byte range covered by the field.
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// UStar header layout (POSIX.1-1988).
pub mod field {
    use super::Field;

    /// Entry name.
    pub const NAME: Field = Field::new(0, 100);
    /// Permission bits.
    pub const MODE: Field = Field::new(100, 8);
    /// Owner user ID.
    pub const UID: Field = Field::new(108, 8);
    /// Owner group ID.
    pub const GID: Field = Field::new(116, 8);
    /// Data length in bytes.
    pub const SIZE: Field = Field::new(124, 12);
    /// Modification time, seconds since the epoch.
    pub const MTIME: Field = Field::new(136, 12);
    /// Header checksum.
    pub const CHECKSUM: Field = Field::new(148, 8);
    /// Entry type.
    pub const TYPEFLAG: Field = Field::new(156, 1);
    /// Link target (unused here).
    pub const LINKNAME: Field = Field::new(157, 100);
    /// `"ustar\0"`.
    pub const MAGIC: Field = Field::new(257, 6);
    /// `"00"`.
    pub const VERSION: Field = Field::new(263, 2);
    /// Owner user name.
    pub const UNAME: Field = Field::new(265, 32);
    /// Owner group name.
    pub const GNAME: Field = Field::new(297, 32);
    /// Device major number (unused here).
    pub const DEVMAJOR: Field = Field::new(329, 8);
    /// Device minor number (unused here).
    pub const DEVMINOR: Field = Field::new(337, 8);
    /// Name prefix (never written; long names are truncated instead).
    pub const PREFIX: Field = Field::new(345, 155);
}

/// UStar magic, NUL included.
pub const USTAR_MAGIC: &[u8; 6] = b"ustar\0";

/// UStar version.
pub const USTAR_VERSION: &[u8; 2] = b"00";

/// Owner and group name written into every header.
pub const OWNER_NAME: &str = "root";

/// Mode written for directories.
pub const DIRECTORY_MODE: u32 = 0o755;

/// Mode written for regular files.
pub const FILE_MODE: u32 = 0o644;

/// Largest size the 11-digit octal size field can hold.
pub const MAX_ENTRY_SIZE: u64 = 0o77777777777;

/// Typeflag for a regular file.
pub const TYPE_FILE: u8 = b'0';

/// Typeflag for a directory.
pub const TYPE_DIRECTORY: u8 = b'5';

/// Kind of entry a header describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file (`'0'` or NUL).
    File,
    /// Directory (`'5'`).
    Directory,
    /// Any other typeflag; its data region is skipped.
    Other(u8),
}

impl EntryKind {
    /// Classify a typeflag byte.
    pub fn from_typeflag(flag: u8) -> Self {
        match flag {
            TYPE_FILE | 0 => Self::File,
            TYPE_DIRECTORY => Self::Directory,
            other => Self::Other(other),
        }
    }

    /// Typeflag byte written for this kind.
    pub fn typeflag(&self) -> u8 {
        match self {
            Self::File => TYPE_FILE,
            Self::Directory => TYPE_DIRECTORY,
            Self::Other(flag) => *flag,
        }
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// The logical content of a header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarHeader {
    /// Entry name, relative to the archive root.
    pub name: String,
    /// Data length in bytes.
    pub size: u64,
    /// Entry kind.
    pub kind: EntryKind,
    /// Modification time, seconds since the epoch.
    pub mtime: u64,
}

impl TarHeader {
    /// Create a header for a regular file stamped with the current time.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            kind: EntryKind::File,
            mtime: now(),
        }
    }

    /// Create a header for a directory stamped with the current time.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            kind: EntryKind::Directory,
            mtime: now(),
        }
    }

    /// Set the modification time.
    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = mtime;
        self
    }

    /// Check if the encoded name would be cut at the 100-byte name field.
    pub fn name_is_truncated(&self) -> bool {
        self.name.len() > field::NAME.len
    }

    /// Encode into a 512-byte block.
    ///
    /// Names longer than 100 bytes are truncated; the prefix field is left
    /// empty.
    pub fn to_block(&self) -> [u8; BLOCK_SIZE] {
        let mut block = [0u8; BLOCK_SIZE];

        write_bytes(&mut block, field::NAME, self.name.as_bytes());

        let mode = if self.kind.is_dir() {
            DIRECTORY_MODE
        } else {
            FILE_MODE
        };
        write_octal(&mut block, field::MODE, mode as u64);
        write_octal(&mut block, field::UID, 0);
        write_octal(&mut block, field::GID, 0);
        write_octal(&mut block, field::SIZE, self.size);
        write_octal(&mut block, field::MTIME, self.mtime);

        block[field::TYPEFLAG.offset] = self.kind.typeflag();

        write_bytes(&mut block, field::MAGIC, USTAR_MAGIC);
        write_bytes(&mut block, field::VERSION, USTAR_VERSION);
        write_string(&mut block, field::UNAME, OWNER_NAME);
        write_string(&mut block, field::GNAME, OWNER_NAME);

        let checksum = compute_checksum(&block);
        let checksum_str = format!("{:06o}\0 ", checksum);
        write_bytes(&mut block, field::CHECKSUM, checksum_str.as_bytes());

        block
    }

    /// Decode a 512-byte block.
    ///
    /// Never fails: unparsable numbers read as zero and an all-zero block
    /// yields an empty name, which marks the end of the archive.
    pub fn from_block(block: &[u8; BLOCK_SIZE]) -> Self {
        Self {
            name: parse_name(&block[field::NAME.range()]),
            size: parse_octal(&block[field::SIZE.range()]),
            kind: EntryKind::from_typeflag(block[field::TYPEFLAG.offset]),
            mtime: parse_octal(&block[field::MTIME.range()]),
        }
    }

    /// Check if this header marks the end of the archive.
    pub fn is_end_marker(&self) -> bool {
        self.name.is_empty()
    }
}

/// Encode a header for `path` in one call.
pub fn encode(path: &str, size: u64, is_directory: bool) -> [u8; BLOCK_SIZE] {
    let header = if is_directory {
        TarHeader::directory(path)
    } else {
        TarHeader::file(path, size)
    };
    header.to_block()
}

/// Decode a header block in one call.
pub fn decode(block: &[u8; BLOCK_SIZE]) -> TarHeader {
    TarHeader::from_block(block)
}

/// Sum of all header bytes, with the checksum field counted as spaces.
pub fn compute_checksum(block: &[u8; BLOCK_SIZE]) -> u32 {
    block
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            if field::CHECKSUM.range().contains(&i) {
                b' ' as u32
            } else {
                b as u32
            }
        })
        .sum()
}

/// Checksum recorded in the header, if the field parses.
pub fn stored_checksum(block: &[u8; BLOCK_SIZE]) -> Option<u32> {
    let cleaned = clean_numeric(&block[field::CHECKSUM.range()]);
    u32::from_str_radix(&cleaned, 8).ok()
}

/// Check the stored checksum against the header contents.
pub fn verify_checksum(block: &[u8; BLOCK_SIZE]) -> bool {
    stored_checksum(block) == Some(compute_checksum(block))
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Copy bytes into a field, truncating at its width.
fn write_bytes(block: &mut [u8; BLOCK_SIZE], field: Field, bytes: &[u8]) {
    let len = bytes.len().min(field.len);
    block[field.offset..field.offset + len].copy_from_slice(&bytes[..len]);
}

/// Write a NUL-terminated string, truncating so the NUL always fits.
fn write_string(block: &mut [u8; BLOCK_SIZE], field: Field, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(field.len - 1);
    block[field.offset..field.offset + len].copy_from_slice(&bytes[..len]);
}

/// Write a zero-padded octal number followed by NUL.
fn write_octal(block: &mut [u8; BLOCK_SIZE], field: Field, value: u64) {
    let s = format!("{:0width$o}", value, width = field.len - 1);
    write_string(block, field, &s);
}

fn parse_name(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end])
        .trim_matches(char::is_control)
        .to_string()
}

fn clean_numeric(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .replace('\0', "")
        .trim()
        .to_string()
}

fn parse_octal(data: &[u8]) -> u64 {
    u64::from_str_radix(&clean_numeric(data), 8).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field_bytes(block: &[u8; BLOCK_SIZE], field: Field) -> &[u8] {
        &block[field.range()]
    }

    #[test]
    fn test_layout_is_contiguous() {
        let fields = [
            field::NAME,
            field::MODE,
            field::UID,
            field::GID,
            field::SIZE,
            field::MTIME,
            field::CHECKSUM,
            field::TYPEFLAG,
            field::LINKNAME,
            field::MAGIC,
            field::VERSION,
            field::UNAME,
            field::GNAME,
            field::DEVMAJOR,
            field::DEVMINOR,
            field::PREFIX,
        ];
        for pair in fields.windows(2) {
            assert_eq!(pair[0].offset + pair[0].len, pair[1].offset);
        }
        assert_eq!(field::PREFIX.range().end, 500);
    }

    #[test]
    fn test_encode_file_fields() {
        let block = TarHeader::file("docs/readme.txt", 13).with_mtime(0o14723456700).to_block();

        assert_eq!(&block[..15], b"docs/readme.txt");
        assert!(block[15..100].iter().all(|&b| b == 0));
        assert_eq!(field_bytes(&block, field::MODE), b"0000644\0");
        assert_eq!(field_bytes(&block, field::UID), b"0000000\0");
        assert_eq!(field_bytes(&block, field::GID), b"0000000\0");
        assert_eq!(field_bytes(&block, field::SIZE), b"00000000015\0");
        assert_eq!(field_bytes(&block, field::MTIME), b"14723456700\0");
        assert_eq!(block[156], b'0');
        assert_eq!(field_bytes(&block, field::MAGIC), b"ustar\0");
        assert_eq!(field_bytes(&block, field::VERSION), b"00");
        assert_eq!(&field_bytes(&block, field::UNAME)[..5], b"root\0");
        assert_eq!(&field_bytes(&block, field::GNAME)[..5], b"root\0");
        assert!(field_bytes(&block, field::PREFIX).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encode_directory_fields() {
        let block = encode("sub/", 123, true);
        assert_eq!(field_bytes(&block, field::MODE), b"0000755\0");
        assert_eq!(field_bytes(&block, field::SIZE), b"00000000000\0");
        assert_eq!(block[156], b'5');
    }

    #[test]
    fn test_empty_file_size_field() {
        let block = encode("empty.txt", 0, false);
        assert_eq!(field_bytes(&block, field::SIZE), b"00000000000\0");
    }

    #[test]
    fn test_checksum_format_and_value() {
        let block = TarHeader::file("a.txt", 2).with_mtime(0).to_block();
        let chk = field_bytes(&block, field::CHECKSUM);
        assert_eq!(chk[6], 0);
        assert_eq!(chk[7], b' ');

        let mut spaced = block;
        spaced[field::CHECKSUM.range()].copy_from_slice(b"        ");
        let expected: u32 = spaced.iter().map(|&b| b as u32).sum();
        assert_eq!(stored_checksum(&block), Some(expected));
        assert!(verify_checksum(&block));
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut block = encode("a.txt", 2, false);
        block[0] = b'b';
        assert!(!verify_checksum(&block));
    }

    #[test]
    fn test_encoding_is_deterministic_apart_from_mtime() {
        let a = TarHeader::file("same.txt", 42).with_mtime(1_000).to_block();
        let b = TarHeader::file("same.txt", 42).with_mtime(1_000).to_block();
        assert_eq!(a, b);

        let c = TarHeader::file("same.txt", 42).with_mtime(2_000).to_block();
        for i in 0..BLOCK_SIZE {
            if !field::MTIME.range().contains(&i) && !field::CHECKSUM.range().contains(&i) {
                assert_eq!(a[i], c[i], "byte {} differs", i);
            }
        }
    }

    #[test]
    fn test_long_name_is_truncated() {
        let long_name = "n".repeat(150);
        let header = TarHeader::file(long_name.as_str(), 1);
        assert!(header.name_is_truncated());

        let block = header.to_block();
        assert!(block[..100].iter().all(|&b| b == b'n'));
        assert_eq!(block[100], b'0');

        let decoded = decode(&block);
        assert_eq!(decoded.name, "n".repeat(100));
    }

    #[test]
    fn test_decode_roundtrip() {
        let header = TarHeader::file("sub/b.txt", 3).with_mtime(77);
        let decoded = TarHeader::from_block(&header.to_block());
        assert_eq!(decoded, header);

        let dir = TarHeader::directory("sub/").with_mtime(77);
        let decoded = TarHeader::from_block(&dir.to_block());
        assert_eq!(decoded.kind, EntryKind::Directory);
        assert_eq!(decoded.size, 0);
    }

    #[test]
    fn test_decode_typeflags() {
        let mut block = encode("x", 0, false);
        block[156] = 0;
        assert_eq!(decode(&block).kind, EntryKind::File);
        block[156] = b'1';
        assert_eq!(decode(&block).kind, EntryKind::Other(b'1'));
        block[156] = b'x';
        assert_eq!(decode(&block).kind, EntryKind::Other(b'x'));
    }

    #[test]
    fn test_decode_lenient_size() {
        let mut block = [0u8; BLOCK_SIZE];
        block[..4].copy_from_slice(b"file");
        block[124..136].copy_from_slice(b" 17\0\0 \0\0\0\0\0\0");
        assert_eq!(decode(&block).size, 0o17);

        block[124..136].copy_from_slice(b"garbage\0\0\0\0\0");
        assert_eq!(decode(&block).size, 0);

        block[124..136].copy_from_slice(&[0u8; 12]);
        assert_eq!(decode(&block).size, 0);
    }

    #[test]
    fn test_decode_trims_control_characters() {
        let mut block = [0u8; BLOCK_SIZE];
        block[..7].copy_from_slice(b"\na.txt\r");
        assert_eq!(decode(&block).name, "a.txt");
    }

    #[test]
    fn test_zero_block_is_end_marker() {
        let header = decode(&[0u8; BLOCK_SIZE]);
        assert!(header.is_end_marker());
        assert_eq!(header.size, 0);
    }

    proptest! {
        #[test]
        fn decode_accepts_any_block(bytes in prop::collection::vec(any::<u8>(), BLOCK_SIZE)) {
            let mut block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(&bytes);
            let header = decode(&block);
            prop_assert!(header.name.len() <= 3 * field::NAME.len);
        }

        #[test]
        fn encode_always_verifies(name in "[a-z/]{1,120}", size in 0u64..=MAX_ENTRY_SIZE, dir in any::<bool>()) {
            let block = encode(&name, size, dir);
            prop_assert_eq!(block.len(), BLOCK_SIZE);
            prop_assert!(verify_checksum(&block));
        }
    }
}
