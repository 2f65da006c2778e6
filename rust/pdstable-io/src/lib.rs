//! I/O abstractions for reading table data files:
//! - `ReadAt`: positional reader with the ability to fetch a specified byte range from a file
//!   or an in-memory buffer.
//!
//! Provides two simple implementations: memory-based and file-based.

use std::ops::Range;

pub mod file;
pub mod memory;

pub use file::FileReader;

/// A trait representing a conceptual file or buffer that supports reading from arbitrary
/// positions.
///
/// Table data files are treated as immutable inputs, so there is no writing counterpart.
pub trait ReadAt: Send + Sync + 'static {
    /// Returns the size of the underlying object.
    fn size(&self) -> std::io::Result<u64>;

    /// Reads a specified range of bytes from the object.
    ///
    /// **NOTE**: `read_at` should not return with a short read, unless end-of-file
    /// is encountered.
    ///
    /// # Arguments
    ///
    /// * `range` - A `Range<u64>` that specifies the start and end positions for reading.
    ///   The function may return fewer bytes than requested if the range extends beyond
    ///   the end of the object.
    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>>;

    /// Reads the entire content of the object.
    fn read_all(&self) -> std::io::Result<Vec<u8>> {
        let size = self.size()?;
        self.read_at(0..size)
    }
}

/// Clips `range` to an object of `size` bytes. Reversed ranges are rejected with
/// `InvalidInput`; ranges starting at or past the end become empty.
pub fn clamp_range(range: Range<u64>, size: u64) -> std::io::Result<Range<u64>> {
    if range.end < range.start {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid read range {}..{}", range.start, range.end),
        ));
    }
    if range.start >= size {
        return Ok(size..size);
    }
    Ok(range.start..range.end.min(size))
}
