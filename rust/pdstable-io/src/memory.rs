//! `ReadAt` over byte buffers already held in memory.

use std::{ops::Range, sync::Arc};

use crate::{ReadAt, clamp_range};

/// Byte buffers that can back an in-memory reader.
pub trait AsTableBytes: Send + Sync + 'static {
    fn table_bytes(&self) -> &[u8];
}

impl AsTableBytes for Vec<u8> {
    fn table_bytes(&self) -> &[u8] {
        self
    }
}

impl AsTableBytes for Arc<[u8]> {
    fn table_bytes(&self) -> &[u8] {
        self
    }
}

impl AsTableBytes for &'static [u8] {
    fn table_bytes(&self) -> &[u8] {
        self
    }
}

impl<T: AsTableBytes> ReadAt for T {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.table_bytes().len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Vec<u8>> {
        let bytes = self.table_bytes();
        let range = clamp_range(range, bytes.len() as u64)?;
        Ok(bytes[range.start as usize..range.end as usize].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::ReadAt;

    #[test]
    fn test_mem_reader() {
        let blob = b"abcd123".to_vec();
        assert_eq!(blob.size().unwrap(), 7);
        assert_eq!(blob.read_at(1..3).unwrap(), b"bc");
        assert_eq!(blob.read_at(4..200).unwrap(), b"123");
        assert!(blob.read_at(50..60).unwrap().is_empty());

        let shared: Arc<[u8]> = Arc::from(&b"\"A\",   3\r\n"[..]);
        let reader: &dyn ReadAt = &shared;
        assert_eq!(reader.read_at(5..8).unwrap(), b"  3");
        assert_eq!(reader.read_all().unwrap().len(), 10);
    }
}
