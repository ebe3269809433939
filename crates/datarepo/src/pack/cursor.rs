// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read cursor over a packed byte buffer.

use super::PackError;

/// Generate little-endian read methods for primitive types
///
/// Each generated method checks the remaining length, decodes the value
/// and advances the offset.
macro_rules! impl_read_le {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self) -> Result<$type, PackError> {
            const SIZE: usize = std::mem::size_of::<$type>();
            let bytes = self.read_bytes(SIZE)?;
            let mut raw = [0u8; SIZE];
            raw.copy_from_slice(bytes);
            Ok(<$type>::from_le_bytes(raw))
        }
    };
}

/// Read cursor over a packed buffer.
#[derive(Debug)]
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    /// Borrow the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PackError> {
        if len > self.remaining() {
            return Err(PackError::UnexpectedEnd {
                offset: self.offset,
                need: len,
                have: self.remaining(),
            });
        }
        let bytes = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    impl_read_le!(read_u8, u8);
    impl_read_le!(read_u16, u16);
    impl_read_le!(read_u32, u32);
    impl_read_le!(read_u64, u64);
    impl_read_le!(read_i8, i8);
    impl_read_le!(read_i16, i16);
    impl_read_le!(read_i32, i32);
    impl_read_le!(read_i64, i64);
    impl_read_le!(read_f32, f32);
    impl_read_le!(read_f64, f64);

    /// Read a `u64` length prefix.
    pub fn read_len(&mut self) -> Result<usize, PackError> {
        let offset = self.offset;
        let len = self.read_u64()?;
        usize::try_from(len).map_err(|_| PackError::InvalidData {
            offset,
            reason: format!("length {} does not fit in usize", len),
        })
    }

    /// Fail unless the whole buffer was consumed.
    pub fn finish(&self) -> Result<(), PackError> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(PackError::TrailingBytes {
                offset: self.offset,
                extra,
            }),
        }
    }
}

/// Append a `u64` length prefix.
pub fn write_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as u64).to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&7u16.to_le_bytes());
        buf.extend_from_slice(&(-3i32).to_le_bytes());
        buf.extend_from_slice(&1.5f64.to_le_bytes());

        let mut cursor = Cursor::new(&buf);
        assert_eq!(cursor.read_u16().unwrap(), 7);
        assert_eq!(cursor.read_i32().unwrap(), -3);
        assert_eq!(cursor.read_f64().unwrap(), 1.5);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.finish().is_ok());
    }

    #[test]
    fn test_unexpected_end() {
        let buf = [1u8, 2, 3];
        let mut cursor = Cursor::new(&buf);
        let err = cursor.read_u32().unwrap_err();
        assert_eq!(
            err,
            PackError::UnexpectedEnd {
                offset: 0,
                need: 4,
                have: 3
            }
        );
        // failed reads do not advance
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_trailing_bytes() {
        let buf = [0u8; 5];
        let mut cursor = Cursor::new(&buf);
        cursor.read_u32().unwrap();
        assert_eq!(
            cursor.finish(),
            Err(PackError::TrailingBytes {
                offset: 4,
                extra: 1
            })
        );
    }
}
