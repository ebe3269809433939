// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Opaque pack/unpack for values without a store type code.
//!
//! The encoding is little-endian with `u64` length prefixes for every
//! variable-sized container. It is private to the checkpoint image: only
//! [`unpack`](Pack::unpack) of the same type is expected to read it back.
//!
//! ```
//! use datarepo::pack::{pack_to_vec, unpack_from_slice};
//!
//! let names = vec!["inlet".to_string(), "outlet".to_string()];
//! let bytes = pack_to_vec(&names);
//!
//! let mut restored: Vec<String> = Vec::new();
//! unpack_from_slice(&mut restored, &bytes).unwrap();
//! assert_eq!(restored, names);
//! ```

mod cursor;
mod impls;

pub use cursor::{write_len, Cursor};

use thiserror::Error;

/// Errors raised while unpacking a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    #[error("unpack failed at offset {offset}: need {need} bytes, have {have}")]
    UnexpectedEnd {
        offset: usize,
        need: usize,
        have: usize,
    },
    #[error("unpack failed at offset {offset}: {reason}")]
    InvalidData { offset: usize, reason: String },
    #[error("unpack left {extra} trailing bytes at offset {offset}")]
    TrailingBytes { offset: usize, extra: usize },
}

/// Byte-packing used by the opaque checkpoint path.
pub trait Pack {
    /// Append the packed representation of `self` to `out`.
    fn pack(&self, out: &mut Vec<u8>);

    /// Restore `self` in place from `cursor`.
    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError>;
}

/// Pack `value` into a newly allocated buffer.
pub fn pack_to_vec<T: Pack + ?Sized>(value: &T) -> Vec<u8> {
    let mut out = Vec::new();
    value.pack(&mut out);
    out
}

/// Restore `value` from `bytes`, requiring every byte to be consumed.
pub fn unpack_from_slice<T: Pack + ?Sized>(value: &mut T, bytes: &[u8]) -> Result<(), PackError> {
    let mut cursor = Cursor::new(bytes);
    value.unpack(&mut cursor)?;
    cursor.finish()
}
