// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sorted, deduplicated array.

use crate::capability::ViewValue;
use crate::pack::{write_len, Cursor, Pack, PackError};
use crate::shape::Index;

/// Sorted set backed by a contiguous vector.
///
/// Carries the ordered marker, so a parent never resizes it, and persists
/// through the opaque path where unpacking re-validates the ordering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortedArray<T> {
    values: Vec<T>,
}

impl<T: Ord> SortedArray<T> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Insert `value`, returning `false` if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        match self.values.binary_search(&value) {
            Ok(_) => false,
            Err(pos) => {
                self.values.insert(pos, value);
                true
            }
        }
    }

    pub fn remove(&mut self, value: &T) -> bool {
        match self.values.binary_search(value) {
            Ok(pos) => {
                self.values.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.values.binary_search(value).is_ok()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }
}

impl<T: Ord> FromIterator<T> for SortedArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut values: Vec<T> = iter.into_iter().collect();
        values.sort();
        values.dedup();
        Self { values }
    }
}

// SAFETY: the element type is the array itself, which is not plain data.
unsafe impl<T: Ord + 'static> ViewValue for SortedArray<T> {
    const ORDERED: bool = true;

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn len(&self) -> Index {
        self.values.len()
    }

    fn reserve(&mut self, capacity: Index) {
        self.values
            .reserve(capacity.saturating_sub(self.values.len()));
    }

    fn capacity(&self) -> Index {
        self.values.capacity()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

impl<T: Pack + Ord + Default> Pack for SortedArray<T> {
    fn pack(&self, out: &mut Vec<u8>) {
        write_len(out, self.values.len());
        for value in &self.values {
            value.pack(out);
        }
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        let len = cursor.read_len()?;
        let mut values: Vec<T> = Vec::with_capacity(len.min(cursor.remaining()));
        for _ in 0..len {
            let offset = cursor.offset();
            let mut value = T::default();
            value.unpack(cursor)?;
            if values.last().is_some_and(|last| *last >= value) {
                return Err(PackError::InvalidData {
                    offset,
                    reason: "sorted array out of order".into(),
                });
            }
            values.push(value);
        }
        self.values = values;
        Ok(())
    }
}
