// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dense row-major multi-dimensional array.

use crate::capability::{check_rank, RankMismatch, ViewValue};
use crate::pack::{write_len, Cursor, Pack, PackError};
use crate::shape::{Index, Shape, MAX_RANK};
use std::any::{type_name, TypeId};
use std::mem::size_of;

/// Row-major array with up to [`MAX_RANK`] dimensions.
///
/// ```
/// use datarepo::MultiArray;
///
/// let mut a: MultiArray<f64> = MultiArray::new(&[2, 3]).unwrap();
/// *a.get_mut(&[1, 2]).unwrap() = 4.0;
/// assert_eq!(a.as_slice()[5], 4.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MultiArray<T> {
    dims: Shape,
    data: Vec<T>,
}

impl<T: Clone + Default> MultiArray<T> {
    /// Default-filled array. `None` for rank 0, rank above [`MAX_RANK`] or
    /// an element count that overflows.
    pub fn new(extents: &[Index]) -> Option<Self> {
        check_rank(extents).ok()?;
        let dims = Shape::from_extents(extents)?;
        Some(Self {
            data: vec![T::default(); dims.num_elements()?],
            dims,
        })
    }

    /// Wrap existing data. `None` if the element count does not match.
    pub fn from_vec(extents: &[Index], data: Vec<T>) -> Option<Self> {
        check_rank(extents).ok()?;
        let dims = Shape::from_extents(extents)?;
        (dims.num_elements()? == data.len()).then_some(Self { dims, data })
    }

    /// Change every extent. Elements keep their flat position.
    ///
    /// Extents whose element count overflows are rejected like an
    /// unsupported rank.
    pub fn reshape(&mut self, extents: &[Index]) -> Result<(), RankMismatch> {
        check_rank(extents)?;
        let rejected = RankMismatch {
            supported: MAX_RANK,
            requested: extents.len(),
        };
        let dims = Shape::from_extents(extents).ok_or(rejected)?;
        let count = dims.num_elements().ok_or(rejected)?;
        self.data.resize(count, T::default());
        self.dims = dims;
        Ok(())
    }
}

impl<T> MultiArray<T> {
    pub fn dims(&self) -> &[Index] {
        self.dims.extents()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Number of elements in one step of the leading dimension.
    fn row_len(&self) -> Option<Index> {
        self.dims.extents()[1..]
            .iter()
            .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
    }

    fn offset(&self, index: &[Index]) -> Option<usize> {
        if index.len() != self.dims.rank() {
            return None;
        }
        let mut offset = 0;
        for (&i, &extent) in index.iter().zip(self.dims.extents()) {
            if i >= extent {
                return None;
            }
            offset = offset * extent + i;
        }
        Some(offset)
    }

    pub fn get(&self, index: &[Index]) -> Option<&T> {
        self.offset(index).map(|o| &self.data[o])
    }

    pub fn get_mut(&mut self, index: &[Index]) -> Option<&mut T> {
        self.offset(index).map(move |o| &mut self.data[o])
    }
}

impl<T: Clone + Default> Default for MultiArray<T> {
    fn default() -> Self {
        Self {
            dims: Shape::linear(0),
            data: Vec::new(),
        }
    }
}

// SAFETY: `data` holds the product of `dims` elements contiguously.
unsafe impl<T: Clone + Default + 'static> ViewValue for MultiArray<T> {
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn len(&self) -> Index {
        self.data.len()
    }

    fn rank(&self) -> usize {
        self.dims.rank()
    }

    fn extent(&self, dim: usize) -> Option<Index> {
        self.dims.extent(dim)
    }

    fn resize_shape(&mut self, extents: &[Index]) -> Result<(), RankMismatch> {
        self.reshape(extents)
    }

    fn resize(&mut self, len: Index) {
        // an overflowing count leaves the array as it is
        let Some(count) = self.row_len().and_then(|row| row.checked_mul(len)) else {
            return;
        };
        let mut leading = Shape::linear(len);
        for &extent in &self.dims.extents()[1..] {
            leading.push(extent);
        }
        self.data.resize(count, T::default());
        self.dims = leading;
    }

    fn reserve(&mut self, capacity: Index) {
        self.data
            .reserve(capacity.saturating_sub(self.data.len()));
    }

    fn capacity(&self) -> Index {
        self.data.capacity()
    }

    fn max_capacity(&self) -> Index {
        isize::MAX as usize / size_of::<T>().max(1)
    }

    fn clear(&mut self) {
        ViewValue::resize(self, 0);
    }

    fn element_type() -> TypeId {
        TypeId::of::<T>()
    }

    fn element_type_name() -> &'static str {
        type_name::<T>()
    }

    fn element_size() -> usize {
        size_of::<T>()
    }

    fn data_ptr(&self) -> *const u8 {
        self.data.as_ptr().cast()
    }

    fn data_ptr_mut(&mut self) -> *mut u8 {
        self.data.as_mut_ptr().cast()
    }
}

impl<T: Pack + Clone + Default> Pack for MultiArray<T> {
    fn pack(&self, out: &mut Vec<u8>) {
        write_len(out, self.dims.rank());
        for &extent in self.dims.extents() {
            write_len(out, extent);
        }
        for item in &self.data {
            item.pack(out);
        }
    }

    fn unpack(&mut self, cursor: &mut Cursor<'_>) -> Result<(), PackError> {
        let offset = cursor.offset();
        let rank = cursor.read_len()?;
        if rank == 0 || rank > MAX_RANK {
            return Err(PackError::InvalidData {
                offset,
                reason: format!("array rank {} outside 1..={}", rank, MAX_RANK),
            });
        }
        let mut dims = Shape::empty();
        for _ in 0..rank {
            let extent = cursor.read_len()?;
            dims.push(extent);
        }
        let count = dims
            .num_elements()
            .ok_or_else(|| PackError::InvalidData {
                offset,
                reason: "array element count overflows".into(),
            })?;

        let mut data = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            let mut item = T::default();
            item.unpack(cursor)?;
            data.push(item);
        }
        self.dims = dims;
        self.data = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{pack_to_vec, unpack_from_slice};

    #[test]
    fn test_indexing_is_row_major() {
        let a = MultiArray::from_vec(&[2, 3], (0..6).collect::<Vec<i32>>()).unwrap();
        assert_eq!(a.get(&[0, 2]), Some(&2));
        assert_eq!(a.get(&[1, 0]), Some(&3));
        assert_eq!(a.get(&[2, 0]), None);
        assert_eq!(a.get(&[1]), None);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(MultiArray::<f64>::new(&[]).is_none());
        assert!(MultiArray::<f64>::new(&[1; MAX_RANK + 1]).is_none());
        assert!(MultiArray::from_vec(&[2, 2], vec![1.0; 3]).is_none());
        assert!(MultiArray::<u8>::new(&[usize::MAX, 2]).is_none());

        let mut a = MultiArray::<u8>::new(&[0, 4]).unwrap();
        assert!(a.reshape(&[usize::MAX, 3]).is_err());
        a.reshape(&[0, usize::MAX, 2]).unwrap();
        ViewValue::resize(&mut a, 3);
        assert_eq!(a.dims(), &[0, usize::MAX, 2]);
    }

    #[test]
    fn test_native_capabilities() {
        let mut a: MultiArray<f64> = MultiArray::new(&[4, 3]).unwrap();
        assert_eq!(a.rank(), 2);
        assert_eq!(a.extent(0), Some(4));
        assert_eq!(a.extent(1), Some(3));
        assert_eq!(a.extent(2), None);
        assert_eq!(ViewValue::len(&a), 12);

        // leading dimension only
        ViewValue::resize(&mut a, 5);
        assert_eq!(a.dims(), &[5, 3]);
        assert_eq!(ViewValue::len(&a), 15);

        a.resize_shape(&[2, 2, 2]).unwrap();
        assert_eq!(a.rank(), 3);
        assert_eq!(ViewValue::len(&a), 8);

        ViewValue::clear(&mut a);
        assert!(ViewValue::is_empty(&a));
        assert_eq!(a.dims(), &[0, 2, 2]);
    }

    #[test]
    fn test_pack_restores_shape() {
        let source = MultiArray::from_vec(&[3, 2], vec![1u16, 2, 3, 4, 5, 6]).unwrap();
        let mut restored: MultiArray<u16> = MultiArray::default();
        unpack_from_slice(&mut restored, &pack_to_vec(&source)).unwrap();
        assert_eq!(restored, source);
    }

    #[test]
    fn test_unpack_rejects_bad_rank() {
        let mut bytes = Vec::new();
        write_len(&mut bytes, MAX_RANK + 1);
        let mut target: MultiArray<u8> = MultiArray::default();
        let err = unpack_from_slice(&mut target, &bytes).unwrap_err();
        assert!(matches!(err, PackError::InvalidData { offset: 0, .. }));
    }
}
