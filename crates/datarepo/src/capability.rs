// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static capability detection for wrapped values.
//!
//! [`ViewValue`] is the contract a type must satisfy to live inside a
//! [`TypedView`](crate::TypedView). Every method has a default that encodes
//! the fallback for a type lacking the capability, so a plain aggregate opts in
//! with an empty impl and behaves like a single scalar element. The defaults
//! describe the value itself as one element, which always satisfies the
//! trait's safety contract:
//!
//! | Capability | Fallback |
//! |------------|----------|
//! | `is_empty` | `false` |
//! | `len` | `1` |
//! | `rank` | `1` |
//! | `extent(d)` | `len()` for `d == 0`, otherwise none |
//! | `resize_shape` | rank 1 forwards to `resize`, other ranks rejected |
//! | `resize` / `reserve` / `clear` | no-op |
//! | `capacity` / `max_capacity` | `0` |
//! | `ORDERED` | `false` |
//! | element type / size | the type itself |
//! | `data_ptr` | address of the value itself |
//!
//! Container types override the methods they support. Dispatch is resolved
//! at monomorphisation time, never per call.
//!
//! ```
//! use datarepo::ViewValue;
//!
//! #[derive(Default)]
//! struct Material {
//!     density: f64,
//!     name: String,
//! }
//!
//! // SAFETY: every method keeps its default.
//! unsafe impl ViewValue for Material {}
//!
//! let m = Material::default();
//! assert_eq!(m.len(), 1);
//! assert_eq!(m.extent(1), None);
//! ```

use crate::shape::{Index, MAX_RANK};
use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::mem::size_of;

/// Multi-dimensional resize rejected by the wrapped type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankMismatch {
    /// Largest rank the type accepts.
    pub supported: usize,
    /// Rank that was requested.
    pub requested: usize,
}

/// Capabilities of a value stored in a view.
///
/// # Safety
///
/// The checkpoint protocol hands the element buffer described here to a
/// store, which reads or writes it as raw bytes. When
/// [`element_type`](Self::element_type) is the `TypeId` of a
/// [`PlainData`](crate::PlainData) type `E`, an implementation must ensure:
///
/// - [`element_size`](Self::element_size) is `size_of::<E>()`;
/// - [`data_ptr`](Self::data_ptr) and [`data_ptr_mut`](Self::data_ptr_mut)
///   point to [`len`](Self::len) initialized, contiguous values of `E` owned
///   by `self`, valid until `self` is next mutated;
/// - [`len`](Self::len) equals the product of the extents reported by
///   [`rank`](Self::rank) and [`extent`](Self::extent).
#[allow(clippy::len_without_is_empty)]
pub unsafe trait ViewValue: 'static {
    /// Values are kept in a fixed order and must not be resized by a parent.
    const ORDERED: bool = false;

    fn is_empty(&self) -> bool {
        false
    }

    /// Number of elements.
    fn len(&self) -> Index {
        1
    }

    /// Number of dimensions.
    fn rank(&self) -> usize {
        1
    }

    /// Extent of dimension `dim`, `None` if the dimension does not exist.
    fn extent(&self, dim: usize) -> Option<Index> {
        (dim == 0).then(|| self.len())
    }

    /// Resize every dimension at once.
    fn resize_shape(&mut self, extents: &[Index]) -> Result<(), RankMismatch> {
        match extents {
            [len] => {
                self.resize(*len);
                Ok(())
            }
            _ => Err(RankMismatch {
                supported: 1,
                requested: extents.len(),
            }),
        }
    }

    /// Resize the leading dimension.
    fn resize(&mut self, _len: Index) {}

    /// Ensure room for at least `capacity` elements in total.
    fn reserve(&mut self, _capacity: Index) {}

    fn capacity(&self) -> Index {
        0
    }

    fn max_capacity(&self) -> Index {
        0
    }

    fn clear(&mut self) {}

    /// Runtime identity of one element.
    fn element_type() -> TypeId
    where
        Self: Sized,
    {
        TypeId::of::<Self>()
    }

    fn element_type_name() -> &'static str
    where
        Self: Sized,
    {
        type_name::<Self>()
    }

    /// Size in bytes of one element.
    fn element_size() -> usize
    where
        Self: Sized,
    {
        size_of::<Self>()
    }

    /// Start of the element storage.
    fn data_ptr(&self) -> *const u8 {
        (self as *const Self).cast()
    }

    fn data_ptr_mut(&mut self) -> *mut u8 {
        (self as *mut Self).cast()
    }
}

macro_rules! impl_scalar_view_value {
    ($($t:ty),* $(,)?) => {
        // SAFETY: a scalar is its own single element.
        $(unsafe impl ViewValue for $t {})*
    };
}

impl_scalar_view_value!(
    i8, i16, i32, i64, u8, u16, u32, u64, isize, usize, f32, f64, bool, char
);

// SAFETY: a fixed array is one element of its own type.
unsafe impl<T: 'static, const N: usize> ViewValue for [T; N] {}

fn max_elements<T>() -> Index {
    isize::MAX as usize / size_of::<T>().max(1)
}

// SAFETY: elements live contiguously at `as_ptr()`, `len()` of them.
unsafe impl<T: Clone + Default + 'static> ViewValue for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }

    fn len(&self) -> Index {
        Vec::len(self)
    }

    fn resize(&mut self, len: Index) {
        Vec::resize(self, len, T::default());
    }

    fn reserve(&mut self, capacity: Index) {
        Vec::reserve(self, capacity.saturating_sub(Vec::len(self)));
    }

    fn capacity(&self) -> Index {
        Vec::capacity(self)
    }

    fn max_capacity(&self) -> Index {
        max_elements::<T>()
    }

    fn clear(&mut self) {
        Vec::clear(self);
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
        self.as_ptr().cast()
    }

    fn data_ptr_mut(&mut self) -> *mut u8 {
        self.as_mut_ptr().cast()
    }
}

// Strings are sized containers but their bytes must stay valid UTF-8, so
// they never expose a writable element buffer and persist through packing.
// SAFETY: the element type is `String`, which is not plain data.
unsafe impl ViewValue for String {
    fn is_empty(&self) -> bool {
        String::is_empty(self)
    }

    fn len(&self) -> Index {
        String::len(self)
    }

    fn reserve(&mut self, capacity: Index) {
        String::reserve(self, capacity.saturating_sub(String::len(self)));
    }

    fn capacity(&self) -> Index {
        String::capacity(self)
    }

    fn max_capacity(&self) -> Index {
        isize::MAX as usize
    }

    fn clear(&mut self) {
        String::clear(self);
    }
}

// SAFETY: the element type is the map itself, which is not plain data.
unsafe impl<K, V, S> ViewValue for HashMap<K, V, S>
where
    K: Eq + Hash + 'static,
    V: 'static,
    S: BuildHasher + 'static,
{
    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }

    fn len(&self) -> Index {
        HashMap::len(self)
    }

    fn reserve(&mut self, capacity: Index) {
        HashMap::reserve(self, capacity.saturating_sub(HashMap::len(self)));
    }

    fn capacity(&self) -> Index {
        HashMap::capacity(self)
    }

    fn max_capacity(&self) -> Index {
        max_elements::<(K, V)>()
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }
}

// SAFETY: the element type is the map itself, which is not plain data.
unsafe impl<K: Ord + 'static, V: 'static> ViewValue for BTreeMap<K, V> {
    const ORDERED: bool = true;

    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }

    fn len(&self) -> Index {
        BTreeMap::len(self)
    }

    fn max_capacity(&self) -> Index {
        max_elements::<(K, V)>()
    }

    fn clear(&mut self) {
        BTreeMap::clear(self);
    }
}

/// Check a requested rank against the shape capacity.
pub(crate) fn check_rank(extents: &[Index]) -> Result<(), RankMismatch> {
    if extents.is_empty() || extents.len() > MAX_RANK {
        return Err(RankMismatch {
            supported: MAX_RANK,
            requested: extents.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Clone)]
    struct Gauge {
        a: f64,
        b: u32,
    }

    unsafe impl ViewValue for Gauge {}

    #[test]
    fn test_fallbacks() {
        let mut gauge = Gauge::default();
        assert!(!gauge.is_empty());
        assert_eq!(gauge.len(), 1);
        assert_eq!(gauge.rank(), 1);
        assert_eq!(gauge.extent(0), Some(1));
        assert_eq!(gauge.extent(1), None);

        gauge.resize(10);
        gauge.reserve(10);
        gauge.clear();
        assert_eq!(gauge.len(), 1);
        assert_eq!(gauge.capacity(), 0);
        assert_eq!(gauge.max_capacity(), 0);

        assert!(gauge.resize_shape(&[7]).is_ok());
        assert_eq!(
            gauge.resize_shape(&[2, 3]),
            Err(RankMismatch {
                supported: 1,
                requested: 2
            })
        );

        assert_eq!(Gauge::element_type(), TypeId::of::<Gauge>());
        assert_eq!(Gauge::element_size(), size_of::<Gauge>());
        assert_eq!(gauge.data_ptr(), (&gauge as *const Gauge).cast::<u8>());
        assert!(!Gauge::ORDERED);
        let _ = (gauge.a, gauge.b);
    }

    #[test]
    fn test_vec_native_path() {
        let mut values: Vec<f32> = Vec::new();
        assert!(ViewValue::is_empty(&values));

        ViewValue::resize(&mut values, 12);
        assert_eq!(ViewValue::len(&values), 12);
        assert_eq!(values.extent(0), Some(12));

        ViewValue::reserve(&mut values, 40);
        assert_eq!(ViewValue::len(&values), 12);
        assert!(ViewValue::capacity(&values) >= 40);

        values.resize_shape(&[3]).unwrap();
        assert_eq!(ViewValue::len(&values), 3);

        assert_eq!(<Vec<f32>>::element_type(), TypeId::of::<f32>());
        assert_eq!(<Vec<f32>>::element_size(), 4);
        assert_eq!(ViewValue::data_ptr(&values), values.as_ptr().cast::<u8>());

        ViewValue::clear(&mut values);
        assert_eq!(ViewValue::len(&values), 0);
    }

    #[test]
    fn test_string_is_its_own_element() {
        let mut text = String::from("abc");
        assert_eq!(ViewValue::len(&text), 3);
        ViewValue::resize(&mut text, 10);
        assert_eq!(text, "abc");
        assert_eq!(String::element_type(), TypeId::of::<String>());
    }

    #[test]
    fn test_fixed_array_is_one_element() {
        let mut origin = [1.0f64, 2.0, 3.0];
        assert_eq!(ViewValue::len(&origin), 1);
        assert_eq!(<[f64; 3]>::element_type(), TypeId::of::<[f64; 3]>());
        assert_eq!(<[f64; 3]>::element_size(), 24);
        assert_eq!(origin.data_ptr_mut(), origin.as_mut_ptr().cast::<u8>());
    }

    #[test]
    fn test_ordered_marker() {
        assert!(<BTreeMap<u32, f64>>::ORDERED);
        assert!(!<HashMap<u32, f64>>::ORDERED);
        assert!(!<Vec<u8>>::ORDERED);
    }

    #[test]
    fn test_check_rank() {
        assert!(check_rank(&[1, 2]).is_ok());
        assert!(check_rank(&[]).is_err());
        assert!(check_rank(&[1; MAX_RANK + 1]).is_err());
    }
}
