// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic view over one concrete value type.

use super::base::ViewBase;
use super::erased::ErasedView;
use crate::capability::ViewValue;
use crate::error::{Result, ViewError};
use crate::pack::{unpack_from_slice, Pack};
use crate::shape::Index;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::ptr::NonNull;

enum Holder<T> {
    Owned(Box<T>),
    /// Caller-managed value, see [`TypedView::borrowed`].
    Borrowed(NonNull<T>),
}

/// View over a value of type `T`.
///
/// The value is either owned by the view or borrowed from the caller; the
/// mode is fixed at construction. Cloning always produces an owned deep copy.
///
/// ```
/// use datarepo::{ErasedView, TypedView};
///
/// let view = TypedView::from_value("pressure", vec![1.0f64, 2.0, 3.0]);
/// let handle: Box<dyn ErasedView> = Box::new(view);
/// assert_eq!(handle.element_count(), 3);
///
/// let typed = TypedView::<Vec<f64>>::cast(handle.as_ref()).unwrap();
/// assert_eq!(typed.reference()[2], 3.0);
/// assert!(TypedView::<Vec<f32>>::cast(handle.as_ref()).is_err());
/// ```
pub struct TypedView<T: ViewValue + Pack> {
    base: ViewBase,
    holder: Holder<T>,
}

impl<T: ViewValue + Pack + Default> TypedView<T> {
    /// Owned, default-constructed value.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_box(name, Box::default())
    }

    /// Boxed type-erased view of a default-constructed `T`.
    pub fn factory(name: impl Into<String>) -> Box<dyn ErasedView> {
        Box::new(Self::new(name))
    }
}

impl<T: ViewValue + Pack> TypedView<T> {
    /// Take ownership of `value`.
    pub fn from_value(name: impl Into<String>, value: T) -> Self {
        Self::from_box(name, Box::new(value))
    }

    pub fn from_box(name: impl Into<String>, value: Box<T>) -> Self {
        Self {
            base: ViewBase::new(name),
            holder: Holder::Owned(value),
        }
    }

    /// View a value owned by the caller.
    ///
    /// Fails with [`ViewError::NullValue`] if `value` is null.
    ///
    /// # Safety
    ///
    /// `value` must point to a valid `T` that outlives the view and is not
    /// accessed through any other path while the view exists.
    pub unsafe fn borrowed(name: impl Into<String>, value: *mut T) -> Result<Self> {
        let name = name.into();
        let Some(ptr) = NonNull::new(value) else {
            return Err(ViewError::NullValue { view: name });
        };
        Ok(Self {
            base: ViewBase::new(name),
            holder: Holder::Borrowed(ptr),
        })
    }

    /// Checked downcast of a type-erased handle.
    pub fn cast(view: &dyn ErasedView) -> Result<&Self> {
        view.as_any()
            .downcast_ref::<Self>()
            .ok_or_else(|| mismatch::<T>(view))
    }

    pub fn cast_mut(view: &mut dyn ErasedView) -> Result<&mut Self> {
        let err = mismatch::<T>(view);
        view.as_any_mut().downcast_mut::<Self>().ok_or(err)
    }

    pub fn reference(&self) -> &T {
        match &self.holder {
            Holder::Owned(value) => value,
            // SAFETY: `borrowed` requires the pointee to outlive the view
            // and to be reachable only through it.
            Holder::Borrowed(ptr) => unsafe { ptr.as_ref() },
        }
    }

    pub fn reference_mut(&mut self) -> &mut T {
        match &mut self.holder {
            Holder::Owned(value) => value,
            // SAFETY: see `reference`; `&mut self` makes the access unique.
            Holder::Borrowed(ptr) => unsafe { ptr.as_mut() },
        }
    }

    /// Unwrap an owned value. A borrowed view is handed back unchanged.
    pub fn into_inner(self) -> std::result::Result<T, Self> {
        match self.holder {
            Holder::Owned(value) => Ok(*value),
            Holder::Borrowed(ptr) => Err(Self {
                base: self.base,
                holder: Holder::Borrowed(ptr),
            }),
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.holder, Holder::Owned(_))
    }
}

fn mismatch<T>(view: &dyn ErasedView) -> ViewError {
    ViewError::TypeMismatch {
        view: view.name().to_string(),
        expected: type_name::<T>(),
        actual: view.type_name(),
    }
}

impl<T: ViewValue + Pack + Clone> Clone for TypedView<T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.duplicate(),
            holder: Holder::Owned(Box::new(self.reference().clone())),
        }
    }
}

impl<T: ViewValue + Pack + fmt::Debug> fmt::Debug for TypedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedView")
            .field("base", &self.base)
            .field("owned", &self.is_owned())
            .field("value", self.reference())
            .finish()
    }
}

impl<T: ViewValue + Pack> ErasedView for TypedView<T> {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase {
        &mut self.base
    }

    fn is_empty(&self) -> bool {
        self.reference().is_empty()
    }

    fn element_count(&self) -> Index {
        self.reference().len()
    }

    fn rank(&self) -> usize {
        self.reference().rank()
    }

    fn extent_at(&self, dim: usize) -> Result<Index> {
        self.reference()
            .extent(dim)
            .ok_or_else(|| ViewError::InvalidDimension {
                view: self.base.name().to_string(),
                dim,
                rank: self.rank(),
            })
    }

    fn resize_shape(&mut self, extents: &[Index]) -> Result<()> {
        self.reference_mut()
            .resize_shape(extents)
            .map_err(|m| ViewError::InvalidDimension {
                view: self.base.name().to_string(),
                dim: m.requested,
                rank: m.supported,
            })
    }

    fn resize(&mut self, len: Index) {
        self.reference_mut().resize(len);
    }

    fn reserve(&mut self, capacity: Index) {
        self.reference_mut().reserve(capacity);
    }

    fn capacity(&self) -> Index {
        self.reference().capacity()
    }

    fn max_capacity(&self) -> Index {
        self.reference().max_capacity()
    }

    fn clear(&mut self) {
        self.reference_mut().clear();
    }

    fn should_resize(&self) -> bool {
        !T::ORDERED
    }

    fn type_identity(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn element_type(&self) -> TypeId {
        T::element_type()
    }

    fn element_type_name(&self) -> &'static str {
        T::element_type_name()
    }

    fn element_size(&self) -> usize {
        T::element_size()
    }

    fn data_ptr(&self) -> *const u8 {
        self.reference().data_ptr()
    }

    fn data_ptr_mut(&mut self) -> *mut u8 {
        self.reference_mut().data_ptr_mut()
    }

    fn pack(&self, out: &mut Vec<u8>) {
        self.reference().pack(out);
    }

    fn unpack(&mut self, bytes: &[u8]) -> Result<()> {
        unpack_from_slice(self.reference_mut(), bytes).map_err(|source| ViewError::Pack {
            view: self.base.name().to_string(),
            source,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::{MultiArray, SortedArray};
    use crate::pack::{Cursor, PackError};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Material {
        density: f64,
        label: String,
    }

    unsafe impl ViewValue for Material {}

    impl Pack for Material {
        fn pack(&self, out: &mut Vec<u8>) {
            self.density.pack(out);
            self.label.pack(out);
        }

        fn unpack(&mut self, cursor: &mut Cursor<'_>) -> std::result::Result<(), PackError> {
            self.density.unpack(cursor)?;
            self.label.unpack(cursor)
        }
    }

    #[test]
    fn test_fallback_type_stays_scalar() {
        let mut view = TypedView::<Material>::new("material");
        for n in [0, 5, 100] {
            view.resize(n);
            view.reserve(n * 2);
            view.clear();
            assert_eq!(view.element_count(), 1);
            assert_eq!(view.rank(), 1);
            assert!(!view.is_empty());
        }
        assert_eq!(view.capacity(), 0);
        assert_eq!(view.max_capacity(), 0);
        assert_eq!(view.element_type(), TypeId::of::<Material>());
    }

    #[test]
    fn test_reserve_keeps_count() {
        let mut view = TypedView::<Vec<i32>>::new("ids");
        for n in [0, 1, 17, 256] {
            view.resize(n);
            assert_eq!(view.element_count(), n);
            view.reserve(n + 8);
            assert_eq!(view.element_count(), n);
            assert!(view.capacity() >= n + 8);
        }
    }

    #[test]
    fn test_byte_size_tracks_resize() {
        let mut view = TypedView::<Vec<[f64; 3]>>::new("coords");
        for _ in 0..20 {
            let n = fastrand::usize(0..64);
            view.resize(n);
            assert_eq!(view.byte_size(), view.element_count() * view.element_size());
            assert_eq!(view.byte_size(), n * 24);
            assert_eq!(view.num_elements_from_byte_size(view.byte_size()), n);
        }

        let mut grid = TypedView::<MultiArray<u16>>::new("grid");
        grid.resize_shape(&[3, 5]).unwrap();
        assert_eq!(grid.byte_size(), 30);
    }

    #[test]
    fn test_extent_at() {
        let view = TypedView::from_value("dt", 0.5f64);
        assert_eq!(view.extent_at(0).unwrap(), view.element_count());
        let err = view.extent_at(1).unwrap_err();
        assert!(matches!(
            err,
            ViewError::InvalidDimension { dim: 1, rank: 1, .. }
        ));

        let grid = TypedView::from_value("grid", MultiArray::<f32>::new(&[2, 7]).unwrap());
        assert_eq!(grid.extent_at(1).unwrap(), 7);
        assert!(grid.extent_at(2).is_err());
    }

    #[test]
    fn test_resize_shape_rank_checks() {
        let mut view = TypedView::<Vec<u8>>::new("bytes");
        view.resize_shape(&[9]).unwrap();
        assert_eq!(view.element_count(), 9);

        let err = view.resize_shape(&[3, 3]).unwrap_err();
        assert!(matches!(
            err,
            ViewError::InvalidDimension { dim: 2, rank: 1, .. }
        ));
        assert_eq!(view.element_count(), 9);
    }

    #[test]
    fn test_cast_checks_type() {
        let handle = TypedView::<Vec<f64>>::factory("pressure");
        assert!(TypedView::<Vec<f64>>::cast(handle.as_ref()).is_ok());

        let err = TypedView::<Vec<i32>>::cast(handle.as_ref()).unwrap_err();
        match err {
            ViewError::TypeMismatch {
                view,
                expected,
                actual,
            } => {
                assert_eq!(view, "pressure");
                assert_eq!(expected, type_name::<Vec<i32>>());
                assert_eq!(actual, type_name::<Vec<f64>>());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_cast_mut_modifies_value() {
        let mut handle: Box<dyn ErasedView> = Box::new(TypedView::<String>::new("label"));
        TypedView::<String>::cast_mut(handle.as_mut())
            .unwrap()
            .reference_mut()
            .push_str("inlet");
        assert_eq!(handle.element_count(), 5);
        assert!(TypedView::<Vec<u8>>::cast_mut(handle.as_mut()).is_err());
    }

    #[test]
    fn test_borrowed_view() {
        let mut data = vec![1.0f64, 2.0];
        {
            let ptr = std::ptr::addr_of_mut!(data);
            let mut view = unsafe { TypedView::borrowed("data", ptr) }.unwrap();
            assert!(!view.is_owned());
            view.resize(4);
            assert_eq!(view.data_ptr(), view.reference().as_ptr().cast::<u8>());

            let copy = view.clone();
            assert!(copy.is_owned());
            assert!(view.into_inner().is_err());
        }
        assert_eq!(data, vec![1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_null_borrowed_view() {
        let err = unsafe { TypedView::<Vec<f64>>::borrowed("missing", std::ptr::null_mut()) }
            .unwrap_err();
        assert!(matches!(err, ViewError::NullValue { view } if view == "missing"));
    }

    #[test]
    fn test_clone_is_deep() {
        let mut view = TypedView::from_value("ids", vec![1u32, 2, 3]);
        view.base_mut().set_sized_from_parent(true);
        let mut copy = view.clone();
        copy.reference_mut().push(4);

        assert_eq!(view.element_count(), 3);
        assert_eq!(copy.element_count(), 4);
        assert!(copy.base().sized_from_parent());
        assert_eq!(copy.into_inner().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_should_resize() {
        assert!(TypedView::<Vec<f64>>::new("a").should_resize());
        assert!(!TypedView::<SortedArray<i32>>::new("b").should_resize());
    }

    #[test]
    fn test_pack_unpack_through_handle() {
        let source = Material {
            density: 2700.0,
            label: "aluminium".into(),
        };
        let view = TypedView::from_value("material", source.clone());
        let mut bytes = Vec::new();
        view.pack(&mut bytes);

        let mut target = TypedView::<Material>::factory("material");
        target.unpack(&bytes).unwrap();
        assert_eq!(
            TypedView::<Material>::cast(target.as_ref()).unwrap().reference(),
            &source
        );

        let err = target.unpack(&bytes[..4]).unwrap_err();
        assert!(matches!(err, ViewError::Pack { .. }));
    }
}
