// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Non-generic view interface.

use super::base::ViewBase;
use crate::error::Result;
use crate::shape::Index;
use std::any::{Any, TypeId};

/// Uniform handle over a value of any wrapped type.
///
/// The repository tree and the checkpoint protocol only ever see views
/// through this trait. Every operation is total: a capability the wrapped
/// type lacks takes its fallback (see [`crate::capability`]) instead of
/// failing. The only errors are a dimension outside the value's rank and a
/// multi-dimensional resize the value cannot honour.
///
/// Concrete access goes through [`TypedView::cast`](super::TypedView::cast).
pub trait ErasedView: Any {
    fn base(&self) -> &ViewBase;

    fn base_mut(&mut self) -> &mut ViewBase;

    fn name(&self) -> &str {
        self.base().name()
    }

    fn persist(&self) -> bool {
        self.base().persist()
    }

    fn is_empty(&self) -> bool;

    /// Number of elements; a scalar reports 1.
    fn element_count(&self) -> Index;

    fn rank(&self) -> usize;

    /// Extent of dimension `dim`. Fails with `InvalidDimension` past the rank.
    fn extent_at(&self, dim: usize) -> Result<Index>;

    /// Resize every dimension. Fails with `InvalidDimension` if the value
    /// cannot take that many dimensions.
    fn resize_shape(&mut self, extents: &[Index]) -> Result<()>;

    fn resize(&mut self, len: Index);

    fn reserve(&mut self, capacity: Index);

    fn capacity(&self) -> Index;

    fn max_capacity(&self) -> Index;

    fn clear(&mut self);

    /// `false` when the value keeps a fixed order a parent must not disturb.
    fn should_resize(&self) -> bool;

    /// Identity of the wrapped type itself.
    fn type_identity(&self) -> TypeId;

    fn type_name(&self) -> &'static str;

    /// Identity of one element of the wrapped value.
    fn element_type(&self) -> TypeId;

    fn element_type_name(&self) -> &'static str;

    fn element_size(&self) -> usize;

    /// `element_count() * element_size()`.
    fn byte_size(&self) -> usize {
        self.element_count() * self.element_size()
    }

    /// Whole elements held by `bytes` bytes.
    fn num_elements_from_byte_size(&self, bytes: usize) -> Index {
        bytes / self.element_size().max(1)
    }

    /// Start of the element storage. Valid until the next mutation.
    fn data_ptr(&self) -> *const u8;

    fn data_ptr_mut(&mut self) -> *mut u8;

    /// Append the opaque representation of the value to `out`.
    fn pack(&self, out: &mut Vec<u8>);

    /// Replace the value with the one packed in `bytes`.
    fn unpack(&mut self, bytes: &[u8]) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
