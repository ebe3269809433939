// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! External store slot contract.

use crate::registry::StoreType;
use crate::shape::Shape;

/// Layout of a buffer registered with a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalLayout {
    /// Native elements of `code` laid out as `shape`.
    Typed { code: StoreType, shape: Shape },
    /// Untyped packed bytes.
    Bytes { len: usize },
}

impl ExternalLayout {
    /// Bytes covered by the layout, `None` if the count overflows.
    pub fn byte_len(&self) -> Option<usize> {
        match self {
            Self::Typed { code, shape } => shape.num_elements()?.checked_mul(code.size()),
            Self::Bytes { len } => Some(*len),
        }
    }

    pub fn shape(&self) -> Option<Shape> {
        match self {
            Self::Typed { shape, .. } => Some(*shape),
            Self::Bytes { .. } => None,
        }
    }
}

/// Named resource in the persistent store that one view maps onto.
///
/// The slot never owns a registered buffer. It only reads from it while a
/// write is committed and writes into it while a read is filled, both of
/// which happen between a prepare and its finalize.
pub trait StoreSlot {
    /// Register `ptr` as the slot's data, replacing any previous registration.
    fn set_external(&mut self, layout: ExternalLayout, ptr: *mut u8);

    /// Forget the registered buffer.
    fn clear_external(&mut self);

    fn is_external(&self) -> bool;

    /// Bytes held by the slot: the registered layout when one is set,
    /// otherwise the persisted data.
    fn total_bytes(&self) -> usize;

    /// Shape matching [`total_bytes`](Self::total_bytes), `None` for byte blobs
    /// or an empty slot.
    fn shape(&self) -> Option<Shape>;

    /// Whether the store declares attribute `name` for this slot.
    fn has_attribute(&self, name: &str) -> bool;

    fn set_attribute(&mut self, name: &str, value: bool);

    fn attribute(&self, name: &str) -> Option<bool>;

    /// Restore the attribute's declared default.
    fn reset_attribute(&mut self, name: &str);
}
