// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Four-phase checkpoint protocol.
//!
//! A write cycle is `prepare_write` -> store commits -> `finalize_write`; a
//! read cycle is `prepare_read` -> store fills -> `finalize_read`. Between the
//! two calls of a cycle the slot holds a pointer into memory owned by the
//! view, either the value's own contiguous buffer (mapped element types) or
//! a temporary packed blob (everything else).
//! [`Checkpointer::register_data_ptr`] registers a mapped buffer without
//! opening a cycle.
//!
//! ## Shapes
//!
//! A mapped value is registered with its own extents. When one element
//! spans several store elements (`[f64; 3]` over `float64`), a trailing
//! dimension of `element_size / native_size` is appended, and dropped again
//! on restore.
//!
//! ```
//! use datarepo::{Checkpointer, MemorySlot, TypeRegistry, TypedView};
//!
//! let registry = TypeRegistry::new();
//! let checkpointer = Checkpointer::with_defaults(&registry);
//! let mut slot = MemorySlot::new();
//!
//! let mut source = TypedView::from_value("temperature", vec![280.0f64, 300.5]);
//! checkpointer.prepare_write(&mut source, &mut slot).unwrap();
//! unsafe { slot.commit() };
//! checkpointer.finalize_write(&mut source, &mut slot).unwrap();
//!
//! let mut target = TypedView::<Vec<f64>>::new("temperature");
//! checkpointer.prepare_read(&mut target, &mut slot).unwrap();
//! unsafe { slot.fill() };
//! checkpointer.finalize_read(&mut target, &mut slot).unwrap();
//! assert_eq!(target.reference(), &[280.0, 300.5]);
//! ```

mod memory;
mod slot;

pub use memory::{MemorySlot, MemoryStore};
pub use slot::{ExternalLayout, StoreSlot};

use crate::config::CheckpointConfig;
use crate::error::{Result, ViewError};
use crate::registry::{StoreType, TypeClass, TypeRegistry};
use crate::shape::{Shape, MAX_RANK};
use crate::view::{CheckpointPhase, ErasedView};
use log::{debug, error, warn};

/// Runs checkpoint cycles against one type registry.
#[derive(Debug, Clone)]
pub struct Checkpointer<'r> {
    registry: &'r TypeRegistry,
    config: CheckpointConfig,
}

impl<'r> Checkpointer<'r> {
    /// Fails with [`ViewError::Config`] if `config` does not validate.
    pub fn new(registry: &'r TypeRegistry, config: CheckpointConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    pub fn with_defaults(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            config: CheckpointConfig::default(),
        }
    }

    pub fn config(&self) -> &CheckpointConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    // -----------------------------------------------------------------------
    // Write cycle
    // -----------------------------------------------------------------------

    /// Register the view's data with `slot` for writing.
    pub fn prepare_write(
        &self,
        view: &mut dyn ErasedView,
        slot: &mut dyn StoreSlot,
    ) -> Result<()> {
        expect_phase(view, CheckpointPhase::Idle, "prepare write")?;

        if !view.persist() {
            self.store_sized_from_parent(view, slot);
            slot.clear_external();
            debug!("[checkpoint] '{}' not persisted, skipping write", view.name());
            view.base_mut().begin(CheckpointPhase::Writing);
            return Ok(());
        }

        // Shape errors must fire before the slot is touched.
        let class = self.registry.classify(view.element_type());
        let shape = match class {
            TypeClass::Mapped { native_size, .. } if view.element_count() > 0 => {
                Some(self.write_shape(view, native_size)?)
            }
            _ => None,
        };

        self.store_sized_from_parent(view, slot);
        view.base_mut().begin(CheckpointPhase::Writing);

        if view.element_count() == 0 {
            slot.clear_external();
            debug!("[checkpoint] '{}' is empty, nothing to write", view.name());
            return Ok(());
        }

        match (class, shape) {
            (TypeClass::Mapped { code, .. }, Some(shape)) => {
                debug!(
                    "[checkpoint] '{}' mapped write: {} {:?}",
                    view.name(),
                    code,
                    shape
                );
                let ptr = view.data_ptr_mut();
                slot.set_external(ExternalLayout::Typed { code, shape }, ptr);
            }
            _ => {
                let mut packed = Vec::new();
                view.pack(&mut packed);
                let len = packed.len();
                debug!(
                    "[checkpoint] '{}' opaque write: {} packed as {} bytes",
                    view.name(),
                    view.type_name(),
                    len
                );
                let ptr = view.base_mut().lend_scratch(packed.into_boxed_slice());
                slot.set_external(ExternalLayout::Bytes { len }, ptr);
            }
        }
        view.base_mut().mark_attached();
        Ok(())
    }

    /// Close a write cycle: detach the slot and release any packed buffer.
    pub fn finalize_write(
        &self,
        view: &mut dyn ErasedView,
        slot: &mut dyn StoreSlot,
    ) -> Result<()> {
        expect_phase(view, CheckpointPhase::Writing, "finalize write")?;
        self.warn_if_detached(view, slot);

        let attr = self.config.sized_from_parent_attribute.as_str();
        if slot.has_attribute(attr) {
            slot.reset_attribute(attr);
        }

        if view.base_mut().end().is_some() {
            debug!("[checkpoint] '{}' released packed buffer", view.name());
        }
        slot.clear_external();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read cycle
    // -----------------------------------------------------------------------

    /// Size the view from the slot and register a buffer to receive its data.
    pub fn prepare_read(
        &self,
        view: &mut dyn ErasedView,
        slot: &mut dyn StoreSlot,
    ) -> Result<()> {
        expect_phase(view, CheckpointPhase::Idle, "prepare read")?;

        self.load_sized_from_parent(view, slot);
        if !view.persist() {
            slot.clear_external();
            debug!("[checkpoint] '{}' not persisted, skipping read", view.name());
            view.base_mut().begin(CheckpointPhase::Reading);
            return Ok(());
        }

        let total_bytes = slot.total_bytes();
        if total_bytes == 0 {
            debug!("[checkpoint] '{}' has no stored data", view.name());
            view.base_mut().begin(CheckpointPhase::Reading);
            return Ok(());
        }

        match self.registry.classify(view.element_type()) {
            TypeClass::Mapped { code, native_size } => {
                self.prepare_mapped_read(view, slot, code, native_size, total_bytes)
            }
            TypeClass::Unmapped => {
                debug!(
                    "[checkpoint] '{}' opaque read: {} bytes for {}",
                    view.name(),
                    total_bytes,
                    view.type_name()
                );
                view.base_mut().begin(CheckpointPhase::Reading);
                let ptr = view
                    .base_mut()
                    .lend_scratch(vec![0u8; total_bytes].into_boxed_slice());
                slot.set_external(ExternalLayout::Bytes { len: total_bytes }, ptr);
                view.base_mut().mark_attached();
                Ok(())
            }
        }
    }

    /// Close a read cycle: unpack opaque data and detach the slot.
    pub fn finalize_read(
        &self,
        view: &mut dyn ErasedView,
        slot: &mut dyn StoreSlot,
    ) -> Result<()> {
        expect_phase(view, CheckpointPhase::Reading, "finalize read")?;
        self.warn_if_detached(view, slot);

        let received = view.base_mut().end();
        slot.clear_external();
        if !view.persist() {
            return Ok(());
        }
        if let Some(bytes) = received {
            debug!(
                "[checkpoint] '{}' unpacking {} bytes",
                view.name(),
                bytes.len()
            );
            view.unpack(&bytes)?;
        }
        Ok(())
    }

    fn prepare_mapped_read(
        &self,
        view: &mut dyn ErasedView,
        slot: &mut dyn StoreSlot,
        code: StoreType,
        native_size: usize,
        total_bytes: usize,
    ) -> Result<()> {
        let shape = self.read_shape(view, slot, native_size, total_bytes)?;
        view.resize_shape(shape.extents())?;

        if self.config.verify_restored_bytes && view.byte_size() != total_bytes {
            error!(
                "[checkpoint] '{}' holds {} bytes after resize, slot has {}",
                view.name(),
                view.byte_size(),
                total_bytes
            );
            return Err(ViewError::ShapeConsistency {
                view: view.name().to_string(),
                recorded: view.element_count(),
                expected: view.num_elements_from_byte_size(total_bytes),
            });
        }

        if view.element_count() == 0 {
            warn!(
                "[checkpoint] '{}' is empty after resize, {} stored bytes not restored",
                view.name(),
                total_bytes
            );
            slot.clear_external();
            view.base_mut().begin(CheckpointPhase::Reading);
            return Ok(());
        }
        if view.byte_size() != total_bytes {
            warn!(
                "[checkpoint] '{}' holds {} bytes after resize, slot has {}",
                view.name(),
                view.byte_size(),
                total_bytes
            );
        }

        // The registration covers the view's own buffer, whatever was recorded.
        let registered = self.write_shape(view, native_size)?;
        debug!(
            "[checkpoint] '{}' mapped read: {} {:?}",
            view.name(),
            code,
            registered
        );
        view.base_mut().begin(CheckpointPhase::Reading);
        let ptr = view.data_ptr_mut();
        slot.set_external(
            ExternalLayout::Typed {
                code,
                shape: registered,
            },
            ptr,
        );
        view.base_mut().mark_attached();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Direct registration
    // -----------------------------------------------------------------------

    /// Register the view's native buffer with `slot`, outside a checkpoint
    /// cycle.
    ///
    /// Values of unmapped element types are left alone; an empty value
    /// detaches the slot. The slot keeps the pointer after this returns, so
    /// the value must not move or be resized while the store may use it.
    pub fn register_data_ptr(
        &self,
        view: &mut dyn ErasedView,
        slot: &mut dyn StoreSlot,
    ) -> Result<()> {
        expect_phase(view, CheckpointPhase::Idle, "register data")?;

        let TypeClass::Mapped { code, native_size } = self.registry.classify(view.element_type())
        else {
            debug!(
                "[checkpoint] '{}' holds unmapped {}, not registered",
                view.name(),
                view.type_name()
            );
            return Ok(());
        };

        if view.element_count() == 0 {
            slot.clear_external();
            return Ok(());
        }

        let shape = self.write_shape(view, native_size)?;
        debug!(
            "[checkpoint] '{}' registered: {} {:?}",
            view.name(),
            code,
            shape
        );
        let ptr = view.data_ptr_mut();
        slot.set_external(ExternalLayout::Typed { code, shape }, ptr);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn store_sized_from_parent(&self, view: &dyn ErasedView, slot: &mut dyn StoreSlot) {
        let attr = self.config.sized_from_parent_attribute.as_str();
        if slot.has_attribute(attr) {
            slot.set_attribute(attr, view.base().sized_from_parent());
        }
    }

    fn load_sized_from_parent(&self, view: &mut dyn ErasedView, slot: &mut dyn StoreSlot) {
        let attr = self.config.sized_from_parent_attribute.as_str();
        if let Some(sized) = slot.attribute(attr) {
            view.base_mut().set_sized_from_parent(sized);
            slot.reset_attribute(attr);
        }
    }

    fn warn_if_detached(&self, view: &dyn ErasedView, slot: &dyn StoreSlot) {
        if view.base().attached() && !slot.is_external() {
            warn!(
                "[checkpoint] '{}' slot lost its registered buffer before finalize",
                view.name()
            );
        }
    }

    /// Value extents, plus the sub-element dimension when the value holds
    /// more bytes than its element count in store elements.
    fn write_shape(&self, view: &dyn ErasedView, native_size: usize) -> Result<Shape> {
        let rank = view.rank();
        let fold = view.byte_size() > view.element_count() * native_size;
        let total_rank = rank + usize::from(fold);
        if total_rank > self.config.max_rank {
            error!(
                "[checkpoint] '{}' needs rank {}, limit is {}",
                view.name(),
                total_rank,
                self.config.max_rank
            );
            return Err(rank_overflow(view, total_rank, self.config.max_rank));
        }

        let mut shape = Shape::empty();
        for dim in 0..rank {
            shape
                .push(view.extent_at(dim)?)
                .ok_or_else(|| rank_overflow(view, total_rank, MAX_RANK))?;
        }
        if fold {
            shape
                .push(view.element_size() / native_size)
                .ok_or_else(|| rank_overflow(view, total_rank, MAX_RANK))?;
        }
        Ok(shape)
    }

    /// Recorded extents with the sub-element dimension removed, checked
    /// against the byte count held by the slot.
    fn read_shape(
        &self,
        view: &dyn ErasedView,
        slot: &dyn StoreSlot,
        native_size: usize,
        total_bytes: usize,
    ) -> Result<Shape> {
        let expected = view.num_elements_from_byte_size(total_bytes);
        let mut shape = slot.shape().unwrap_or_else(|| Shape::linear(expected));

        if shape.rank() > self.config.max_rank {
            error!(
                "[checkpoint] '{}' stored with rank {}, limit is {}",
                view.name(),
                shape.rank(),
                self.config.max_rank
            );
            return Err(rank_overflow(view, shape.rank(), self.config.max_rank));
        }

        if let Some(width) = sub_element_width(view.element_size(), native_size) {
            let stored = shape.pop();
            if stored != Some(width) || shape.rank() == 0 {
                error!(
                    "[checkpoint] '{}' stored sub-element width {:?}, expected {}",
                    view.name(),
                    stored,
                    width
                );
                return Err(ViewError::ShapeConsistency {
                    view: view.name().to_string(),
                    recorded: stored.unwrap_or(0),
                    expected: width,
                });
            }
        }

        let Some(recorded) = shape.num_elements() else {
            error!(
                "[checkpoint] '{}' recorded shape {:?} overflows the element count",
                view.name(),
                shape
            );
            return Err(ViewError::ShapeConsistency {
                view: view.name().to_string(),
                recorded: usize::MAX,
                expected,
            });
        };
        if recorded != expected {
            error!(
                "[checkpoint] '{}' recorded shape {:?} holds {} elements, stored bytes hold {}",
                view.name(),
                shape,
                recorded,
                expected
            );
            return Err(ViewError::ShapeConsistency {
                view: view.name().to_string(),
                recorded,
                expected,
            });
        }
        Ok(shape)
    }
}

/// Store elements per value element, when one value element spans several.
fn sub_element_width(element_size: usize, native_size: usize) -> Option<usize> {
    (native_size > 0 && element_size > native_size).then(|| element_size / native_size)
}

fn rank_overflow(view: &dyn ErasedView, rank: usize, max: usize) -> ViewError {
    ViewError::RankOverflow {
        view: view.name().to_string(),
        rank,
        max,
    }
}

fn expect_phase(
    view: &dyn ErasedView,
    expected: CheckpointPhase,
    operation: &'static str,
) -> Result<()> {
    let phase = view.base().phase();
    if phase != expected {
        return Err(ViewError::OutOfOrder {
            view: view.name().to_string(),
            phase: phase.name(),
            operation,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::MultiArray;
    use crate::view::TypedView;

    fn registry_with_vectors() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register::<[f64; 3]>(StoreType::Float64)
            .unwrap();
        registry
    }

    #[test]
    fn test_out_of_order_phases() {
        let registry = TypeRegistry::new();
        let checkpointer = Checkpointer::with_defaults(&registry);
        let mut slot = MemorySlot::new();
        let mut view = TypedView::from_value("ids", vec![1u32, 2]);

        let err = checkpointer.finalize_write(&mut view, &mut slot).unwrap_err();
        assert!(matches!(
            err,
            ViewError::OutOfOrder {
                phase: "idle",
                operation: "finalize write",
                ..
            }
        ));

        checkpointer.prepare_write(&mut view, &mut slot).unwrap();
        let err = checkpointer.prepare_read(&mut view, &mut slot).unwrap_err();
        assert!(matches!(err, ViewError::OutOfOrder { phase: "writing", .. }));
        assert!(checkpointer.finalize_read(&mut view, &mut slot).is_err());
        assert!(checkpointer.prepare_write(&mut view, &mut slot).is_err());

        // the open cycle is untouched by the rejected calls
        assert!(slot.is_external());
        checkpointer.finalize_write(&mut view, &mut slot).unwrap();
        assert!(!slot.is_external());
        assert_eq!(view.base().phase(), CheckpointPhase::Idle);
    }

    #[test]
    fn test_mapped_write_layouts() {
        let registry = registry_with_vectors();
        let checkpointer = Checkpointer::with_defaults(&registry);
        let mut slot = MemorySlot::new();

        let mut grid = TypedView::from_value("grid", MultiArray::<i32>::new(&[2, 5]).unwrap());
        checkpointer.prepare_write(&mut grid, &mut slot).unwrap();
        assert_eq!(
            slot.registered_layout(),
            Some(ExternalLayout::Typed {
                code: StoreType::Int32,
                shape: Shape::from_extents(&[2, 5]).unwrap(),
            })
        );
        assert_eq!(slot.total_bytes(), 40);
        checkpointer.finalize_write(&mut grid, &mut slot).unwrap();

        let mut dt = TypedView::from_value("dt", 1e-3f64);
        checkpointer.prepare_write(&mut dt, &mut slot).unwrap();
        assert_eq!(slot.shape(), Some(Shape::linear(1)));
        checkpointer.finalize_write(&mut dt, &mut slot).unwrap();
    }

    #[test]
    fn test_opaque_write_lends_packed_buffer() {
        let registry = TypeRegistry::new();
        let checkpointer = Checkpointer::with_defaults(&registry);
        let mut slot = MemorySlot::new();
        let mut view = TypedView::from_value("label", String::from("outlet"));

        checkpointer.prepare_write(&mut view, &mut slot).unwrap();
        // u64 length prefix plus the text
        assert_eq!(
            slot.registered_layout(),
            Some(ExternalLayout::Bytes { len: 14 })
        );
        checkpointer.finalize_write(&mut view, &mut slot).unwrap();
        assert!(!slot.is_external());
    }

    #[test]
    fn test_rank_limit() {
        let registry = registry_with_vectors();
        let config = CheckpointConfig::builder().max_rank(1).build().unwrap();
        let checkpointer = Checkpointer::new(&registry, config).unwrap();
        let mut slot = MemorySlot::new();

        let mut view = TypedView::from_value("coords", vec![[0.0f64; 3]; 4]);
        let err = checkpointer.prepare_write(&mut view, &mut slot).unwrap_err();
        assert!(matches!(err, ViewError::RankOverflow { rank: 2, max: 1, .. }));
        assert!(!slot.is_external());
        assert_eq!(view.base().phase(), CheckpointPhase::Idle);

        let mut flat = TypedView::from_value("ids", vec![1u8, 2, 3]);
        checkpointer.prepare_write(&mut flat, &mut slot).unwrap();
        checkpointer.finalize_write(&mut flat, &mut slot).unwrap();
    }

    #[test]
    fn test_rejects_invalid_config() {
        let registry = TypeRegistry::new();
        let config = CheckpointConfig {
            max_rank: 0,
            ..CheckpointConfig::default()
        };
        assert!(matches!(
            Checkpointer::new(&registry, config),
            Err(ViewError::Config(_))
        ));
    }

    #[test]
    fn test_finalize_after_store_detached() {
        let registry = TypeRegistry::new();
        let checkpointer = Checkpointer::with_defaults(&registry);
        let mut slot = MemorySlot::new();
        let mut view = TypedView::from_value("ids", vec![4i64; 3]);

        checkpointer.prepare_write(&mut view, &mut slot).unwrap();
        slot.clear_external();
        checkpointer.finalize_write(&mut view, &mut slot).unwrap();
        assert_eq!(view.base().phase(), CheckpointPhase::Idle);
    }

    #[test]
    fn test_register_data_ptr() {
        let registry = registry_with_vectors();
        let checkpointer = Checkpointer::with_defaults(&registry);
        let mut slot = MemorySlot::new();

        let mut coords = TypedView::from_value("coords", vec![[1.0f64, 2.0, 3.0]; 2]);
        coords.base_mut().set_persist(false);
        checkpointer.register_data_ptr(&mut coords, &mut slot).unwrap();
        assert_eq!(
            slot.registered_layout(),
            Some(ExternalLayout::Typed {
                code: StoreType::Float64,
                shape: Shape::from_extents(&[2, 3]).unwrap(),
            })
        );
        assert_eq!(coords.base().phase(), CheckpointPhase::Idle);
        unsafe { slot.commit() };
        assert_eq!(slot.image().len(), 48);

        // unmapped values leave the registration alone
        let mut label = TypedView::from_value("label", String::from("inlet"));
        checkpointer.register_data_ptr(&mut label, &mut slot).unwrap();
        assert!(slot.is_external());
        assert_eq!(slot.total_bytes(), 48);

        let mut empty = TypedView::<Vec<f64>>::new("empty");
        checkpointer.register_data_ptr(&mut empty, &mut slot).unwrap();
        assert!(!slot.is_external());
    }

    #[test]
    fn test_register_data_ptr_needs_idle_view() {
        let registry = TypeRegistry::new();
        let checkpointer = Checkpointer::with_defaults(&registry);
        let mut slot = MemorySlot::new();
        let mut view = TypedView::from_value("ids", vec![1u16, 2]);

        checkpointer.prepare_write(&mut view, &mut slot).unwrap();
        let err = checkpointer
            .register_data_ptr(&mut view, &mut slot)
            .unwrap_err();
        assert!(matches!(
            err,
            ViewError::OutOfOrder {
                phase: "writing",
                operation: "register data",
                ..
            }
        ));
        checkpointer.finalize_write(&mut view, &mut slot).unwrap();
    }

    #[test]
    fn test_sub_element_width() {
        assert_eq!(sub_element_width(8, 8), None);
        assert_eq!(sub_element_width(24, 8), Some(3));
        assert_eq!(sub_element_width(4, 0), None);
    }
}
