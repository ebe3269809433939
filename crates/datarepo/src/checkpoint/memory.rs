// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory store slots.
//!
//! Stands in for a real persistent store: [`MemorySlot::commit`] plays the
//! part of the store writing a registered buffer out, and
//! [`MemorySlot::fill`] the part of it reading data back into one.

use super::slot::{ExternalLayout, StoreSlot};
use crate::shape::Shape;
use std::collections::{BTreeMap, HashMap};
use std::ptr;

#[derive(Debug, Clone, Copy)]
struct Attribute {
    value: bool,
    default: bool,
    saved: bool,
}

/// Slot keeping its persisted image in memory.
#[derive(Debug, Default)]
pub struct MemorySlot {
    image: Vec<u8>,
    recorded: Option<ExternalLayout>,
    external: Option<(ExternalLayout, *mut u8)>,
    attributes: HashMap<String, Attribute>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a boolean attribute holding `default`.
    pub fn declare_attribute(&mut self, name: impl Into<String>, default: bool) {
        self.attributes.insert(
            name.into(),
            Attribute {
                value: default,
                default,
                saved: default,
            },
        );
    }

    /// Persisted bytes.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Layout the persisted bytes were written with.
    pub fn recorded_layout(&self) -> Option<ExternalLayout> {
        self.recorded
    }

    /// Layout of the currently registered buffer.
    pub fn registered_layout(&self) -> Option<ExternalLayout> {
        self.external.map(|(layout, _)| layout)
    }

    /// Copy the registered buffer and the attribute values into the
    /// persisted image.
    ///
    /// With nothing registered the data image is emptied.
    ///
    /// # Safety
    ///
    /// The registered pointer must still be valid for reads of the
    /// registered layout's byte length.
    pub unsafe fn commit(&mut self) {
        for attribute in self.attributes.values_mut() {
            attribute.saved = attribute.value;
        }
        let registered = self
            .external
            .and_then(|(layout, ptr)| Some((layout, ptr, layout.byte_len()?)));
        match registered {
            Some((layout, ptr, len)) if !ptr.is_null() && len > 0 => {
                // SAFETY: upheld by the caller.
                let bytes = unsafe { std::slice::from_raw_parts(ptr, len) };
                self.image = bytes.to_vec();
                self.recorded = Some(layout);
            }
            _ => {
                self.image.clear();
                self.recorded = None;
            }
        }
    }

    /// Copy the persisted image into the registered buffer and return the
    /// number of bytes copied. Never writes past the registered layout.
    ///
    /// # Safety
    ///
    /// The registered pointer must still be valid for writes of the
    /// registered layout's byte length.
    pub unsafe fn fill(&self) -> usize {
        let Some((layout, dst)) = self.external else {
            return 0;
        };
        if dst.is_null() {
            return 0;
        }
        let len = self.image.len().min(layout.byte_len().unwrap_or(0));
        // SAFETY: `len` is within both buffers; validity of `dst` is upheld
        // by the caller and the image is owned by the slot.
        unsafe { ptr::copy_nonoverlapping(self.image.as_ptr(), dst, len) };
        len
    }

    /// Make the committed attribute values current again, as a store does
    /// when it opens a checkpoint for reading.
    pub fn reload_attributes(&mut self) {
        for attribute in self.attributes.values_mut() {
            attribute.value = attribute.saved;
        }
    }

    /// Drop the persisted image.
    pub fn clear(&mut self) {
        self.image.clear();
        self.recorded = None;
    }
}

impl StoreSlot for MemorySlot {
    fn set_external(&mut self, layout: ExternalLayout, ptr: *mut u8) {
        self.external = Some((layout, ptr));
    }

    fn clear_external(&mut self) {
        self.external = None;
    }

    fn is_external(&self) -> bool {
        self.external.is_some()
    }

    fn total_bytes(&self) -> usize {
        match self.external {
            Some((layout, _)) => layout.byte_len().unwrap_or(0),
            None => self.image.len(),
        }
    }

    fn shape(&self) -> Option<Shape> {
        match self.external {
            Some((layout, _)) => layout.shape(),
            None => self.recorded.and_then(|layout| layout.shape()),
        }
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    fn set_attribute(&mut self, name: &str, value: bool) {
        if let Some(attribute) = self.attributes.get_mut(name) {
            attribute.value = value;
        }
    }

    fn attribute(&self, name: &str) -> Option<bool> {
        self.attributes.get(name).map(|a| a.value)
    }

    fn reset_attribute(&mut self, name: &str) {
        if let Some(attribute) = self.attributes.get_mut(name) {
            attribute.value = attribute.default;
        }
    }
}

/// Name-keyed collection of [`MemorySlot`]s.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: BTreeMap<String, MemorySlot>,
    attributes: Vec<(String, bool)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare attribute `name` on every slot this store creates.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, default: bool) -> Self {
        self.attributes.push((name.into(), default));
        self
    }

    /// Slot for `name`, created on first use.
    pub fn slot_mut(&mut self, name: &str) -> &mut MemorySlot {
        let attributes = &self.attributes;
        self.slots.entry(name.to_string()).or_insert_with(|| {
            let mut slot = MemorySlot::new();
            for (attr, default) in attributes {
                slot.declare_attribute(attr.clone(), *default);
            }
            slot
        })
    }

    pub fn slot(&self, name: &str) -> Option<&MemorySlot> {
        self.slots.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// [`MemorySlot::reload_attributes`] on every slot.
    pub fn reload_attributes(&mut self) {
        for slot in self.slots.values_mut() {
            slot.reload_attributes();
        }
    }

    /// [`MemorySlot::commit`] every slot.
    ///
    /// # Safety
    ///
    /// Same contract as [`MemorySlot::commit`], for every slot.
    pub unsafe fn commit_all(&mut self) {
        for slot in self.slots.values_mut() {
            // SAFETY: upheld by the caller.
            unsafe { slot.commit() };
        }
    }

    /// [`MemorySlot::fill`] every slot.
    ///
    /// # Safety
    ///
    /// Same contract as [`MemorySlot::fill`], for every slot.
    pub unsafe fn fill_all(&self) {
        for slot in self.slots.values() {
            // SAFETY: upheld by the caller.
            unsafe { slot.fill() };
        }
    }
}
