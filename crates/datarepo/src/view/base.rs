// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-independent view state.

use std::fmt;

/// Checkpoint cycle a view is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckpointPhase {
    #[default]
    Idle,
    /// Between `prepare_write` and `finalize_write`.
    Writing,
    /// Between `prepare_read` and `finalize_read`.
    Reading,
}

impl CheckpointPhase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Writing => "writing",
            Self::Reading => "reading",
        }
    }
}

impl fmt::Display for CheckpointPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name, flags and checkpoint state shared by every view.
pub struct ViewBase {
    name: String,
    persist: bool,
    sized_from_parent: bool,
    phase: CheckpointPhase,
    /// A buffer was registered with the slot during the open cycle.
    attached: bool,
    /// Packed bytes lent to the slot by the opaque path.
    scratch: Option<Box<[u8]>>,
}

impl ViewBase {
    /// Persisted, not sized from parent, idle.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persist: true,
            sized_from_parent: false,
            phase: CheckpointPhase::Idle,
            attached: false,
            scratch: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the value is written to the store at all.
    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn set_persist(&mut self, persist: bool) {
        self.persist = persist;
    }

    pub fn sized_from_parent(&self) -> bool {
        self.sized_from_parent
    }

    pub fn set_sized_from_parent(&mut self, sized: bool) {
        self.sized_from_parent = sized;
    }

    pub fn phase(&self) -> CheckpointPhase {
        self.phase
    }

    /// Copy of the flags for a new view. The checkpoint state starts idle.
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            name: self.name.clone(),
            persist: self.persist,
            sized_from_parent: self.sized_from_parent,
            ..Self::new(String::new())
        }
    }

    pub(crate) fn begin(&mut self, phase: CheckpointPhase) {
        self.phase = phase;
        self.attached = false;
        self.scratch = None;
    }

    /// Back to idle, releasing any buffer still lent to the slot.
    pub(crate) fn end(&mut self) -> Option<Box<[u8]>> {
        self.phase = CheckpointPhase::Idle;
        self.attached = false;
        self.scratch.take()
    }

    pub(crate) fn attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn mark_attached(&mut self) {
        self.attached = true;
    }

    /// Keep `buffer` alive until the cycle ends and return its start.
    pub(crate) fn lend_scratch(&mut self, buffer: Box<[u8]>) -> *mut u8 {
        let scratch = self.scratch.insert(buffer);
        scratch.as_mut_ptr()
    }
}

impl fmt::Debug for ViewBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBase")
            .field("name", &self.name)
            .field("persist", &self.persist)
            .field("sized_from_parent", &self.sized_from_parent)
            .field("phase", &self.phase)
            .field("scratch_len", &self.scratch.as_ref().map(|s| s.len()))
            .finish()
    }
}
