// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity shape descriptor.

use std::fmt;

/// Count/extent type shared by every view operation.
pub type Index = usize;

/// Capacity of every shape buffer used by the checkpoint protocol.
///
/// `CheckpointConfig::max_rank` can lower the accepted rank but never raise
/// it above this value.
pub const MAX_RANK: usize = 10;

/// Rank plus per-dimension extents.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    rank: usize,
    extents: [Index; MAX_RANK],
}

impl Shape {
    /// Rank-0 shape.
    pub const fn empty() -> Self {
        Self {
            rank: 0,
            extents: [0; MAX_RANK],
        }
    }

    /// One-dimensional shape.
    pub const fn linear(len: Index) -> Self {
        let mut extents = [0; MAX_RANK];
        extents[0] = len;
        Self { rank: 1, extents }
    }

    /// Build from a slice, `None` if it holds more than [`MAX_RANK`] extents.
    pub fn from_extents(extents: &[Index]) -> Option<Self> {
        let mut shape = Self::empty();
        for &extent in extents {
            shape.push(extent)?;
        }
        Some(shape)
    }

    /// Append a dimension. Returns `None` when the shape is full.
    pub fn push(&mut self, extent: Index) -> Option<()> {
        if self.rank == MAX_RANK {
            return None;
        }
        self.extents[self.rank] = extent;
        self.rank += 1;
        Some(())
    }

    /// Drop the last dimension, returning its extent.
    pub fn pop(&mut self) -> Option<Index> {
        if self.rank == 0 {
            return None;
        }
        self.rank -= 1;
        let extent = self.extents[self.rank];
        self.extents[self.rank] = 0;
        Some(extent)
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn extents(&self) -> &[Index] {
        &self.extents[..self.rank]
    }

    /// Extent of dimension `dim`, `None` past the rank.
    pub fn extent(&self, dim: usize) -> Option<Index> {
        self.extents().get(dim).copied()
    }

    /// Product of all extents (1 for rank 0), `None` if it overflows.
    pub fn num_elements(&self) -> Option<Index> {
        self.extents()
            .iter()
            .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.extents()).finish()
    }
}
