// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for views, the type registry and the checkpoint protocol.
//!
//! Every variant is fatal for the operation that produced it: the call returns
//! before touching the wrapped value or the store slot any further. A missing
//! capability is never an error (see [`crate::capability`]).

use crate::pack::PackError;
use thiserror::Error;

/// Errors raised by views and the checkpoint protocol.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A type-erased handle was cast to the wrong concrete `TypedView<T>`.
    #[error("view '{view}': type mismatch, expected {expected}, actual {actual}")]
    TypeMismatch {
        view: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Dimension index or resize rank not supported by the wrapped type.
    #[error("view '{view}': invalid dimension {dim} for data of rank {rank}")]
    InvalidDimension {
        view: String,
        dim: usize,
        rank: usize,
    },

    /// Recorded shape disagrees with the element count implied by the stored bytes.
    #[error("view '{view}': recorded element count {recorded} != expected {expected}")]
    ShapeConsistency {
        view: String,
        recorded: usize,
        expected: usize,
    },

    /// A borrowed view was requested for a null value.
    #[error("view '{view}': cannot wrap a null value")]
    NullValue { view: String },

    /// Rank exceeds the configured shape capacity.
    #[error("view '{view}': rank {rank} exceeds maximum of {max}")]
    RankOverflow {
        view: String,
        rank: usize,
        max: usize,
    },

    /// Checkpoint phase called out of order.
    #[error("view '{view}': cannot {operation} while {phase}")]
    OutOfOrder {
        view: String,
        phase: &'static str,
        operation: &'static str,
    },

    /// Type registration whose element size is not a multiple of the store type.
    #[error("cannot map {type_name} ({size} bytes) onto store type {code}")]
    IncompatibleRegistration {
        type_name: &'static str,
        size: usize,
        code: &'static str,
    },

    /// Opaque pack/unpack failed.
    #[error("view '{view}': {source}")]
    Pack {
        view: String,
        #[source]
        source: PackError,
    },

    /// Invalid checkpoint configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ViewError {
    /// Name of the view involved, if any.
    pub fn view_name(&self) -> Option<&str> {
        match self {
            Self::TypeMismatch { view, .. }
            | Self::InvalidDimension { view, .. }
            | Self::ShapeConsistency { view, .. }
            | Self::NullValue { view }
            | Self::RankOverflow { view, .. }
            | Self::OutOfOrder { view, .. }
            | Self::Pack { view, .. } => Some(view),
            Self::IncompatibleRegistration { .. } | Self::Config(_) => None,
        }
    }
}

/// Result alias for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
