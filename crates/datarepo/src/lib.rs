// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-erased views and checkpointing for a hierarchical data repository.
//!
//! Any value type can be stored under a named, non-generic handle and
//! written to / restored from an external store, without a bespoke
//! serialization interface per type.
//!
//! # Features
//!
//! - **Capability detection** -- [`ViewValue`] defaults give every type a
//!   scalar fallback; containers override what they support
//! - **Type erasure** -- [`TypedView<T>`] behind the [`ErasedView`] trait, with
//!   a checked cast back to `T`
//! - **Zero-copy checkpoint** -- element types known to the [`TypeRegistry`]
//!   are handed to the store as their own buffer, with shape
//! - **Opaque fallback** -- everything else goes through [`Pack`]
//!
//! # Architecture
//!
//! ```text
//! repository tree
//! +-- dyn ErasedView        (name, persist, SizedFromParent, phase)
//!     +-- TypedView<T>      (owned or borrowed T: ViewValue + Pack)
//! Checkpointer
//! +-- TypeRegistry          (TypeId -> StoreType)
//! +-- StoreSlot             (external store resource, e.g. MemorySlot)
//! ```

pub mod capability;
pub mod checkpoint;
pub mod config;
pub mod containers;
pub mod error;
pub mod pack;
pub mod registry;
pub mod shape;
pub mod view;

pub use capability::{RankMismatch, ViewValue};
pub use checkpoint::{Checkpointer, ExternalLayout, MemorySlot, MemoryStore, StoreSlot};
pub use config::{CheckpointConfig, CheckpointConfigBuilder, SIZED_FROM_PARENT_ATTRIBUTE};
pub use containers::{MultiArray, SortedArray};
pub use error::{Result, ViewError};
pub use pack::{Pack, PackError};
pub use registry::{PlainData, StoreType, TypeClass, TypeRegistry};
pub use shape::{Index, Shape, MAX_RANK};
pub use view::{CheckpointPhase, ErasedView, TypedView, ViewBase};
