// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed and type-erased views.
//!
//! A [`TypedView<T>`] wraps exactly one value; the rest of the repository
//! handles it as a `dyn ErasedView` and casts back when it needs `T`.

mod base;
mod erased;
mod typed;

pub use base::{CheckpointPhase, ViewBase};
pub use erased::ErasedView;
pub use typed::TypedView;
