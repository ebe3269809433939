// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Repository containers with native view capabilities.

mod multi;
mod sorted;

pub use multi::MultiArray;
pub use sorted::SortedArray;
