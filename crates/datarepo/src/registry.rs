// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type identity -> external store type code.
//!
//! The checkpoint protocol asks the registry whether a view's element type has
//! a direct store representation ([`TypeClass::Mapped`]) or must be packed into
//! an opaque byte blob ([`TypeClass::Unmapped`]).
//!
//! Every plain primitive is registered up front. Aggregates of one primitive
//! (e.g. `[f64; 3]`) can be registered onto that primitive's store type; the
//! checkpoint then records the aggregate width as a trailing dimension.

use crate::error::{Result, ViewError};
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::mem::size_of;
use std::sync::OnceLock;

/// Primitive type codes understood by the external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl StoreType {
    /// Size in bytes of one store element.
    pub fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Marker for types whose every bit pattern is a valid value.
///
/// # Safety
///
/// Implementors must be `Copy`, contain no padding, pointers or niches, so
/// that a restore may overwrite their bytes with arbitrary store contents.
pub unsafe trait PlainData: Copy + 'static {}

macro_rules! impl_plain_data {
    ($($t:ty),* $(,)?) => {
        $(unsafe impl PlainData for $t {})*
    };
}

impl_plain_data!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize, f32, f64);

unsafe impl<T: PlainData, const N: usize> PlainData for [T; N] {}

/// Classification result for one element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// Stored natively as `code`, one store element being `native_size` bytes.
    Mapped { code: StoreType, native_size: usize },
    /// No store type code; persisted through the opaque pack path.
    Unmapped,
}

impl TypeClass {
    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Mapping {
    code: StoreType,
    type_name: &'static str,
}

/// Type identity registry.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<TypeId, Mapping>,
}

static GLOBAL_REGISTRY: OnceLock<RwLock<TypeRegistry>> = OnceLock::new();

impl TypeRegistry {
    /// Registry with no mappings at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Registry holding every plain primitive.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.insert::<i8>(StoreType::Int8);
        registry.insert::<i16>(StoreType::Int16);
        registry.insert::<i32>(StoreType::Int32);
        registry.insert::<i64>(StoreType::Int64);
        registry.insert::<u8>(StoreType::UInt8);
        registry.insert::<u16>(StoreType::UInt16);
        registry.insert::<u32>(StoreType::UInt32);
        registry.insert::<u64>(StoreType::UInt64);
        registry.insert::<f32>(StoreType::Float32);
        registry.insert::<f64>(StoreType::Float64);
        if size_of::<usize>() == 8 {
            registry.insert::<isize>(StoreType::Int64);
            registry.insert::<usize>(StoreType::UInt64);
        } else {
            registry.insert::<isize>(StoreType::Int32);
            registry.insert::<usize>(StoreType::UInt32);
        }
        registry
    }

    /// Process-wide registry, created on first use.
    pub fn global() -> &'static RwLock<TypeRegistry> {
        GLOBAL_REGISTRY.get_or_init(|| RwLock::new(TypeRegistry::new()))
    }

    fn insert<T: PlainData>(&mut self, code: StoreType) {
        self.types.insert(
            TypeId::of::<T>(),
            Mapping {
                code,
                type_name: type_name::<T>(),
            },
        );
    }

    /// Map `T` onto `code`. `T` must be a whole number of `code` elements.
    pub fn register<T: PlainData>(&mut self, code: StoreType) -> Result<()> {
        let size = size_of::<T>();
        if size == 0 || size % code.size() != 0 {
            return Err(ViewError::IncompatibleRegistration {
                type_name: type_name::<T>(),
                size,
                code: code.name(),
            });
        }
        log::debug!(
            "[registry] {} -> {} ({} per element)",
            type_name::<T>(),
            code,
            size / code.size()
        );
        self.insert::<T>(code);
        Ok(())
    }

    /// Remove a mapping; later checkpoints of `T` take the opaque path.
    pub fn unregister<T: 'static>(&mut self) -> bool {
        self.types.remove(&TypeId::of::<T>()).is_some()
    }

    /// Classify a runtime type identity.
    pub fn classify(&self, id: TypeId) -> TypeClass {
        match self.types.get(&id) {
            Some(mapping) => TypeClass::Mapped {
                code: mapping.code,
                native_size: mapping.code.size(),
            },
            None => TypeClass::Unmapped,
        }
    }

    /// Name of the registered type for `id`, if any.
    pub fn type_name_of(&self, id: TypeId) -> Option<&'static str> {
        self.types.get(&id).map(|m| m.type_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
