// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Scalar element types carried by region ports.

use serde::{Deserialize, Serialize};

use super::array::ArrayStorage;

/// Element type of every value in a port buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Real32,
    Real64,
    Bool,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            ElementType::Byte | ElementType::Bool => 1,
            ElementType::Int16 | ElementType::UInt16 => 2,
            ElementType::Int32 | ElementType::UInt32 | ElementType::Real32 => 4,
            ElementType::Int64 | ElementType::UInt64 | ElementType::Real64 => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Byte => "Byte",
            ElementType::Int16 => "Int16",
            ElementType::UInt16 => "UInt16",
            ElementType::Int32 => "Int32",
            ElementType::UInt32 => "UInt32",
            ElementType::Int64 => "Int64",
            ElementType::UInt64 => "UInt64",
            ElementType::Real32 => "Real32",
            ElementType::Real64 => "Real64",
            ElementType::Bool => "Bool",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub mod sealed {
    pub trait Sealed {}
}

/// Rust scalar that can live in an [`Array`](super::Array).
///
/// Sealed: the set of element types is closed.
pub trait Element:
    Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static + sealed::Sealed
{
    const ELEMENT_TYPE: ElementType;

    #[doc(hidden)]
    fn slice(storage: &ArrayStorage) -> Option<&[Self]>;

    #[doc(hidden)]
    fn slice_mut(storage: &mut ArrayStorage) -> Option<&mut [Self]>;

    #[doc(hidden)]
    fn into_storage(values: Vec<Self>) -> ArrayStorage;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;

                fn slice(storage: &ArrayStorage) -> Option<&[Self]> {
                    match storage {
                        ArrayStorage::$variant(values) => Some(values.as_slice()),
                        _ => None,
                    }
                }

                fn slice_mut(storage: &mut ArrayStorage) -> Option<&mut [Self]> {
                    match storage {
                        ArrayStorage::$variant(values) => Some(values.as_mut_slice()),
                        _ => None,
                    }
                }

                fn into_storage(values: Vec<Self>) -> ArrayStorage {
                    ArrayStorage::$variant(values)
                }
            }
        )*
    };
}

impl_element! {
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Real32,
    f64 => Real64,
    bool => Bool,
}
