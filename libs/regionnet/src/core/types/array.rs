// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Typed contiguous buffers.

use std::sync::Arc;

use parking_lot::RwLock;

use super::element_type::{Element, ElementType};
use crate::core::{NetworkError, Result};

/// Backing storage of an [`Array`], one variant per [`ElementType`].
#[doc(hidden)]
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayStorage {
    Byte(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Real32(Vec<f32>),
    Real64(Vec<f64>),
    Bool(Vec<bool>),
}

macro_rules! for_each_storage {
    ($storage:expr, $values:ident => $body:expr) => {
        match $storage {
            ArrayStorage::Byte($values) => $body,
            ArrayStorage::Int16($values) => $body,
            ArrayStorage::UInt16($values) => $body,
            ArrayStorage::Int32($values) => $body,
            ArrayStorage::UInt32($values) => $body,
            ArrayStorage::Int64($values) => $body,
            ArrayStorage::UInt64($values) => $body,
            ArrayStorage::Real32($values) => $body,
            ArrayStorage::Real64($values) => $body,
            ArrayStorage::Bool($values) => $body,
        }
    };
}

macro_rules! copy_matching {
    ($dst:expr, $src:expr, $offset:expr, [$($variant:ident),*]) => {
        match ($dst, $src) {
            $(
                (ArrayStorage::$variant(dst), ArrayStorage::$variant(src)) => {
                    dst[$offset..$offset + src.len()].copy_from_slice(src);
                }
            )*
            _ => {}
        }
    };
}

impl ArrayStorage {
    fn zeroed(element_type: ElementType, count: usize) -> Self {
        match element_type {
            ElementType::Byte => ArrayStorage::Byte(vec![0; count]),
            ElementType::Int16 => ArrayStorage::Int16(vec![0; count]),
            ElementType::UInt16 => ArrayStorage::UInt16(vec![0; count]),
            ElementType::Int32 => ArrayStorage::Int32(vec![0; count]),
            ElementType::UInt32 => ArrayStorage::UInt32(vec![0; count]),
            ElementType::Int64 => ArrayStorage::Int64(vec![0; count]),
            ElementType::UInt64 => ArrayStorage::UInt64(vec![0; count]),
            ElementType::Real32 => ArrayStorage::Real32(vec![0.0; count]),
            ElementType::Real64 => ArrayStorage::Real64(vec![0.0; count]),
            ElementType::Bool => ArrayStorage::Bool(vec![false; count]),
        }
    }

    fn element_type(&self) -> ElementType {
        match self {
            ArrayStorage::Byte(_) => ElementType::Byte,
            ArrayStorage::Int16(_) => ElementType::Int16,
            ArrayStorage::UInt16(_) => ElementType::UInt16,
            ArrayStorage::Int32(_) => ElementType::Int32,
            ArrayStorage::UInt32(_) => ElementType::UInt32,
            ArrayStorage::Int64(_) => ElementType::Int64,
            ArrayStorage::UInt64(_) => ElementType::UInt64,
            ArrayStorage::Real32(_) => ElementType::Real32,
            ArrayStorage::Real64(_) => ElementType::Real64,
            ArrayStorage::Bool(_) => ElementType::Bool,
        }
    }

    fn len(&self) -> usize {
        for_each_storage!(self, values => values.len())
    }
}

/// A contiguous buffer of elements of a single [`ElementType`].
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    storage: ArrayStorage,
}

/// Buffer owned by an output and aliased by zero-copy inputs.
pub type SharedArray = Arc<RwLock<Array>>;

impl Array {
    /// Create an empty array.
    pub fn new(element_type: ElementType) -> Self {
        Self::zeroed(element_type, 0)
    }

    /// Allocate `count` zero-valued elements.
    pub fn zeroed(element_type: ElementType, count: usize) -> Self {
        Self {
            storage: ArrayStorage::zeroed(element_type, count),
        }
    }

    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        Self {
            storage: T::into_storage(values),
        }
    }

    pub fn into_shared(self) -> SharedArray {
        Arc::new(RwLock::new(self))
    }

    pub fn element_type(&self) -> ElementType {
        self.storage.element_type()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed view, `None` if `T` is not this array's element type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.storage)
    }

    pub fn as_mut_slice<T: Element>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(&mut self.storage)
    }

    /// Address of the first element, for aliasing checks.
    pub fn as_ptr(&self) -> *const u8 {
        for_each_storage!(&self.storage, values => values.as_ptr() as *const u8)
    }

    /// Copy all of `src` into this array starting at element `offset`.
    pub fn copy_from(&mut self, src: &Array, offset: usize) -> Result<()> {
        if src.element_type() != self.element_type() {
            return Err(NetworkError::TypeMismatch {
                context: "array copy".into(),
                expected: self.element_type(),
                found: src.element_type(),
            });
        }
        let end = offset + src.len();
        if end > self.len() {
            return Err(NetworkError::InvalidState(format!(
                "copy of {} elements at offset {} overruns buffer of {}",
                src.len(),
                offset,
                self.len()
            )));
        }
        copy_matching!(
            &mut self.storage,
            &src.storage,
            offset,
            [Byte, Int16, UInt16, Int32, UInt32, Int64, UInt64, Real32, Real64, Bool]
        );
        Ok(())
    }

    /// Replace the contents starting at `offset` with `values`.
    pub fn write<T: Element>(&mut self, offset: usize, values: &[T]) -> Result<()> {
        let element_type = self.element_type();
        let len = self.len();
        let dst = self
            .as_mut_slice::<T>()
            .ok_or_else(|| NetworkError::TypeMismatch {
                context: "array write".into(),
                expected: element_type,
                found: T::ELEMENT_TYPE,
            })?;
        let end = offset + values.len();
        if end > len {
            return Err(NetworkError::InvalidState(format!(
                "write of {} elements at offset {} overruns buffer of {}",
                values.len(),
                offset,
                len
            )));
        }
        dst[offset..end].copy_from_slice(values);
        Ok(())
    }

    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        self.as_slice::<T>().map(<[T]>::to_vec)
    }

    /// Replace `out` with the elements at `offsets`, in order.
    ///
    /// `out` is left untouched on error.
    pub fn gather_into<T: Element>(&self, offsets: &[usize], out: &mut Vec<T>) -> Result<()> {
        let values = self
            .as_slice::<T>()
            .ok_or_else(|| NetworkError::TypeMismatch {
                context: "array gather".into(),
                expected: self.element_type(),
                found: T::ELEMENT_TYPE,
            })?;
        if let Some(&offset) = offsets.iter().find(|&&offset| offset >= values.len()) {
            return Err(NetworkError::InvalidState(format!(
                "gather offset {} beyond buffer of {}",
                offset,
                values.len()
            )));
        }
        out.clear();
        out.extend(offsets.iter().map(|&offset| values[offset]));
        Ok(())
    }
}
