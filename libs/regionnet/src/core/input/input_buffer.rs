// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLockReadGuard;

use crate::core::types::{Array, SharedArray};

/// Storage behind an initialized input.
///
/// `Owned` holds the aggregate of several links. `Aliased` is the zero-copy
/// path: the single link's output buffer, read but never written here.
#[derive(Debug)]
pub(crate) enum InputBuffer {
    Owned(Array),
    Aliased(SharedArray),
}

impl InputBuffer {
    pub(crate) fn read(&self) -> InputData<'_> {
        match self {
            InputBuffer::Owned(array) => InputData::Owned(array),
            InputBuffer::Aliased(shared) => InputData::Aliased(shared.read()),
        }
    }

    pub(crate) fn is_aliased(&self) -> bool {
        matches!(self, InputBuffer::Aliased(_))
    }

    pub(crate) fn aliases(&self, shared: &SharedArray) -> bool {
        match self {
            InputBuffer::Aliased(alias) => Arc::ptr_eq(alias, shared),
            InputBuffer::Owned(_) => false,
        }
    }
}

/// Read access to an input's data, uniform over owned and aliased buffers.
pub enum InputData<'a> {
    Owned(&'a Array),
    Aliased(RwLockReadGuard<'a, Array>),
}

impl Deref for InputData<'_> {
    type Target = Array;

    fn deref(&self) -> &Array {
        match self {
            InputData::Owned(array) => *array,
            InputData::Aliased(guard) => &**guard,
        }
    }
}
