// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

mod array;
mod element_type;

pub use array::{Array, ArrayStorage, SharedArray};
pub use element_type::{sealed, Element, ElementType};
