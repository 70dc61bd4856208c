// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The downstream side of links: per-port aggregation and node splitting.

#[allow(clippy::module_inception)]
mod input;
mod input_buffer;
mod splitter_map;

pub use input::Input;
pub use input_buffer::InputData;
pub use splitter_map::{
    BufferLayout, EvenSplit, LinkSegment, LinkTopologySplit, SplitPolicy, SplitterMap,
    SplitterMapBuilder,
};
