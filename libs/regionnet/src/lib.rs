// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Input wiring for networks of regions.
//!
//! A [`Network`] owns named regions. Each region's [`Input`]s are fed by
//! [`Link`]s from other regions' [`Output`]s. Initializing the network
//! negotiates every region's node dimensions across its links, lays each
//! input's links out contiguously in one buffer (or aliases the source
//! buffer when there is a single link), and partitions that buffer across
//! the region's nodes with a [`SplitterMap`].

pub mod core;

pub use crate::core::logging;
pub use crate::core::{
    Array, BufferLayout, Dimensions, Element, ElementType, EvenSplit, Input, InputData,
    InputSpec, Link, LinkId, LinkPolicy, LinkSegment, LinkSpec, LinkTopologySplit, Network,
    NetworkConfig, NetworkError, Output, OutputSpec, PortAddress, Region, RegionSpec, Result,
    SharedArray, SplitPolicy, SplitterMap, SplitterMapBuilder, UniformLinkPolicy,
};
