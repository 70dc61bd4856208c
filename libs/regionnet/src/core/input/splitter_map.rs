// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Splitter maps: which offsets of an input buffer belong to which node.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::dimensions::Dimensions;
use crate::core::links::Link;
use crate::core::{NetworkError, Result};

/// For every node of a region, the ordered input-buffer offsets it consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitterMap(Vec<Vec<usize>>);

impl SplitterMap {
    pub fn new(nodes: Vec<Vec<usize>>) -> Self {
        Self(nodes)
    }

    /// A map with `node_count` empty nodes.
    pub fn with_nodes(node_count: usize) -> Self {
        Self(vec![Vec::new(); node_count])
    }

    /// One node owning the whole buffer.
    pub fn single_node(total_size: usize) -> Self {
        Self(vec![(0..total_size).collect()])
    }

    pub fn node_count(&self) -> usize {
        self.0.len()
    }

    pub fn offsets(&self, node: usize) -> Option<&[usize]> {
        self.0.get(node).map(Vec::as_slice)
    }

    /// Append offsets to `node`. Out-of-range nodes are ignored.
    pub fn extend_node(&mut self, node: usize, offsets: impl IntoIterator<Item = usize>) {
        if let Some(entry) = self.0.get_mut(node) {
            entry.extend(offsets);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.0.iter().map(Vec::as_slice)
    }

    pub fn into_inner(self) -> Vec<Vec<usize>> {
        self.0
    }

    pub(crate) fn validate(&self, total_size: usize) -> Result<()> {
        for (node, offsets) in self.0.iter().enumerate() {
            if let Some(&offset) = offsets.iter().find(|&&offset| offset >= total_size) {
                return Err(NetworkError::InvalidState(format!(
                    "splitter map gives node {} offset {} beyond buffer of {}",
                    node, offset, total_size
                )));
            }
        }
        Ok(())
    }
}

/// One link's slice of an input buffer.
#[derive(Debug, Clone, Copy)]
pub struct LinkSegment<'a> {
    pub link: &'a Link,
    pub offset: usize,
    pub size: usize,
}

/// Layout of an initialized input buffer, handed to [`SplitterMapBuilder`]s.
#[derive(Debug, Clone, Copy)]
pub struct BufferLayout<'a> {
    pub(crate) total_size: usize,
    pub(crate) links: &'a [Link],
    pub(crate) offsets: &'a [usize],
    pub(crate) sizes: &'a [usize],
    pub(crate) dest_dimensions: &'a Dimensions,
}

impl<'a> BufferLayout<'a> {
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Dimensions of the region owning the input.
    pub fn dest_dimensions(&self) -> &'a Dimensions {
        self.dest_dimensions
    }

    /// Link segments in attachment order.
    pub fn segments(&self) -> impl Iterator<Item = LinkSegment<'a>> + 'a {
        let (links, offsets, sizes) = (self.links, self.offsets, self.sizes);
        links
            .iter()
            .zip(offsets)
            .zip(sizes)
            .map(|((link, &offset), &size)| LinkSegment { link, offset, size })
    }
}

/// Partition policy a region applies to its per-node inputs.
pub trait SplitterMapBuilder: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn build(&self, layout: &BufferLayout<'_>, node_count: usize) -> Result<SplitterMap>;
}

/// Contiguous, nearly equal chunks. The first `total % nodes` nodes get one
/// extra element.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvenSplit;

impl SplitterMapBuilder for EvenSplit {
    fn name(&self) -> &str {
        "even"
    }

    fn build(&self, layout: &BufferLayout<'_>, node_count: usize) -> Result<SplitterMap> {
        if node_count == 0 {
            return Err(NetworkError::InvalidState(
                "cannot split an input across zero nodes".into(),
            ));
        }
        let base = layout.total_size / node_count;
        let remainder = layout.total_size % node_count;

        let mut start = 0;
        let nodes = (0..node_count)
            .map(|node| {
                let len = base + usize::from(node < remainder);
                let offsets = (start..start + len).collect();
                start += len;
                offsets
            })
            .collect();
        Ok(SplitterMap::new(nodes))
    }
}

/// Each link's policy decides which of its elements reach which node.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkTopologySplit;

impl SplitterMapBuilder for LinkTopologySplit {
    fn name(&self) -> &str {
        "links"
    }

    fn build(&self, layout: &BufferLayout<'_>, node_count: usize) -> Result<SplitterMap> {
        let mut map = SplitterMap::with_nodes(node_count);
        for segment in layout.segments() {
            segment
                .link
                .build_splitter_map(&mut map, layout.dest_dimensions())?;
        }
        Ok(map)
    }
}

/// Built-in partition policies, selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    Even,
    #[default]
    Links,
}

impl SplitPolicy {
    pub fn builder(&self) -> Arc<dyn SplitterMapBuilder> {
        match self {
            SplitPolicy::Even => Arc::new(EvenSplit),
            SplitPolicy::Links => Arc::new(LinkTopologySplit),
        }
    }
}
