// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Link - a typed connection from one output to one input.

use std::fmt;

use super::link_id::LinkId;
use super::policy::{create_link_policy, LinkPolicy};
use super::port_address::PortAddress;
use crate::core::dimensions::Dimensions;
use crate::core::input::SplitterMap;
use crate::core::output::{Output, OutputRef};
use crate::core::region::RegionRef;
use crate::core::types::{ElementType, SharedArray};
use crate::core::{NetworkError, Result};

/// Connection from a source output to a destination input.
///
/// The link is owned by the destination [`Input`](crate::core::Input). The
/// source output only records the link's ID, and the link reaches back to the
/// output through a weak reference.
#[derive(Debug)]
pub struct Link {
    id: LinkId,
    link_type: String,
    link_params: String,
    policy: Box<dyn LinkPolicy>,
    src: OutputRef,
    src_address: PortAddress,
    dest_address: PortAddress,
    src_dims: Dimensions,
    dest_dims: Dimensions,
    dest_offset: Option<usize>,
}

impl Link {
    pub(crate) fn new(
        link_type: &str,
        link_params: &str,
        src_output: &Output,
        dest_address: PortAddress,
    ) -> Result<Self> {
        let policy = create_link_policy(link_type, link_params)?;
        let src_address = PortAddress::new(src_output.region_name()?, src_output.name());
        let id = LinkId::between(&src_address, &dest_address)
            .map_err(|e| NetworkError::InvalidAddress(e.to_string()))?;

        Ok(Self {
            id,
            link_type: link_type.to_string(),
            link_params: link_params.to_string(),
            policy,
            src: src_output.downgrade(),
            src_address,
            dest_address,
            src_dims: Dimensions::unspecified(),
            dest_dims: Dimensions::unspecified(),
            dest_offset: None,
        })
    }

    pub fn id(&self) -> &LinkId {
        &self.id
    }

    pub fn link_type(&self) -> &str {
        &self.link_type
    }

    pub fn link_params(&self) -> &str {
        &self.link_params
    }

    pub fn policy(&self) -> &dyn LinkPolicy {
        self.policy.as_ref()
    }

    pub fn src_region_name(&self) -> &str {
        &self.src_address.region
    }

    pub fn src_output_name(&self) -> &str {
        &self.src_address.port
    }

    pub fn dest_region_name(&self) -> &str {
        &self.dest_address.region
    }

    pub fn dest_input_name(&self) -> &str {
        &self.dest_address.port
    }

    pub fn src_dimensions(&self) -> &Dimensions {
        &self.src_dims
    }

    /// Destination-side dimensions as last negotiated.
    pub fn destination_dimensions(&self) -> &Dimensions {
        &self.dest_dims
    }

    /// Offset of this link's data within the destination buffer, once initialized.
    pub fn dest_offset(&self) -> Option<usize> {
        self.dest_offset
    }

    pub fn is_initialized(&self) -> bool {
        self.dest_offset.is_some()
    }

    /// The source output, if it still exists.
    pub fn src_output(&self) -> Option<Output> {
        self.src.upgrade()
    }

    fn output(&self) -> Result<Output> {
        self.src.upgrade().ok_or_else(|| {
            NetworkError::InvalidState(format!("source output of link {} has been removed", self.id))
        })
    }

    pub(crate) fn src_region(&self) -> Result<RegionRef> {
        Ok(self.output()?.region().clone())
    }

    /// Source dimensions this link should adopt, pulled from the source region.
    ///
    /// Does not modify the link. Returns the link's current source dimensions
    /// when the region has none, and fails if the two disagree.
    pub fn negotiate_source_dimension(&self) -> Result<Dimensions> {
        let region_dims = self.output()?.dimensions()?;
        if region_dims.is_unspecified() {
            return Ok(self.src_dims.clone());
        }
        if !self.src_dims.is_unspecified() && !self.src_dims.is_equivalent(&region_dims) {
            return Err(NetworkError::DimensionMismatch(format!(
                "link {} has source dimensions {} but region '{}' has {}",
                self.id,
                self.src_dims,
                self.src_region_name(),
                region_dims
            )));
        }
        Ok(region_dims)
    }

    pub fn element_type(&self) -> Result<ElementType> {
        Ok(self.output()?.element_type())
    }

    /// Number of elements the source output currently holds.
    pub fn buffer_size(&self) -> Result<usize> {
        let output = self.output()?;
        if !output.is_initialized() {
            return Err(NetworkError::InvalidState(format!(
                "source output of link {} is not initialized",
                self.id
            )));
        }
        Ok(output.len())
    }

    /// The source output's buffer.
    pub fn buffer(&self) -> Result<SharedArray> {
        Ok(self.output()?.data())
    }

    pub(crate) fn set_dimensions(&mut self, src: Dimensions, dest: Dimensions) {
        if self.src_dims != src || self.dest_dims != dest {
            tracing::debug!("[{}] Dimensions {} -> {}", self.id, src, dest);
        }
        self.src_dims = src;
        self.dest_dims = dest;
    }

    pub(crate) fn initialize(&mut self, dest_offset: usize) {
        self.dest_offset = Some(dest_offset);
    }

    pub(crate) fn uninitialize(&mut self) {
        self.dest_offset = None;
    }

    /// Add this link's contribution to a splitter map whose nodes are the
    /// destination region's nodes laid out as `dest`.
    pub fn build_splitter_map(&self, map: &mut SplitterMap, dest: &Dimensions) -> Result<()> {
        let offset = self.dest_offset.ok_or_else(|| {
            NetworkError::InvalidState(format!(
                "splitter map requested for uninitialized link {}",
                self.id
            ))
        })?;
        let output = self.output()?;

        if output.is_region_level() {
            let size = output.len();
            for node in 0..map.node_count() {
                map.extend_node(node, offset..offset + size);
            }
            return Ok(());
        }

        if !self.src_dims.is_specified() {
            return Err(NetworkError::InvalidState(format!(
                "link {} has unresolved source dimensions {}",
                self.id, self.src_dims
            )));
        }

        let mut proto = vec![Vec::new(); map.node_count()];
        self.policy.build_proto_splitter_map(
            &self.src_dims,
            dest,
            output.node_element_count(),
            &mut proto,
        )?;
        for (node, elements) in proto.into_iter().enumerate() {
            map.extend_node(node, elements.into_iter().map(|element| element + offset));
        }
        Ok(())
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.id, self.link_type)
    }
}
