// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Input - one named input port of one region.

use std::sync::OnceLock;

use super::input_buffer::{InputBuffer, InputData};
use super::splitter_map::{BufferLayout, SplitterMap};
use crate::core::dimensions::Dimensions;
use crate::core::links::{Link, LinkId, PortAddress};
use crate::core::output::Output;
use crate::core::region::RegionRef;
use crate::core::types::{Array, Element, ElementType};
use crate::core::{NetworkError, Result};

/// Dimensions a link will adopt once a negotiation pass commits.
struct LinkPlan {
    src_dims: Dimensions,
    dest_dims: Dimensions,
    src_region_update: Option<(RegionRef, Dimensions)>,
}

/// A named input of a region, fed by one or more links.
///
/// Link order is significant: link `i` occupies
/// `[link_offsets[i], link_offsets[i] + size(i))` of the aggregated buffer.
/// With exactly one link the buffer is the link's own output buffer and
/// nothing is copied.
#[derive(Debug)]
pub struct Input {
    name: String,
    region: RegionRef,
    element_type: ElementType,
    region_level: bool,
    links: Vec<Link>,

    // Volatile state, rebuilt by initialize().
    initialized: bool,
    data: Option<InputBuffer>,
    link_offsets: Vec<usize>,
    link_sizes: Vec<usize>,
    total_size: usize,
    splitter_map: OnceLock<SplitterMap>,
}

impl Input {
    pub fn new(region: RegionRef, element_type: ElementType, region_level: bool) -> Self {
        Self {
            name: String::new(),
            region,
            element_type,
            region_level,
            links: Vec::new(),
            initialized: false,
            data: None,
            link_offsets: Vec::new(),
            link_sizes: Vec::new(),
            total_size: 0,
            splitter_map: OnceLock::new(),
        }
    }

    /// Name the input. Link IDs embed the name, so it is fixed once the
    /// input has links or has been initialized.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if self.initialized || !self.links.is_empty() {
            return Err(NetworkError::InvalidState(format!(
                "cannot rename input '{}' to '{}' after it has been wired",
                self.address(),
                name
            )));
        }
        self.name = name.to_string();
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &RegionRef {
        &self.region
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn is_region_level(&self) -> bool {
        self.region_level
    }

    /// Links in attachment order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_zero_copy(&self) -> bool {
        self.data.as_ref().is_some_and(InputBuffer::is_aliased)
    }

    /// Offset of each link's data, valid once initialized.
    pub fn link_offsets(&self) -> &[usize] {
        &self.link_offsets
    }

    /// Sum of all link sizes, valid once initialized.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    fn address(&self) -> String {
        match self.region.name() {
            Ok(region) => format!("{}.{}", region, self.name),
            Err(_) => self.name.clone(),
        }
    }

    fn check_region_not_initialized(&self, operation: &str) -> Result<()> {
        if self.region.is_initialized() {
            return Err(NetworkError::InvalidState(format!(
                "cannot {} input '{}' while its region is initialized",
                operation,
                self.address()
            )));
        }
        Ok(())
    }

    /// Create a link from `src_output` and append it to this input.
    ///
    /// The link is also registered on `src_output`.
    pub fn add_link(
        &mut self,
        link_type: &str,
        link_params: &str,
        src_output: &Output,
    ) -> Result<()> {
        self.check_region_not_initialized("add a link to")?;

        let src_region = src_output.region_name()?;
        if self.find_link(&src_region, src_output.name()).is_some() {
            return Err(NetworkError::DuplicateLink {
                input: self.address(),
                src: format!("{}.{}", src_region, src_output.name()),
            });
        }

        let dest = PortAddress::new(self.region.name()?, self.name.as_str());
        let link = Link::new(link_type, link_params, src_output, dest)?;

        if self.initialized {
            self.uninitialize()?;
        }
        src_output.register_link(link.id().clone());
        tracing::debug!("[{}] Added link {}", self.address(), link);
        self.links.push(link);
        self.splitter_map.take();
        Ok(())
    }

    /// Find the link coming from `src_region_name.src_output_name`.
    pub fn find_link(&self, src_region_name: &str, src_output_name: &str) -> Option<&Link> {
        self.links.iter().find(|link| {
            link.src_region_name() == src_region_name && link.src_output_name() == src_output_name
        })
    }

    /// Detach a link and hand it back to the caller.
    ///
    /// Fails while the owning region is initialized. The input is
    /// uninitialized and the link is unregistered from its source output.
    pub fn remove_link(&mut self, link_id: &LinkId) -> Result<Link> {
        self.check_region_not_initialized("remove a link from")?;

        let idx = self
            .links
            .iter()
            .position(|link| link.id() == link_id)
            .ok_or_else(|| NetworkError::LinkNotFound(link_id.to_string()))?;

        self.uninitialize()?;
        let mut link = self.links.remove(idx);
        link.uninitialize();
        if let Some(output) = link.src_output() {
            output.unregister_link(link.id());
        }
        tracing::debug!("[{}] Removed link {}", self.address(), link);
        Ok(link)
    }

    /// One negotiation pass over this input's links.
    ///
    /// Pulls known source dimensions into each link, then either induces the
    /// region's dimensions from the links or checks the links against them.
    /// Every link must agree; on failure nothing is modified. Returns the
    /// number of links whose dimensions are still open.
    pub fn evaluate_links(&mut self) -> Result<usize> {
        let region_dims = self.region.dimensions()?;
        let mut plans = Vec::with_capacity(self.links.len());
        let mut unresolved = 0;
        let mut induced: Option<(Dimensions, &LinkId)> = None;
        let mut src_region_updates: Vec<(RegionRef, Dimensions, &LinkId)> = Vec::new();

        for link in &self.links {
            let mut src_dims = link.negotiate_source_dimension()?;
            let src_region = link.src_region()?;
            let mut src_region_update = None;

            if src_dims.is_unspecified() {
                if self.region_level || !region_dims.is_specified() {
                    unresolved += 1;
                    plans.push(LinkPlan {
                        src_dims,
                        dest_dims: Dimensions::unspecified(),
                        src_region_update: None,
                    });
                    continue;
                }
                // The destination's layout fixes the source's.
                src_dims = link.policy().src_for_dest(&region_dims)?;
                src_region_update = Some(src_dims.clone());
            } else if src_region.dimensions()?.is_unspecified() {
                src_region_update = Some(src_dims.clone());
            }

            let dest_dims = if self.region_level {
                Dimensions::dont_care()
            } else {
                link.policy().dest_for_src(&src_dims)?
            };

            if dest_dims.is_dont_care() {
                if region_dims.is_unspecified() {
                    unresolved += 1;
                }
            } else if region_dims.is_unspecified() {
                if let Some((dims, by)) = &induced {
                    if !dims.is_equivalent(&dest_dims) {
                        return Err(NetworkError::DimensionMismatch(format!(
                            "input '{}': link {} induces {} but link {} induces {}",
                            self.address(),
                            by,
                            dims,
                            link.id(),
                            dest_dims
                        )));
                    }
                } else {
                    induced = Some((dest_dims.clone(), link.id()));
                }
            } else if !dest_dims.is_equivalent(&region_dims) {
                return Err(NetworkError::DimensionMismatch(format!(
                    "input '{}' has region dimensions {} but link {} requires {}",
                    self.address(),
                    region_dims,
                    link.id(),
                    dest_dims
                )));
            }

            if let Some(dims) = &src_region_update {
                let conflict = src_region_updates
                    .iter()
                    .find(|(region, other, _)| region.ptr_eq(&src_region) && !other.is_equivalent(dims));
                if let Some((_, other, by)) = conflict {
                    return Err(NetworkError::DimensionMismatch(format!(
                        "region '{}': link {} requires {} but link {} requires {}",
                        link.src_region_name(),
                        by,
                        other,
                        link.id(),
                        dims
                    )));
                }
                src_region_updates.push((src_region.clone(), dims.clone(), link.id()));
            }

            plans.push(LinkPlan {
                src_dims,
                dest_dims,
                src_region_update: src_region_update.map(|dims| (src_region, dims)),
            });
        }

        let induced = induced.map(|(dims, _)| dims);
        drop(src_region_updates);

        for (link, plan) in self.links.iter_mut().zip(plans) {
            let LinkPlan {
                src_dims,
                dest_dims,
                src_region_update,
            } = plan;
            if let Some((region, dims)) = src_region_update {
                region.induce_dimensions(&dims)?;
            }
            link.set_dimensions(src_dims, dest_dims);
        }
        if let Some(dims) = induced {
            self.region.induce_dimensions(&dims)?;
        }

        Ok(unresolved)
    }

    /// Compute link offsets and set up the input buffer.
    ///
    /// A single link is aliased (zero-copy); several links get a zeroed
    /// buffer of the combined size, filled by [`prepare`](Self::prepare).
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        if self.links.is_empty() {
            return Err(NetworkError::InvalidState(format!(
                "input '{}' has no links",
                self.address()
            )));
        }
        let dims = self.region.dimensions()?;
        if !dims.is_specified() {
            return Err(NetworkError::InvalidState(format!(
                "input '{}' initialized before its region's dimensions {} were resolved",
                self.address(),
                dims
            )));
        }

        let mut sizes = Vec::with_capacity(self.links.len());
        for link in &self.links {
            let found = link.element_type()?;
            if found != self.element_type {
                return Err(NetworkError::TypeMismatch {
                    context: format!("input '{}' link {}", self.address(), link.id()),
                    expected: self.element_type,
                    found,
                });
            }
            sizes.push(link.buffer_size()?);
        }

        let mut offsets = Vec::with_capacity(sizes.len());
        let mut total = 0;
        for size in &sizes {
            offsets.push(total);
            total += size;
        }

        let data = match self.links.as_slice() {
            [link] => InputBuffer::Aliased(link.buffer()?),
            _ => InputBuffer::Owned(Array::zeroed(self.element_type, total)),
        };

        for (link, &offset) in self.links.iter_mut().zip(&offsets) {
            link.initialize(offset);
        }
        let zero_copy = data.is_aliased();
        self.data = Some(data);
        self.link_offsets = offsets;
        self.link_sizes = sizes;
        self.total_size = total;
        self.splitter_map.take();
        self.initialized = true;

        tracing::info!(
            "[{}] Initialized: {} link(s), {} elements{}",
            self.address(),
            self.links.len(),
            total,
            if zero_copy { ", zero-copy" } else { "" }
        );
        Ok(())
    }

    /// Release the buffer and the splitter map. Links stay attached.
    pub fn uninitialize(&mut self) -> Result<()> {
        self.check_region_not_initialized("uninitialize")?;

        self.data = None;
        self.link_offsets.clear();
        self.link_sizes.clear();
        self.total_size = 0;
        self.splitter_map.take();
        for link in &mut self.links {
            link.uninitialize();
        }
        if self.initialized {
            tracing::debug!("[{}] Uninitialized", self.address());
        }
        self.initialized = false;
        Ok(())
    }

    /// Refresh the aggregated buffer from the links. A no-op under zero-copy.
    pub fn prepare(&mut self) -> Result<()> {
        let Some(data) = self.data.as_mut() else {
            return Err(NetworkError::InvalidState(format!(
                "input '{}' prepared before initialization",
                self.name
            )));
        };
        let InputBuffer::Owned(buffer) = data else {
            return Ok(());
        };

        let mut sources = Vec::with_capacity(self.links.len());
        for (link, &size) in self.links.iter().zip(&self.link_sizes) {
            let src = link.buffer()?;
            let len = src.read().len();
            if len != size {
                return Err(NetworkError::InvalidState(format!(
                    "link {} holds {} elements, expected {}",
                    link.id(),
                    len,
                    size
                )));
            }
            sources.push(src);
        }

        for (src, &offset) in sources.iter().zip(&self.link_offsets) {
            buffer.copy_from(&src.read(), offset)?;
        }
        Ok(())
    }

    /// The input buffer. Fails before initialization.
    pub fn get_data(&self) -> Result<InputData<'_>> {
        self.data.as_ref().map(InputBuffer::read).ok_or_else(|| {
            NetworkError::InvalidState(format!(
                "input '{}' data read before initialization",
                self.name
            ))
        })
    }

    /// The splitter map, built on first request and cached until the
    /// topology changes.
    pub fn get_splitter_map(&self) -> Result<&SplitterMap> {
        if !self.initialized {
            return Err(NetworkError::InvalidState(format!(
                "splitter map requested from uninitialized input '{}'",
                self.name
            )));
        }
        if let Some(map) = self.splitter_map.get() {
            return Ok(map);
        }
        let map = self.build_splitter_map()?;
        Ok(self.splitter_map.get_or_init(|| map))
    }

    fn build_splitter_map(&self) -> Result<SplitterMap> {
        if self.region_level {
            return Ok(SplitterMap::single_node(self.total_size));
        }

        let dims = self.region.dimensions()?;
        let splitter = self.region.splitter()?;
        let layout = BufferLayout {
            total_size: self.total_size,
            links: &self.links,
            offsets: &self.link_offsets,
            sizes: &self.link_sizes,
            dest_dimensions: &dims,
        };
        let map = splitter.build(&layout, dims.count())?;
        if map.node_count() != dims.count() {
            return Err(NetworkError::InvalidState(format!(
                "{} splitter produced {} nodes for input '{}', region has {}",
                splitter.name(),
                map.node_count(),
                self.name,
                dims.count()
            )));
        }
        map.validate(self.total_size)?;

        tracing::debug!(
            "[{}] Built {} splitter map over {} nodes",
            self.address(),
            splitter.name(),
            map.node_count()
        );
        Ok(map)
    }

    /// Copy the elements node `node_index` consumes into `input`.
    pub fn get_input_for_node<T: Element>(&self, node_index: usize, input: &mut Vec<T>) -> Result<()> {
        let map = self.get_splitter_map()?;
        let offsets = map
            .offsets(node_index)
            .ok_or_else(|| NetworkError::IndexOutOfRange {
                input: self.name.clone(),
                index: node_index,
                node_count: map.node_count(),
            })?;

        let data = self.get_data()?;
        data.gather_into(offsets, input).map_err(|e| match e {
            NetworkError::TypeMismatch { expected, found, .. } => NetworkError::TypeMismatch {
                context: format!("input '{}' node buffer", self.name),
                expected,
                found,
            },
            other => other,
        })
    }

    #[cfg(test)]
    pub(crate) fn aliases(&self, output: &Output) -> bool {
        self.data
            .as_ref()
            .is_some_and(|data| data.aliases(&output.data()))
    }
}

impl Drop for Input {
    fn drop(&mut self) {
        for link in &self.links {
            if let Some(output) = link.src_output() {
                output.unregister_link(link.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{InputSpec, OutputSpec, RegionSpec};
    use crate::core::input::SplitPolicy;
    use crate::core::links::policy::{TEST_FAN_IN_2, UNIFORM_LINK};
    use crate::core::region::Region;

    fn source(name: &str, dims: &[usize], node_elements: usize) -> Region {
        Region::new(
            &RegionSpec::new(name)
                .with_dimensions(Dimensions::new(dims.to_vec()))
                .with_output(OutputSpec::new("out", ElementType::Real32, node_elements)),
        )
        .unwrap()
    }

    fn broadcaster(name: &str, elements: usize) -> Region {
        Region::new(&RegionSpec::new(name).with_output(
            OutputSpec::new("out", ElementType::Real32, elements).region_level(),
        ))
        .unwrap()
    }

    fn sink(dims: &[usize]) -> Region {
        Region::new(
            &RegionSpec::new("level1")
                .with_dimensions(Dimensions::new(dims.to_vec()))
                .with_input(InputSpec::new("in", ElementType::Real32)),
        )
        .unwrap()
    }

    fn fill(region: &Region, values: impl Iterator<Item = f32>) {
        let output = region.output("out").unwrap();
        output.initialize().unwrap();
        output.write(&values.collect::<Vec<_>>()).unwrap();
    }

    #[test]
    fn test_add_link_registers_on_output() {
        let src = source("sensor", &[2], 1);
        let mut dest = sink(&[]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();

        let link = &input.links()[0];
        assert_eq!(link.id().as_str(), "sensor.out->level1.in");
        assert_eq!(link.dest_region_name(), "level1");
        assert!(input.find_link("sensor", "out").is_some());
        assert!(input.find_link("sensor", "other").is_none());
        assert_eq!(src.output("out").unwrap().links(), vec![link.id().clone()]);
    }

    #[test]
    fn test_rename_rejected_once_wired() {
        let src = source("a", &[2], 1);
        let mut dest = sink(&[2]);
        let input = dest.input_mut("in").unwrap();
        input.set_name("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();

        assert!(matches!(
            input.set_name("renamed"),
            Err(NetworkError::InvalidState(_))
        ));
        assert_eq!(input.name(), "in");
        assert_eq!(input.links()[0].id().as_str(), "a.out->level1.in");
    }

    #[test]
    fn test_add_link_rejects_duplicates_and_live_regions() {
        let src = source("sensor", &[2], 1);
        let mut dest = sink(&[2]);
        let out = src.output("out").unwrap();
        dest.input_mut("in").unwrap().add_link(UNIFORM_LINK, "", out).unwrap();
        assert!(matches!(
            dest.input_mut("in").unwrap().add_link(UNIFORM_LINK, "", out),
            Err(NetworkError::DuplicateLink { .. })
        ));

        let other = source("other", &[2], 1);
        dest.set_initialized(true);
        assert!(matches!(
            dest.input_mut("in")
                .unwrap()
                .add_link(UNIFORM_LINK, "", other.output("out").unwrap()),
            Err(NetworkError::InvalidState(_))
        ));
        assert_eq!(dest.input("in").unwrap().links().len(), 1);
        assert!(other.output("out").unwrap().links().is_empty());
    }

    #[test]
    fn test_add_link_rejects_unknown_type() {
        let src = source("sensor", &[2], 1);
        let mut dest = sink(&[]);
        let input = dest.input_mut("in").unwrap();
        assert!(matches!(
            input.add_link("NoSuchLink", "", src.output("out").unwrap()),
            Err(NetworkError::UnknownLinkType(_))
        ));
        assert!(input.links().is_empty());
    }

    #[test]
    fn test_evaluate_links_induces_and_is_idempotent() {
        let src = source("sensor", &[4, 2], 1);
        let mut dest = sink(&[]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(TEST_FAN_IN_2, "", src.output("out").unwrap()).unwrap();

        assert_eq!(input.evaluate_links().unwrap(), 0);
        assert_eq!(input.evaluate_links().unwrap(), 0);
        let link = &input.links()[0];
        assert_eq!(link.src_dimensions(), &Dimensions::from([4, 2]));
        assert_eq!(link.destination_dimensions(), &Dimensions::from([2, 1]));
        assert_eq!(dest.dimensions(), Dimensions::from([2, 1]));
    }

    #[test]
    fn test_evaluate_links_counts_open_links() {
        let src = source("sensor", &[], 1);
        let mut dest = sink(&[]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();
        assert_eq!(input.evaluate_links().unwrap(), 1);
        assert!(dest.dimensions().is_unspecified());
    }

    #[test]
    fn test_evaluate_links_detects_conflict_with_region() {
        let src = source("sensor", &[4], 1);
        let mut dest = sink(&[3]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();
        assert!(matches!(
            input.evaluate_links(),
            Err(NetworkError::DimensionMismatch(_))
        ));
        assert!(input.links()[0].src_dimensions().is_unspecified());
    }

    #[test]
    fn test_region_level_input_reports_dont_care() {
        let src = source("sensor", &[3], 2);
        let mut dest = Region::new(
            &RegionSpec::new("classifier")
                .with_input(InputSpec::new("in", ElementType::Real32).region_level()),
        )
        .unwrap();
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();

        // Nothing pins the region's layout, so the link stays open.
        assert_eq!(input.evaluate_links().unwrap(), 1);
        assert!(input.links()[0].destination_dimensions().is_dont_care());

        dest.set_dimensions(Dimensions::from([5])).unwrap();
        let input = dest.input_mut("in").unwrap();
        assert_eq!(input.evaluate_links().unwrap(), 0);

        fill(&src, (0..6).map(|v| v as f32));
        input.initialize().unwrap();
        let map = input.get_splitter_map().unwrap();
        assert_eq!(map.node_count(), 1);
        assert_eq!(map.offsets(0).unwrap(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_initialize_preconditions() {
        let mut empty = sink(&[2]);
        assert!(matches!(
            empty.input_mut("in").unwrap().initialize(),
            Err(NetworkError::InvalidState(_))
        ));

        let src = source("sensor", &[2], 1);
        let mut unresolved = sink(&[]);
        let input = unresolved.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();
        assert!(matches!(input.initialize(), Err(NetworkError::InvalidState(_))));

        let mut dest = sink(&[2]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();
        input.evaluate_links().unwrap();
        // Source output not allocated yet.
        assert!(matches!(input.initialize(), Err(NetworkError::InvalidState(_))));
        assert!(!input.is_initialized());
    }

    #[test]
    fn test_get_data_before_initialize() {
        let dest = sink(&[2]);
        assert!(matches!(
            dest.input("in").unwrap().get_data(),
            Err(NetworkError::InvalidState(_))
        ));
        assert!(dest.input("in").unwrap().get_splitter_map().is_err());
    }

    #[test]
    fn test_single_link_is_zero_copy() {
        let src = source("sensor", &[2], 3);
        let mut dest = sink(&[2]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();
        input.evaluate_links().unwrap();
        fill(&src, (0..6).map(|v| v as f32));

        input.initialize().unwrap();
        input.initialize().unwrap();
        assert!(input.is_zero_copy());
        assert!(input.aliases(src.output("out").unwrap()));
        assert_eq!(input.total_size(), 6);
        assert_eq!(input.link_offsets(), &[0]);
        assert_eq!(input.links()[0].dest_offset(), Some(0));

        // Writes to the output are visible without prepare().
        src.output("out").unwrap().write(&[9.0f32; 6]).unwrap();
        assert_eq!(input.get_data().unwrap().as_slice::<f32>().unwrap(), &[9.0; 6]);
        input.prepare().unwrap();
    }

    #[test]
    fn test_multiple_links_are_concatenated() {
        let a = source("a", &[2], 1);
        let b = source("b", &[2], 2);
        let mut dest = sink(&[2]);
        dest.set_splitter(SplitPolicy::Even.builder()).unwrap();
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", a.output("out").unwrap()).unwrap();
        input.add_link(UNIFORM_LINK, "", b.output("out").unwrap()).unwrap();
        input.evaluate_links().unwrap();
        fill(&a, [1.0, 2.0].into_iter());
        fill(&b, [3.0, 4.0, 5.0, 6.0].into_iter());

        input.initialize().unwrap();
        assert!(!input.is_zero_copy());
        assert_eq!(input.link_offsets(), &[0, 2]);
        assert_eq!(input.total_size(), 6);
        assert_eq!(input.get_data().unwrap().as_slice::<f32>().unwrap(), &[0.0; 6]);

        input.prepare().unwrap();
        assert_eq!(
            input.get_data().unwrap().as_slice::<f32>().unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_type_mismatch_on_initialize() {
        let src = Region::new(
            &RegionSpec::new("sensor")
                .with_dimensions([2])
                .with_output(OutputSpec::new("out", ElementType::Int32, 1)),
        )
        .unwrap();
        let mut dest = sink(&[2]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();
        input.evaluate_links().unwrap();
        src.output("out").unwrap().initialize().unwrap();

        match input.initialize() {
            Err(NetworkError::TypeMismatch { expected, found, .. }) => {
                assert_eq!(expected, ElementType::Real32);
                assert_eq!(found, ElementType::Int32);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_fan_in_node_input() {
        let src = source("sensor", &[4, 2], 1);
        let mut dest = sink(&[]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(TEST_FAN_IN_2, "", src.output("out").unwrap()).unwrap();
        input.evaluate_links().unwrap();
        fill(&src, (0..8).map(|v| v as f32 * 10.0));
        input.initialize().unwrap();

        let map = input.get_splitter_map().unwrap();
        assert_eq!(map.offsets(0).unwrap(), &[0, 1, 4, 5]);
        assert_eq!(map.offsets(1).unwrap(), &[2, 3, 6, 7]);

        let mut node = Vec::new();
        input.get_input_for_node::<f32>(1, &mut node).unwrap();
        assert_eq!(node, vec![20.0, 30.0, 60.0, 70.0]);

        assert!(matches!(
            input.get_input_for_node::<f32>(2, &mut node),
            Err(NetworkError::IndexOutOfRange { index: 2, node_count: 2, .. })
        ));
        let mut wrong = Vec::<i32>::new();
        assert!(matches!(
            input.get_input_for_node::<i32>(0, &mut wrong),
            Err(NetworkError::TypeMismatch { .. })
        ));
        assert_eq!(node, vec![20.0, 30.0, 60.0, 70.0]);
    }

    #[test]
    fn test_region_level_source_broadcasts() {
        let src = broadcaster("context", 3);
        let mut dest = sink(&[2]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();
        assert_eq!(input.evaluate_links().unwrap(), 0);
        assert_eq!(src.dimensions(), Dimensions::from([2]));

        fill(&src, [1.0, 2.0, 3.0].into_iter());
        input.initialize().unwrap();
        let map = input.get_splitter_map().unwrap();
        assert_eq!(map.offsets(0).unwrap(), &[0, 1, 2]);
        assert_eq!(map.offsets(1).unwrap(), &[0, 1, 2]);
    }

    #[test]
    fn test_splitter_map_is_cached_until_topology_changes() {
        let a = source("a", &[2], 1);
        let b = source("b", &[2], 1);
        let mut dest = sink(&[2]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", a.output("out").unwrap()).unwrap();
        input.evaluate_links().unwrap();
        fill(&a, [0.0, 0.0].into_iter());
        fill(&b, [0.0, 0.0].into_iter());
        input.initialize().unwrap();

        let first = input.get_splitter_map().unwrap() as *const SplitterMap;
        let second = input.get_splitter_map().unwrap() as *const SplitterMap;
        assert_eq!(first, second);
        assert_eq!(input.get_splitter_map().unwrap().offsets(0).unwrap(), &[0]);

        // Adding a link to an initialized input (region not live) resets it.
        input.add_link(UNIFORM_LINK, "", b.output("out").unwrap()).unwrap();
        assert!(!input.is_initialized());
        input.evaluate_links().unwrap();
        input.initialize().unwrap();
        let map = input.get_splitter_map().unwrap();
        assert_eq!(map.offsets(0).unwrap(), &[0, 2]);
        assert_eq!(map.offsets(1).unwrap(), &[1, 3]);
    }

    #[test]
    fn test_remove_link_keeps_order() {
        let a = source("a", &[1], 1);
        let b = source("b", &[1], 2);
        let c = source("c", &[1], 3);
        let mut dest = sink(&[1]);
        let input = dest.input_mut("in").unwrap();
        for src in [&a, &b, &c] {
            input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();
            fill(src, std::iter::repeat_n(1.0, src.output("out").unwrap().node_element_count()));
        }
        input.evaluate_links().unwrap();
        input.initialize().unwrap();
        assert_eq!(input.link_offsets(), &[0, 1, 3]);

        let id = input.links()[1].id().clone();
        let removed = input.remove_link(&id).unwrap();
        assert_eq!(removed.src_region_name(), "b");
        assert!(!removed.is_initialized());
        assert!(!input.is_initialized());
        assert!(b.output("out").unwrap().links().is_empty());

        let names: Vec<&str> = input.links().iter().map(Link::src_region_name).collect();
        assert_eq!(names, vec!["a", "c"]);
        input.initialize().unwrap();
        assert_eq!(input.link_offsets(), &[0, 1]);
        assert_eq!(input.total_size(), 4);

        assert!(matches!(
            input.remove_link(&id),
            Err(NetworkError::LinkNotFound(_))
        ));
    }

    #[test]
    fn test_remove_link_rejected_while_region_live() {
        let src = source("sensor", &[2], 1);
        let mut dest = sink(&[2]);
        let input = dest.input_mut("in").unwrap();
        input.add_link(UNIFORM_LINK, "", src.output("out").unwrap()).unwrap();
        let id = input.links()[0].id().clone();

        dest.set_initialized(true);
        let input = dest.input_mut("in").unwrap();
        assert!(matches!(
            input.remove_link(&id),
            Err(NetworkError::InvalidState(_))
        ));
        assert!(input.uninitialize().is_err());
        assert_eq!(input.links().len(), 1);
    }
}
