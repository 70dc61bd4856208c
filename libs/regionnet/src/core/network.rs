// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Network - owns the regions and drives link negotiation and initialization.

use std::collections::BTreeMap;

use crate::core::config::{NetworkConfig, RegionSpec};
use crate::core::links::{Link, LinkId, PortAddress};
use crate::core::region::Region;
use crate::core::{NetworkError, Result};

/// A set of regions wired together by links.
///
/// Regions are kept in name order, which is also the order inputs are
/// negotiated, initialized and torn down in.
#[derive(Debug, Default)]
pub struct Network {
    regions: BTreeMap<String, Region>,
    initialized: bool,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build regions and links in document order.
    pub fn from_config(config: &NetworkConfig) -> Result<Self> {
        let mut network = Self::new();
        for spec in &config.regions {
            network.add_region(spec)?;
        }
        for link in &config.links {
            network.link(&link.link_type, &link.params, &link.src, &link.dest)?;
        }
        tracing::info!(
            "Network built: {} regions, {} links",
            network.regions.len(),
            config.links.len()
        );
        Ok(network)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn check_not_initialized(&self, operation: &str) -> Result<()> {
        if self.initialized {
            return Err(NetworkError::InvalidState(format!(
                "cannot {} while the network is initialized",
                operation
            )));
        }
        Ok(())
    }

    pub fn add_region(&mut self, spec: &RegionSpec) -> Result<&mut Region> {
        self.check_not_initialized("add a region")?;
        if spec.name.is_empty() || spec.name.contains('.') {
            return Err(NetworkError::Configuration(format!(
                "invalid region name '{}'",
                spec.name
            )));
        }
        if self.regions.contains_key(&spec.name) {
            return Err(NetworkError::Configuration(format!(
                "region '{}' already exists",
                spec.name
            )));
        }

        let region = Region::new(spec)?;
        tracing::debug!("[{}] Added region {}", spec.name, spec.dimensions);
        Ok(self.regions.entry(spec.name.clone()).or_insert(region))
    }

    /// Remove a region together with every link into or out of it.
    pub fn remove_region(&mut self, name: &str) -> Result<()> {
        self.check_not_initialized("remove a region")?;
        if !self.regions.contains_key(name) {
            return Err(NetworkError::RegionNotFound(name.to_string()));
        }

        for region in self.regions.values_mut() {
            for input in region.inputs_mut() {
                let outgoing: Vec<LinkId> = input
                    .links()
                    .iter()
                    .filter(|link| link.src_region_name() == name)
                    .map(|link| link.id().clone())
                    .collect();
                for id in outgoing {
                    input.remove_link(&id)?;
                }
            }
        }

        if let Some(mut region) = self.regions.remove(name) {
            for input in region.inputs_mut() {
                let incoming: Vec<LinkId> = input.links().iter().map(|l| l.id().clone()).collect();
                for id in incoming {
                    input.remove_link(&id)?;
                }
            }
        }
        tracing::info!("[{}] Region removed", name);
        Ok(())
    }

    pub fn region(&self, name: &str) -> Result<&Region> {
        self.regions
            .get(name)
            .ok_or_else(|| NetworkError::RegionNotFound(name.to_string()))
    }

    pub fn region_mut(&mut self, name: &str) -> Result<&mut Region> {
        self.regions
            .get_mut(name)
            .ok_or_else(|| NetworkError::RegionNotFound(name.to_string()))
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Link `src` ("region.output") to `dest` ("region.input").
    pub fn link(&mut self, link_type: &str, params: &str, src: &str, dest: &str) -> Result<LinkId> {
        let src = PortAddress::parse(src)?;
        let dest = PortAddress::parse(dest)?;

        let output = self.region(&src.region)?.output(&src.port)?.clone();
        self.region_mut(&dest.region)?
            .input_mut(&dest.port)?
            .add_link(link_type, params, &output)?;

        LinkId::between(&src, &dest).map_err(|e| NetworkError::InvalidAddress(e.to_string()))
    }

    /// Remove the link between `src` and `dest` and return it.
    pub fn unlink(&mut self, src: &str, dest: &str) -> Result<Link> {
        let src = PortAddress::parse(src)?;
        let dest = PortAddress::parse(dest)?;
        let id = LinkId::between(&src, &dest)
            .map_err(|e| NetworkError::InvalidAddress(e.to_string()))?;

        self.region_mut(&dest.region)?
            .input_mut(&dest.port)?
            .remove_link(&id)
    }

    /// Names of regions whose dimensions are still not fully known.
    fn unresolved_regions(&self) -> Vec<String> {
        self.regions
            .values()
            .filter(|region| !region.dimensions().is_specified())
            .map(|region| region.name().to_string())
            .collect()
    }

    /// Run link negotiation to a fixed point.
    fn negotiate(&mut self) -> Result<()> {
        let mut last = None;
        let mut pass = 0;
        loop {
            pass += 1;
            let mut unresolved_links = 0;
            for region in self.regions.values_mut() {
                for input in region.inputs_mut() {
                    unresolved_links += input.evaluate_links()?;
                }
            }
            let unresolved_regions = self.unresolved_regions().len();
            tracing::debug!(
                "Negotiation pass {}: {} open link(s), {} unresolved region(s)",
                pass,
                unresolved_links,
                unresolved_regions
            );

            let progress = (unresolved_links, unresolved_regions);
            if unresolved_links == 0 || last == Some(progress) {
                break;
            }
            last = Some(progress);
        }

        let unresolved = self.unresolved_regions();
        if !unresolved.is_empty() {
            return Err(NetworkError::UnresolvedDimensions {
                regions: unresolved,
            });
        }
        Ok(())
    }

    fn initialize_ports(&mut self) -> Result<()> {
        for region in self.regions.values() {
            for output in region.outputs() {
                output.initialize()?;
            }
        }
        for region in self.regions.values_mut() {
            for input in region.inputs_mut() {
                if !input.links().is_empty() {
                    input.initialize()?;
                }
            }
        }
        Ok(())
    }

    fn release_ports(&mut self) {
        for region in self.regions.values_mut() {
            for input in region.inputs_mut() {
                if let Err(e) = input.uninitialize() {
                    tracing::warn!("[{}] Failed to release input: {}", input.name(), e);
                }
            }
            for output in region.outputs() {
                output.uninitialize();
            }
        }
    }

    /// Resolve dimensions, then initialize outputs, inputs and regions.
    ///
    /// On failure every port is released again.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.negotiate()?;

        if let Err(e) = self.initialize_ports() {
            self.release_ports();
            return Err(e);
        }
        for region in self.regions.values() {
            region.set_initialized(true);
        }
        self.initialized = true;
        tracing::info!("Network initialized ({} regions)", self.regions.len());
        Ok(())
    }

    pub fn uninitialize(&mut self) {
        if !self.initialized {
            return;
        }
        for region in self.regions.values() {
            region.set_initialized(false);
        }
        self.release_ports();
        self.initialized = false;
        tracing::info!("Network uninitialized");
    }

    /// Refresh one region's inputs before it runs.
    pub fn prepare_inputs(&mut self, region: &str) -> Result<()> {
        if !self.initialized {
            return Err(NetworkError::InvalidState(format!(
                "cannot prepare inputs of '{}' before the network is initialized",
                region
            )));
        }
        self.region_mut(region)?.prepare_inputs()
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        self.uninitialize();
        for region in self.regions.values_mut() {
            for input in region.inputs_mut() {
                let ids: Vec<LinkId> = input.links().iter().map(|l| l.id().clone()).collect();
                for id in ids {
                    if let Err(e) = input.remove_link(&id) {
                        tracing::warn!("[{}] Failed to remove link during teardown: {}", id, e);
                    }
                }
            }
        }
    }
}
