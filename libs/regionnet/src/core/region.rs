// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Regions: the owners of inputs and outputs.
//!
//! A region's mutable state lives behind a [`RegionHandle`]. The region keeps
//! the only strong reference; its inputs and outputs hold a [`RegionRef`] so
//! tearing a region down never has to break a reference cycle.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::core::config::RegionSpec;
use crate::core::dimensions::Dimensions;
use crate::core::input::{Input, SplitterMapBuilder};
use crate::core::output::Output;
use crate::core::{NetworkError, Result};

/// Shared state of one region.
#[derive(Debug)]
pub struct RegionState {
    name: String,
    dimensions: Dimensions,
    initialized: bool,
    splitter: Arc<dyn SplitterMapBuilder>,
}

impl RegionState {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn splitter(&self) -> Arc<dyn SplitterMapBuilder> {
        Arc::clone(&self.splitter)
    }
}

/// Owning handle to a region's state.
pub type RegionHandle = Arc<RwLock<RegionState>>;

/// Non-owning reference to a region, held by its ports.
#[derive(Debug, Clone)]
pub struct RegionRef(Weak<RwLock<RegionState>>);

impl RegionRef {
    pub fn upgrade(&self) -> Result<RegionHandle> {
        self.0
            .upgrade()
            .ok_or_else(|| NetworkError::InvalidState("region has been removed".into()))
    }

    pub fn name(&self) -> Result<String> {
        Ok(self.upgrade()?.read().name.clone())
    }

    pub fn dimensions(&self) -> Result<Dimensions> {
        Ok(self.upgrade()?.read().dimensions.clone())
    }

    /// A removed region is no longer initialized.
    pub fn is_initialized(&self) -> bool {
        self.0
            .upgrade()
            .map(|handle| handle.read().initialized)
            .unwrap_or(false)
    }

    pub fn splitter(&self) -> Result<Arc<dyn SplitterMapBuilder>> {
        Ok(self.upgrade()?.read().splitter())
    }

    /// Record dimensions induced by a link. Only fills unspecified dimensions.
    pub(crate) fn induce_dimensions(&self, dimensions: &Dimensions) -> Result<()> {
        let handle = self.upgrade()?;
        let mut state = handle.write();
        if state.dimensions.is_unspecified() {
            tracing::info!(
                "[{}] Dimensions induced by links: {}",
                state.name,
                dimensions
            );
            state.dimensions = dimensions.clone();
            Ok(())
        } else if state.dimensions.is_equivalent(dimensions) {
            Ok(())
        } else {
            Err(NetworkError::DimensionMismatch(format!(
                "region '{}' has dimensions {} but links require {}",
                state.name, state.dimensions, dimensions
            )))
        }
    }

    pub fn ptr_eq(&self, other: &RegionRef) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

/// A processing unit with named inputs and outputs.
#[derive(Debug)]
pub struct Region {
    name: String,
    handle: RegionHandle,
    inputs: BTreeMap<String, Input>,
    outputs: BTreeMap<String, Output>,
}

impl Region {
    pub fn new(spec: &RegionSpec) -> Result<Self> {
        if spec.dimensions.has_empty_axis() {
            return Err(NetworkError::Configuration(format!(
                "region '{}' declares an empty axis: {}",
                spec.name, spec.dimensions
            )));
        }
        let handle = Arc::new(RwLock::new(RegionState {
            name: spec.name.clone(),
            dimensions: spec.dimensions.clone(),
            initialized: false,
            splitter: spec.split.builder(),
        }));
        let region_ref = RegionRef(Arc::downgrade(&handle));

        let mut inputs = BTreeMap::new();
        for input_spec in &spec.inputs {
            let mut input = Input::new(
                region_ref.clone(),
                input_spec.element_type,
                input_spec.region_level,
            );
            input.set_name(&input_spec.name)?;
            if inputs.insert(input_spec.name.clone(), input).is_some() {
                return Err(NetworkError::Configuration(format!(
                    "region '{}' declares input '{}' twice",
                    spec.name, input_spec.name
                )));
            }
        }

        let mut outputs = BTreeMap::new();
        for output_spec in &spec.outputs {
            let output = Output::new(
                region_ref.clone(),
                &output_spec.name,
                output_spec.element_type,
                output_spec.node_element_count,
                output_spec.region_level,
            );
            if outputs.insert(output_spec.name.clone(), output).is_some() {
                return Err(NetworkError::Configuration(format!(
                    "region '{}' declares output '{}' twice",
                    spec.name, output_spec.name
                )));
            }
        }

        Ok(Self {
            name: spec.name.clone(),
            handle,
            inputs,
            outputs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region_ref(&self) -> RegionRef {
        RegionRef(Arc::downgrade(&self.handle))
    }

    pub fn dimensions(&self) -> Dimensions {
        self.handle.read().dimensions.clone()
    }

    fn check_not_initialized(&self, operation: &str) -> Result<()> {
        if self.is_initialized() {
            return Err(NetworkError::InvalidState(format!(
                "cannot {} initialized region '{}'",
                operation, self.name
            )));
        }
        Ok(())
    }

    /// Drop every input's buffer and splitter map. Both depend on the
    /// region's layout and partition policy.
    fn reset_inputs(&mut self) -> Result<()> {
        for input in self.inputs.values_mut() {
            if input.is_initialized() {
                input.uninitialize()?;
            }
        }
        Ok(())
    }

    pub fn set_dimensions(&mut self, dimensions: Dimensions) -> Result<()> {
        self.check_not_initialized("set dimensions of")?;
        if dimensions.has_empty_axis() {
            return Err(NetworkError::DimensionMismatch(format!(
                "region '{}' cannot have an empty axis: {}",
                self.name, dimensions
            )));
        }
        if let Some(output) = self.outputs.values().find(|output| output.is_initialized()) {
            return Err(NetworkError::InvalidState(format!(
                "cannot set dimensions of region '{}' while output '{}' is allocated",
                self.name,
                output.name()
            )));
        }

        self.reset_inputs()?;
        self.handle.write().dimensions = dimensions;
        Ok(())
    }

    /// Replace the policy used to partition this region's inputs across its nodes.
    pub fn set_splitter(&mut self, splitter: Arc<dyn SplitterMapBuilder>) -> Result<()> {
        self.check_not_initialized("change splitter of")?;
        self.reset_inputs()?;
        self.handle.write().splitter = splitter;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.read().initialized
    }

    pub(crate) fn set_initialized(&self, initialized: bool) {
        self.handle.write().initialized = initialized;
    }

    pub fn input(&self, name: &str) -> Result<&Input> {
        self.inputs
            .get(name)
            .ok_or_else(|| NetworkError::PortNotFound(format!("{}.{}", self.name, name)))
    }

    pub fn input_mut(&mut self, name: &str) -> Result<&mut Input> {
        self.inputs
            .get_mut(name)
            .ok_or_else(|| NetworkError::PortNotFound(format!("{}.{}", self.name, name)))
    }

    pub fn output(&self, name: &str) -> Result<&Output> {
        self.outputs
            .get(name)
            .ok_or_else(|| NetworkError::PortNotFound(format!("{}.{}", self.name, name)))
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Input> {
        self.inputs.values()
    }

    pub fn inputs_mut(&mut self) -> impl Iterator<Item = &mut Input> {
        self.inputs.values_mut()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    /// Refresh every input's aggregated view before a processing step.
    pub fn prepare_inputs(&mut self) -> Result<()> {
        for input in self.inputs.values_mut() {
            input.prepare()?;
        }
        Ok(())
    }
}
