// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Network descriptions loaded from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::dimensions::Dimensions;
use crate::core::input::SplitPolicy;
use crate::core::links::policy::UNIFORM_LINK;
use crate::core::types::ElementType;
use crate::core::{NetworkError, Result};

/// Declaration of one input port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    pub element_type: ElementType,
    /// Region-level inputs are not split across nodes.
    #[serde(default)]
    pub region_level: bool,
}

impl InputSpec {
    pub fn new(name: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            name: name.into(),
            element_type,
            region_level: false,
        }
    }

    pub fn region_level(mut self) -> Self {
        self.region_level = true;
        self
    }
}

/// Declaration of one output port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    pub element_type: ElementType,
    /// Elements produced per node, or in total for a region-level output.
    pub node_element_count: usize,
    #[serde(default)]
    pub region_level: bool,
}

impl OutputSpec {
    pub fn new(name: impl Into<String>, element_type: ElementType, node_element_count: usize) -> Self {
        Self {
            name: name.into(),
            element_type,
            node_element_count,
            region_level: false,
        }
    }

    pub fn region_level(mut self) -> Self {
        self.region_level = true;
        self
    }
}

/// Declaration of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub name: String,
    /// Omit to let links induce the dimensions.
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub split: SplitPolicy,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
}

impl RegionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimensions: Dimensions::unspecified(),
            split: SplitPolicy::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_dimensions(mut self, dimensions: impl Into<Dimensions>) -> Self {
        self.dimensions = dimensions.into();
        self
    }

    pub fn with_split(mut self, split: SplitPolicy) -> Self {
        self.split = split;
        self
    }

    pub fn with_input(mut self, input: InputSpec) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(mut self, output: OutputSpec) -> Self {
        self.outputs.push(output);
        self
    }
}

fn default_link_type() -> String {
    UNIFORM_LINK.to_string()
}

/// Declaration of one link, endpoints as `"region.port"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    #[serde(rename = "type", default = "default_link_type")]
    pub link_type: String,
    /// Policy parameters as inline YAML, e.g. `"{rfSize: [2]}"`.
    #[serde(default)]
    pub params: String,
    pub src: String,
    pub dest: String,
}

/// Regions and links of a network, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub regions: Vec<RegionSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

impl NetworkConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            NetworkError::Configuration(format!("Failed to parse network description: {}", e))
        })
    }

    /// Load a network description from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NetworkError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            NetworkError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::info!(
            "Loaded network description from {} ({} regions, {} links)",
            path.display(),
            config.regions.len(),
            config.links.len()
        );
        Ok(config)
    }
}
