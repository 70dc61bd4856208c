// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

use crate::core::types::ElementType;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Input '{input}' already has a link from {src}")]
    DuplicateLink { input: String, src: String },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Type mismatch for {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: ElementType,
        found: ElementType,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Node index {index} out of range for input '{input}' ({node_count} nodes)")]
    IndexOutOfRange {
        input: String,
        index: usize,
        node_count: usize,
    },

    #[error("Unresolved dimensions for region(s): {}", regions.join(", "))]
    UnresolvedDimensions { regions: Vec<String> },

    #[error("Region not found: {0}")]
    RegionNotFound(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Link not found: {0}")]
    LinkNotFound(String),

    #[error("Unknown link type: {0}")]
    UnknownLinkType(String),

    #[error("Invalid parameters for {link_type}: {source}")]
    InvalidLinkParams {
        link_type: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid port address: {0}")]
    InvalidAddress(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
