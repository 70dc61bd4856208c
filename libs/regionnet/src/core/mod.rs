// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod config;
pub mod dimensions;
pub mod error;
pub mod input;
pub mod links;
pub mod logging;
pub mod network;
pub mod output;
pub mod region;
pub mod types;

pub use config::{InputSpec, LinkSpec, NetworkConfig, OutputSpec, RegionSpec};
pub use dimensions::Dimensions;
pub use error::*;
pub use input::*;
pub use links::*;
pub use network::Network;
pub use output::{Output, OutputRef};
pub use region::{Region, RegionHandle, RegionRef, RegionState};
pub use types::{Array, Element, ElementType, SharedArray};
