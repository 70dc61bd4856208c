// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Links between region outputs and inputs.
//!
//! - **link**: the connection itself, owned by the destination input
//! - **policy**: how a link maps source nodes onto destination nodes
//! - **link_id** / **port_address**: identifiers

mod link;
mod link_id;
pub mod policy;
mod port_address;

pub use link::Link;
pub use link_id::{LinkId, LinkIdError};
pub use policy::{create_link_policy, LinkPolicy, UniformLinkPolicy};
pub use port_address::PortAddress;
