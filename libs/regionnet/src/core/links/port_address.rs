// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Region port address.

use std::fmt;

use crate::core::{NetworkError, Result};

/// Address of a named port on a named region, written `"region.port"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortAddress {
    pub region: String,
    pub port: String,
}

impl PortAddress {
    pub fn new(region: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            port: port.into(),
        }
    }

    /// Parse `"region.port"`. Region names may not contain '.', port names may.
    pub fn parse(address: &str) -> Result<Self> {
        match address.split_once('.') {
            Some((region, port)) if !region.is_empty() && !port.is_empty() => {
                Ok(Self::new(region, port))
            }
            _ => Err(NetworkError::InvalidAddress(format!(
                "'{}' is not of the form region.port",
                address
            ))),
        }
    }

    /// Get the full address as "region.port".
    pub fn full_address(&self) -> String {
        format!("{}.{}", self.region, self.port)
    }
}

impl fmt::Display for PortAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.region, self.port)
    }
}
