// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ops::Deref;

use super::port_address::PortAddress;

/// A validated link identifier of the form `"src_region.output->dest_region.input"`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LinkId(String);

/// Errors that can occur when parsing a [`LinkId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkIdError {
    Empty,
    InvalidCharacters(String),
}

impl std::fmt::Display for LinkIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Link ID cannot be empty"),
            Self::InvalidCharacters(id) => {
                write!(f, "Link ID '{}' contains invalid characters", id)
            }
        }
    }
}

impl std::error::Error for LinkIdError {}

fn is_valid_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || c == '>' || c == ':'
}

impl LinkId {
    /// Parse and validate a link ID from a string.
    pub fn from_string(s: impl Into<String>) -> Result<Self, LinkIdError> {
        let s = s.into();

        if s.is_empty() {
            return Err(LinkIdError::Empty);
        }

        if !s.chars().all(is_valid_char) {
            return Err(LinkIdError::InvalidCharacters(s));
        }

        Ok(Self(s))
    }

    /// Identifier of the link from `src` to `dest`.
    pub fn between(src: &PortAddress, dest: &PortAddress) -> Result<Self, LinkIdError> {
        Self::from_string(format!("{}->{}", src.full_address(), dest.full_address()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for LinkId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for LinkId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
