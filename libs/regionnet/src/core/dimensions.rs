// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Region and link dimensions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Node layout of a region, one extent per axis.
///
/// An empty extent list means the dimensions are not known yet. The single
/// extent `[0]` is "don't care": a link reporting it places no constraint on
/// the region it feeds. Linear node indices vary fastest along the first axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimensions(Vec<usize>);

impl Dimensions {
    pub fn new(extents: impl Into<Vec<usize>>) -> Self {
        Self(extents.into())
    }

    pub fn unspecified() -> Self {
        Self(Vec::new())
    }

    pub fn dont_care() -> Self {
        Self(vec![0])
    }

    pub fn is_unspecified(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_dont_care(&self) -> bool {
        self.0.as_slice() == [0]
    }

    /// Neither unspecified nor don't-care.
    pub fn is_specified(&self) -> bool {
        !self.is_unspecified() && !self.is_dont_care()
    }

    /// A zero extent on a multi-axis layout leaves the region with no nodes.
    pub fn has_empty_axis(&self) -> bool {
        self.0.len() > 1 && self.0.contains(&0)
    }

    pub fn extents(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Extent along `axis`, 1 past the last axis.
    pub fn extent(&self, axis: usize) -> usize {
        self.0.get(axis).copied().unwrap_or(1)
    }

    /// Number of nodes. Zero unless specified.
    pub fn count(&self) -> usize {
        if self.is_specified() {
            self.0.iter().product()
        } else {
            0
        }
    }

    /// Same layout once trailing extents of 1 are ignored (`[4]` ≡ `[4, 1]`).
    pub fn is_equivalent(&self, other: &Dimensions) -> bool {
        if !self.is_specified() || !other.is_specified() {
            return self == other;
        }
        self.trimmed() == other.trimmed()
    }

    fn trimmed(&self) -> &[usize] {
        let end = self
            .0
            .iter()
            .rposition(|&extent| extent != 1)
            .map_or(0, |i| i + 1);
        &self.0[..end]
    }

    /// Coordinates of the node at linear `index`.
    pub fn coordinates(&self, mut index: usize) -> Vec<usize> {
        self.0
            .iter()
            .map(|&extent| {
                let coordinate = index % extent;
                index /= extent;
                coordinate
            })
            .collect()
    }

    /// Linear index of the node at `coordinates`.
    pub fn index_of(&self, coordinates: &[usize]) -> usize {
        let mut index = 0;
        let mut stride = 1;
        for (axis, &coordinate) in coordinates.iter().enumerate() {
            index += coordinate * stride;
            stride *= self.extent(axis);
        }
        index
    }
}

impl From<Vec<usize>> for Dimensions {
    fn from(extents: Vec<usize>) -> Self {
        Self(extents)
    }
}

impl<const N: usize> From<[usize; N]> for Dimensions {
    fn from(extents: [usize; N]) -> Self {
        Self(extents.to_vec())
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unspecified() {
            return write!(f, "[unspecified]");
        }
        if self.is_dont_care() {
            return write!(f, "[dontcare]");
        }
        write!(f, "{:?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states() {
        assert!(Dimensions::unspecified().is_unspecified());
        assert!(Dimensions::dont_care().is_dont_care());
        assert!(!Dimensions::dont_care().is_specified());
        assert!(Dimensions::from([2, 3]).is_specified());
        assert_eq!(Dimensions::from([2, 3]).count(), 6);
        assert_eq!(Dimensions::dont_care().count(), 0);
    }

    #[test]
    fn test_empty_axis() {
        assert!(Dimensions::from([2, 0]).has_empty_axis());
        assert!(Dimensions::from([0, 3]).has_empty_axis());
        assert!(!Dimensions::dont_care().has_empty_axis());
        assert!(!Dimensions::from([2, 3]).has_empty_axis());
        assert!(!Dimensions::unspecified().has_empty_axis());
    }

    #[test]
    fn test_equivalence_ignores_trailing_ones() {
        assert!(Dimensions::from([4]).is_equivalent(&Dimensions::from([4, 1])));
        assert!(Dimensions::from([1]).is_equivalent(&Dimensions::from([1, 1, 1])));
        assert!(!Dimensions::from([4]).is_equivalent(&Dimensions::from([1, 4])));
        assert!(!Dimensions::from([1]).is_equivalent(&Dimensions::unspecified()));
        assert!(!Dimensions::dont_care().is_equivalent(&Dimensions::from([1])));
    }

    #[test]
    fn test_first_axis_varies_fastest() {
        let dims = Dimensions::from([3, 2]);
        assert_eq!(dims.coordinates(0), vec![0, 0]);
        assert_eq!(dims.coordinates(1), vec![1, 0]);
        assert_eq!(dims.coordinates(3), vec![0, 1]);
        for index in 0..dims.count() {
            assert_eq!(dims.index_of(&dims.coordinates(index)), index);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Dimensions::from([2, 3]).to_string(), "[2, 3]");
        assert_eq!(Dimensions::unspecified().to_string(), "[unspecified]");
        assert_eq!(Dimensions::dont_care().to_string(), "[dontcare]");
    }

    #[test]
    fn test_yaml_is_a_plain_list() {
        let dims: Dimensions = serde_yaml::from_str("[4, 2]").unwrap();
        assert_eq!(dims, Dimensions::from([4, 2]));
    }
}
