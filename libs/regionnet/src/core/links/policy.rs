// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Link policies: how a link maps source nodes onto destination nodes.
//!
//! A policy answers two questions. During negotiation it converts dimensions
//! across the link in either direction; once the network is initialized it
//! builds a proto splitter map listing, for every destination node, the
//! source elements that node consumes.

use std::fmt;

use serde::Deserialize;

use crate::core::dimensions::Dimensions;
use crate::core::{NetworkError, Result};

pub const UNIFORM_LINK: &str = "UniformLink";
pub const TEST_FAN_IN_2: &str = "TestFanIn2";

pub trait LinkPolicy: Send + Sync + fmt::Debug {
    fn link_type(&self) -> &str;

    /// Destination dimensions implied by the given source dimensions.
    fn dest_for_src(&self, src: &Dimensions) -> Result<Dimensions>;

    /// Source dimensions implied by the given destination dimensions.
    fn src_for_dest(&self, dest: &Dimensions) -> Result<Dimensions>;

    /// Fill `proto[dest_node]` with the indices of the source elements that
    /// destination node receives.
    fn build_proto_splitter_map(
        &self,
        src: &Dimensions,
        dest: &Dimensions,
        node_element_count: usize,
        proto: &mut [Vec<usize>],
    ) -> Result<()>;
}

/// Create the policy for `link_type`, parsing `params` as YAML.
pub fn create_link_policy(link_type: &str, params: &str) -> Result<Box<dyn LinkPolicy>> {
    match link_type {
        UNIFORM_LINK => Ok(Box::new(UniformLinkPolicy::from_params(params)?)),
        TEST_FAN_IN_2 => {
            if !params.trim().is_empty() {
                return Err(NetworkError::Configuration(format!(
                    "{} takes no parameters, got '{}'",
                    TEST_FAN_IN_2, params
                )));
            }
            Ok(Box::new(UniformLinkPolicy::fan_in_2()))
        }
        other => Err(NetworkError::UnknownLinkType(other.to_string())),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UniformLinkParams {
    #[serde(default)]
    rf_size: Vec<usize>,
}

/// Tiles the source nodes with equal, non-overlapping receptive fields.
///
/// Destination node `d` receives every element of the source nodes inside
/// its receptive field, source nodes visited in linear order. A single
/// `rfSize` entry applies to every axis; axes without an entry use 1.
#[derive(Debug, Clone)]
pub struct UniformLinkPolicy {
    link_type: &'static str,
    rf_size: Vec<usize>,
}

impl UniformLinkPolicy {
    pub fn new(rf_size: Vec<usize>) -> Result<Self> {
        if rf_size.contains(&0) {
            return Err(NetworkError::Configuration(format!(
                "{} rfSize entries must be positive, got {:?}",
                UNIFORM_LINK, rf_size
            )));
        }
        Ok(Self {
            link_type: UNIFORM_LINK,
            rf_size,
        })
    }

    pub fn from_params(params: &str) -> Result<Self> {
        let params = if params.trim().is_empty() {
            UniformLinkParams::default()
        } else {
            serde_yaml::from_str::<UniformLinkParams>(params).map_err(|source| {
                NetworkError::InvalidLinkParams {
                    link_type: UNIFORM_LINK.to_string(),
                    source,
                }
            })?
        };
        Self::new(params.rf_size)
    }

    /// Every destination node reads a 2×…×2 block of source nodes.
    pub fn fan_in_2() -> Self {
        Self {
            link_type: TEST_FAN_IN_2,
            rf_size: vec![2],
        }
    }

    fn receptive_field(&self, axis: usize) -> usize {
        match self.rf_size.as_slice() {
            [] => 1,
            [all] => *all,
            per_axis => per_axis.get(axis).copied().unwrap_or(1),
        }
    }

    fn check_rank(&self, dims: &Dimensions) -> Result<()> {
        if self.rf_size.len() > 1
            && self.rf_size.len() > dims.rank()
            && self.rf_size[dims.rank()..].iter().any(|&rf| rf != 1)
        {
            return Err(NetworkError::DimensionMismatch(format!(
                "{} rfSize {:?} has more axes than dimensions {}",
                self.link_type, self.rf_size, dims
            )));
        }
        Ok(())
    }
}

impl LinkPolicy for UniformLinkPolicy {
    fn link_type(&self) -> &str {
        self.link_type
    }

    fn dest_for_src(&self, src: &Dimensions) -> Result<Dimensions> {
        if !src.is_specified() {
            return Ok(src.clone());
        }
        self.check_rank(src)?;
        src.extents()
            .iter()
            .enumerate()
            .map(|(axis, &extent)| {
                let rf = self.receptive_field(axis);
                if extent % rf != 0 {
                    return Err(NetworkError::DimensionMismatch(format!(
                        "{}: source extent {} on axis {} is not a multiple of rfSize {}",
                        self.link_type, extent, axis, rf
                    )));
                }
                Ok(extent / rf)
            })
            .collect::<Result<Vec<_>>>()
            .map(Dimensions::new)
    }

    fn src_for_dest(&self, dest: &Dimensions) -> Result<Dimensions> {
        if !dest.is_specified() {
            return Ok(dest.clone());
        }
        self.check_rank(dest)?;
        Ok(Dimensions::new(
            dest.extents()
                .iter()
                .enumerate()
                .map(|(axis, &extent)| extent * self.receptive_field(axis))
                .collect::<Vec<_>>(),
        ))
    }

    fn build_proto_splitter_map(
        &self,
        src: &Dimensions,
        dest: &Dimensions,
        node_element_count: usize,
        proto: &mut [Vec<usize>],
    ) -> Result<()> {
        let expected = self.dest_for_src(src)?;
        if !expected.is_equivalent(dest) {
            return Err(NetworkError::DimensionMismatch(format!(
                "{}: source {} maps to {}, not {}",
                self.link_type, src, expected, dest
            )));
        }
        if proto.len() != dest.count() {
            return Err(NetworkError::InvalidState(format!(
                "{}: proto splitter map has {} nodes, destination has {}",
                self.link_type,
                proto.len(),
                dest.count()
            )));
        }

        let field = Dimensions::new(
            (0..src.rank())
                .map(|axis| self.receptive_field(axis))
                .collect::<Vec<_>>(),
        );
        for (dest_node, elements) in proto.iter_mut().enumerate() {
            let dest_coordinates = expected.coordinates(dest_node);
            for field_index in 0..field.count() {
                let src_coordinates: Vec<usize> = field
                    .coordinates(field_index)
                    .iter()
                    .zip(&dest_coordinates)
                    .enumerate()
                    .map(|(axis, (&within, &origin))| {
                        origin * self.receptive_field(axis) + within
                    })
                    .collect();
                let src_node = src.index_of(&src_coordinates);
                let first = src_node * node_element_count;
                elements.extend(first..first + node_element_count);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_by_default() {
        let policy = create_link_policy(UNIFORM_LINK, "").unwrap();
        let dims = Dimensions::from([3, 2]);
        assert_eq!(policy.dest_for_src(&dims).unwrap(), dims);
        assert_eq!(policy.src_for_dest(&dims).unwrap(), dims);
    }

    #[test]
    fn test_receptive_field_divides_source() {
        let policy = create_link_policy(UNIFORM_LINK, "{rfSize: [2, 3]}").unwrap();
        let dest = policy.dest_for_src(&Dimensions::from([4, 6])).unwrap();
        assert_eq!(dest, Dimensions::from([2, 2]));
        assert_eq!(
            policy.src_for_dest(&dest).unwrap(),
            Dimensions::from([4, 6])
        );
        assert!(matches!(
            policy.dest_for_src(&Dimensions::from([5, 6])),
            Err(NetworkError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_unspecified_passes_through() {
        let policy = create_link_policy(TEST_FAN_IN_2, "").unwrap();
        assert!(policy
            .dest_for_src(&Dimensions::unspecified())
            .unwrap()
            .is_unspecified());
    }

    #[test]
    fn test_bad_params() {
        assert!(matches!(
            create_link_policy(UNIFORM_LINK, "{rfSize: nope}"),
            Err(NetworkError::InvalidLinkParams { .. })
        ));
        assert!(matches!(
            create_link_policy(UNIFORM_LINK, "{span: [1]}"),
            Err(NetworkError::InvalidLinkParams { .. })
        ));
        assert!(matches!(
            create_link_policy(UNIFORM_LINK, "{rfSize: [0]}"),
            Err(NetworkError::Configuration(_))
        ));
        assert!(matches!(
            create_link_policy(TEST_FAN_IN_2, "{rfSize: [2]}"),
            Err(NetworkError::Configuration(_))
        ));
        assert!(matches!(
            create_link_policy("NoSuchLink", ""),
            Err(NetworkError::UnknownLinkType(_))
        ));
    }

    #[test]
    fn test_fan_in_2_proto_map() {
        // 4x2 source nodes, 1 element each -> 2x1 destination nodes.
        let policy = UniformLinkPolicy::fan_in_2();
        let src = Dimensions::from([4, 2]);
        let dest = policy.dest_for_src(&src).unwrap();
        assert_eq!(dest, Dimensions::from([2, 1]));

        let mut proto = vec![Vec::new(); dest.count()];
        policy
            .build_proto_splitter_map(&src, &dest, 1, &mut proto)
            .unwrap();
        assert_eq!(proto[0], vec![0, 1, 4, 5]);
        assert_eq!(proto[1], vec![2, 3, 6, 7]);
    }

    #[test]
    fn test_proto_map_expands_node_elements() {
        let policy = UniformLinkPolicy::new(vec![1]).unwrap();
        let src = Dimensions::from([2]);
        let mut proto = vec![Vec::new(); 2];
        policy
            .build_proto_splitter_map(&src, &src, 3, &mut proto)
            .unwrap();
        assert_eq!(proto, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn test_proto_map_rejects_foreign_destination() {
        let policy = UniformLinkPolicy::new(vec![1]).unwrap();
        let mut proto = vec![Vec::new(); 3];
        assert!(matches!(
            policy.build_proto_splitter_map(
                &Dimensions::from([2]),
                &Dimensions::from([3]),
                1,
                &mut proto
            ),
            Err(NetworkError::DimensionMismatch(_))
        ));
    }
}
