// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Output - the upstream side of a link.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::core::dimensions::Dimensions;
use crate::core::links::LinkId;
use crate::core::region::RegionRef;
use crate::core::types::{Array, Element, ElementType, SharedArray};
use crate::core::{NetworkError, Result};

#[derive(Debug, Default)]
struct OutputState {
    initialized: bool,
    links: Vec<LinkId>,
}

/// Inner state for Output.
#[derive(Debug)]
struct OutputInner {
    name: String,
    region: RegionRef,
    element_type: ElementType,
    node_element_count: usize,
    region_level: bool,
    data: SharedArray,
    state: Mutex<OutputState>,
}

/// Output port of a region.
///
/// Clones are shallow: every clone shares the same buffer and link list.
/// Links keep an [`OutputRef`] rather than a clone.
#[derive(Debug, Clone)]
pub struct Output {
    inner: Arc<OutputInner>,
}

/// Non-owning reference to an [`Output`].
#[derive(Debug, Clone)]
pub struct OutputRef(Weak<OutputInner>);

impl OutputRef {
    pub fn upgrade(&self) -> Option<Output> {
        self.0.upgrade().map(|inner| Output { inner })
    }
}

impl Output {
    pub fn new(
        region: RegionRef,
        name: &str,
        element_type: ElementType,
        node_element_count: usize,
        region_level: bool,
    ) -> Self {
        Self {
            inner: Arc::new(OutputInner {
                name: name.to_string(),
                region,
                element_type,
                node_element_count,
                region_level,
                data: Array::new(element_type).into_shared(),
                state: Mutex::new(OutputState::default()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn region(&self) -> &RegionRef {
        &self.inner.region
    }

    pub fn region_name(&self) -> Result<String> {
        self.inner.region.name()
    }

    /// Dimensions of the owning region.
    pub fn dimensions(&self) -> Result<Dimensions> {
        self.inner.region.dimensions()
    }

    pub fn element_type(&self) -> ElementType {
        self.inner.element_type
    }

    /// Elements produced by each node (by the whole region if region-level).
    pub fn node_element_count(&self) -> usize {
        self.inner.node_element_count
    }

    pub fn is_region_level(&self) -> bool {
        self.inner.region_level
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.state.lock().initialized
    }

    /// Allocate the buffer once the owning region's dimensions are known.
    pub fn initialize(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.initialized {
            return Ok(());
        }

        let count = if self.inner.region_level {
            self.inner.node_element_count
        } else {
            let dimensions = self.dimensions()?;
            if !dimensions.is_specified() {
                return Err(NetworkError::UnresolvedDimensions {
                    regions: vec![self.region_name()?],
                });
            }
            dimensions.count() * self.inner.node_element_count
        };

        *self.inner.data.write() = Array::zeroed(self.inner.element_type, count);
        state.initialized = true;
        tracing::debug!("[{}] Output allocated {} elements", self.inner.name, count);
        Ok(())
    }

    pub fn uninitialize(&self) {
        let mut state = self.inner.state.lock();
        *self.inner.data.write() = Array::new(self.inner.element_type);
        state.initialized = false;
    }

    /// Shared handle to the output buffer.
    pub fn data(&self) -> SharedArray {
        Arc::clone(&self.inner.data)
    }

    pub fn len(&self) -> usize {
        self.inner.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the whole buffer, as a region does at the end of its step.
    pub fn write<T: Element>(&self, values: &[T]) -> Result<()> {
        if !self.is_initialized() {
            return Err(NetworkError::InvalidState(format!(
                "output '{}' written before initialization",
                self.inner.name
            )));
        }
        let mut data = self.inner.data.write();
        if values.len() != data.len() {
            return Err(NetworkError::InvalidState(format!(
                "output '{}' holds {} elements, got {}",
                self.inner.name,
                data.len(),
                values.len()
            )));
        }
        data.write(0, values)
    }

    pub fn register_link(&self, link_id: LinkId) {
        self.inner.state.lock().links.push(link_id);
    }

    pub fn unregister_link(&self, link_id: &LinkId) {
        let mut state = self.inner.state.lock();
        if let Some(idx) = state.links.iter().position(|id| id == link_id) {
            state.links.remove(idx);
        } else {
            tracing::warn!(
                "[{}] Unregistering unknown link {}",
                self.inner.name,
                link_id
            );
        }
    }

    /// IDs of the links attached to this output, in attachment order.
    pub fn links(&self) -> Vec<LinkId> {
        self.inner.state.lock().links.clone()
    }

    pub(crate) fn downgrade(&self) -> OutputRef {
        OutputRef(Arc::downgrade(&self.inner))
    }
}
