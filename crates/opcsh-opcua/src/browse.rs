// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Browse parameters and the browsing interface the navigator depends on.
//!
//! ```text
//! Navigator ──► NodeBrowser (trait) ◄── SessionGateway
//!                                           │
//!                                           ▼
//!                                     OpcUaSession
//! ```

use async_trait::async_trait;

use crate::client::BrowseRequest;
use crate::error::OpcUaResult;
use crate::model::Node;
use crate::types::{BrowseDirection, NodeClass, NodeId, NodeIdentifier};

// =============================================================================
// Standard Reference Type Node IDs
// =============================================================================

/// Standard OPC UA reference type node IDs.
pub mod reference_types {
    use super::{NodeId, NodeIdentifier};

    const fn ns0(value: u32) -> NodeId {
        NodeId {
            namespace_index: 0,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// HierarchicalReferences (abstract), i=33.
    pub const HIERARCHICAL_REFERENCES: NodeId = ns0(33);

    /// Organizes, i=35.
    pub const ORGANIZES: NodeId = ns0(35);
}

// =============================================================================
// BrowseOptions
// =============================================================================

/// Options for a browse call.
///
/// The default follows forward hierarchical references (subtypes included)
/// and accepts every node class.
///
/// ```
/// use opcsh_opcua::browse::BrowseOptions;
/// use opcsh_opcua::types::NodeClass;
///
/// assert_eq!(BrowseOptions::default().node_class_mask(), 0xFF);
///
/// let options = BrowseOptions::default().with_node_classes(vec![NodeClass::Variable]);
/// assert_eq!(options.node_class_mask(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseOptions {
    /// Browse direction.
    pub direction: BrowseDirection,

    /// Reference type to follow.
    pub reference_type_id: NodeId,

    /// Include subtypes of the reference type.
    pub include_subtypes: bool,

    /// Node classes to return.
    pub node_classes: Vec<NodeClass>,
}

impl Default for BrowseOptions {
    fn default() -> Self {
        Self {
            direction: BrowseDirection::Forward,
            reference_type_id: reference_types::HIERARCHICAL_REFERENCES,
            include_subtypes: true,
            node_classes: NodeClass::ALL.to_vec(),
        }
    }
}

impl BrowseOptions {
    /// Restricts the node classes.
    pub fn with_node_classes(mut self, classes: Vec<NodeClass>) -> Self {
        self.node_classes = classes;
        self
    }

    /// Sets the reference type.
    pub fn with_reference_type(mut self, reference_type_id: NodeId) -> Self {
        self.reference_type_id = reference_type_id;
        self
    }

    /// Returns the node class filter as a bit mask.
    pub fn node_class_mask(&self) -> u32 {
        self.node_classes
            .iter()
            .fold(0, |mask, class| mask | class.value())
    }

    /// Builds the transport request for `node_id`.
    pub fn to_request(&self, node_id: &NodeId) -> BrowseRequest {
        BrowseRequest {
            node_id: node_id.clone(),
            direction: self.direction,
            reference_type_id: self.reference_type_id.clone(),
            include_subtypes: self.include_subtypes,
            node_class_mask: self.node_class_mask(),
        }
    }
}

// =============================================================================
// NodeBrowser Trait
// =============================================================================

/// Read and browse access to an address space.
///
/// Both operations are all-or-nothing: they return complete nodes or an
/// error, never partially populated results.
#[async_trait]
pub trait NodeBrowser: Send + Sync {
    /// Reads one node with its full attribute set.
    async fn read_node(&self, node_id: &NodeId) -> OpcUaResult<Node>;

    /// Lists the children of a node, each with its full attribute set, in
    /// server order.
    async fn browse(&self, node_id: &NodeId) -> OpcUaResult<Vec<Node>>;
}

// =============================================================================
// Tests
// =============================================================================
