// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Node and attribute records.
//!
//! These are plain values produced by the gateway on every round-trip. They
//! hold no session reference and never change after construction; a refresh
//! builds new ones.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;

use crate::client::{status, OpcUaValue};
use crate::types::{AttributeId, NodeClass, NodeId};

// =============================================================================
// AttributeValue
// =============================================================================

/// The decoded value of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// No value (null, or the server declined this attribute).
    Empty,
    /// A built-in scalar.
    Scalar(OpcUaValue),
    /// An array, element by element.
    Array(Vec<AttributeValue>),
    /// A reference to another node.
    NodeReference(NodeId),
    /// A structure the client keeps in encoded form.
    Structured {
        /// Encoding node of the structure.
        type_id: NodeId,
        /// Encoded body.
        body: Vec<u8>,
    },
    /// A node class, resolved from its raw integer.
    NodeClass(NodeClass),
    /// A data type reference, resolved to the type's display name.
    DataType(ResolvedDataType),
}

impl AttributeValue {
    /// Returns `true` for [`AttributeValue::Empty`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<OpcUaValue> for AttributeValue {
    fn from(value: OpcUaValue) -> Self {
        match value {
            OpcUaValue::Null => Self::Empty,
            OpcUaValue::NodeId(id) => Self::NodeReference(id),
            OpcUaValue::ExtensionObject { type_id, body } => Self::Structured { type_id, body },
            OpcUaValue::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            scalar => Self::Scalar(scalar),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Scalar(value) => write!(f, "{}", value),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::NodeReference(id) => write!(f, "{}", id),
            Self::Structured { type_id, body } => write!(f, "{}:{}", type_id, BASE64.encode(body)),
            Self::NodeClass(class) => write!(f, "{}", class),
            Self::DataType(data_type) => write!(f, "{}", data_type.display_name),
        }
    }
}

/// A data type node reference together with the type's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDataType {
    /// The data type node.
    pub id: NodeId,
    /// Its display name.
    pub display_name: String,
}

// =============================================================================
// Attribute
// =============================================================================

/// One attribute of a node as read from the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    id: u32,
    name: &'static str,
    value: AttributeValue,
    status: u32,
}

impl Attribute {
    /// Creates an attribute with a good status.
    pub fn new(id: AttributeId, value: AttributeValue) -> Self {
        Self::with_status(id, value, status::GOOD)
    }

    /// Creates an attribute with the status the server returned for it.
    pub fn with_status(id: AttributeId, value: AttributeValue, status: u32) -> Self {
        Self {
            id: id.value(),
            name: id.name(),
            value,
            status,
        }
    }

    /// Raw attribute id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Typed attribute id.
    pub fn attribute_id(&self) -> Option<AttributeId> {
        AttributeId::from_value(self.id)
    }

    /// Standard attribute name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The value.
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Per-attribute status code.
    pub fn status(&self) -> u32 {
        self.status
    }

    /// Returns `true` if the server produced a value for this attribute.
    pub fn is_good(&self) -> bool {
        !status::is_bad(self.status)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

// =============================================================================
// Node
// =============================================================================

/// One node of the server's address space with its full attribute set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    id: NodeId,
    display_name: String,
    node_class: NodeClass,
    attributes: Vec<Attribute>,
}

impl Node {
    /// Creates a node.
    pub fn new(
        id: NodeId,
        display_name: impl Into<String>,
        node_class: NodeClass,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            node_class,
            attributes,
        }
    }

    /// Server-assigned identifier.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Human-readable label.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Node class.
    pub fn node_class(&self) -> NodeClass {
        self.node_class
    }

    /// Attributes in request order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up one attribute.
    pub fn attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.id == id.value())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.display_name, self.id, self.node_class)
    }
}

// =============================================================================
// Tests
// =============================================================================
