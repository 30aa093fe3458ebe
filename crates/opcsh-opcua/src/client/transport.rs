// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA transport abstraction layer.
//!
//! The gateway never talks to the network directly. It asks an
//! [`OpcUaConnector`] for a session and then drives that [`OpcUaSession`]
//! with batched reads, single browse pages and writes. The real backend is
//! built on the `opcua` crate; tests plug in an in-memory address space.

use std::fmt;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;

use crate::error::OpcUaResult;
use crate::types::{AttributeId, BrowseDirection, ClientConfig, NodeId};

// =============================================================================
// Status Codes
// =============================================================================

/// Well-known OPC UA status codes.
pub mod status {
    /// Good.
    pub const GOOD: u32 = 0x0000_0000;
    /// The node id refers to a node that does not exist.
    pub const BAD_NODE_ID_UNKNOWN: u32 = 0x8034_0000;
    /// The attribute is not supported for the specified node.
    pub const BAD_ATTRIBUTE_ID_INVALID: u32 = 0x8035_0000;
    /// The user does not have permission to perform the operation.
    pub const BAD_USER_ACCESS_DENIED: u32 = 0x801F_0000;
    /// The continuation point is no longer valid.
    pub const BAD_CONTINUATION_POINT_INVALID: u32 = 0x804A_0000;
    /// Writing is not supported.
    pub const BAD_NOT_WRITABLE: u32 = 0x803B_0000;

    /// Returns `true` if the severity bits mark the code as bad.
    #[inline]
    pub const fn is_bad(code: u32) -> bool {
        code & 0x8000_0000 != 0
    }

    /// Returns `true` if the severity bits mark the code as uncertain.
    #[inline]
    pub const fn is_uncertain(code: u32) -> bool {
        code & 0x4000_0000 != 0 && code & 0x8000_0000 == 0
    }
}

// =============================================================================
// OpcUaValue
// =============================================================================

/// A decoded OPC UA variant as delivered by the transport.
///
/// Built-in scalars map one to one; structured values the client cannot decode
/// stay as an [`OpcUaValue::ExtensionObject`] with their encoded body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OpcUaValue {
    /// Boolean value.
    Boolean(bool),
    /// Signed byte.
    SByte(i8),
    /// Unsigned byte.
    Byte(u8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit double.
    Double(f64),
    /// String value.
    String(String),
    /// Date/time value.
    DateTime(chrono::DateTime<chrono::Utc>),
    /// GUID value.
    Guid(uuid::Uuid),
    /// Byte string.
    ByteString(Vec<u8>),
    /// Localized text.
    LocalizedText {
        /// Locale, empty when the server sent none.
        locale: String,
        /// The text.
        text: String,
    },
    /// Qualified name.
    QualifiedName {
        /// Namespace index of the name.
        namespace_index: u16,
        /// The name.
        name: String,
    },
    /// Reference to another node.
    NodeId(NodeId),
    /// Status code.
    StatusCode(u32),
    /// Encoded structure.
    ExtensionObject {
        /// Encoding node of the structure.
        type_id: NodeId,
        /// Encoded body.
        body: Vec<u8>,
    },
    /// Array of values.
    Array(Vec<OpcUaValue>),
    /// Null value.
    Null,
}

impl OpcUaValue {
    /// Creates a localized text without locale.
    pub fn text(text: impl Into<String>) -> Self {
        Self::LocalizedText {
            locale: String::new(),
            text: text.into(),
        }
    }

    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to get the value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::SByte(v) => Some(*v as i64),
            Self::Byte(v) => Some(*v as i64),
            Self::Int16(v) => Some(*v as i64),
            Self::UInt16(v) => Some(*v as i64),
            Self::Int32(v) => Some(*v as i64),
            Self::UInt32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the text of a string-like value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            Self::LocalizedText { text, .. } => Some(text),
            Self::QualifiedName { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the node id of a node reference value.
    pub fn as_node_id(&self) -> Option<&NodeId> {
        match self {
            Self::NodeId(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for OpcUaValue {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for OpcUaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::SByte(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Guid(v) => write!(f, "{}", v),
            Self::ByteString(v) => write!(f, "{}", BASE64.encode(v)),
            Self::LocalizedText { text, .. } => write!(f, "{}", text),
            Self::QualifiedName {
                namespace_index: 0,
                name,
            } => write!(f, "{}", name),
            Self::QualifiedName {
                namespace_index,
                name,
            } => write!(f, "{}:{}", namespace_index, name),
            Self::NodeId(v) => write!(f, "{}", v),
            Self::StatusCode(v) => write!(f, "0x{:08X}", v),
            Self::ExtensionObject { type_id, body } => {
                write!(f, "{}:{}", type_id, BASE64.encode(body))
            }
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
            Self::Null => write!(f, "null"),
        }
    }
}

// =============================================================================
// Read
// =============================================================================

/// One entry of a batched read: a node and the attribute to read from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadRequest {
    /// Node to read.
    pub node_id: NodeId,
    /// Attribute to read.
    pub attribute_id: AttributeId,
}

impl ReadRequest {
    /// Creates a read request.
    pub fn new(node_id: NodeId, attribute_id: AttributeId) -> Self {
        Self {
            node_id,
            attribute_id,
        }
    }
}

/// Result of one entry of a batched read.
#[derive(Debug, Clone)]
pub struct ReadResult {
    /// The value read, if any.
    pub value: Option<OpcUaValue>,

    /// Status code for this entry.
    pub status_code: u32,

    /// Server timestamp.
    pub server_timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// Source timestamp.
    pub source_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl ReadResult {
    /// Creates a successful read result.
    pub fn success(value: OpcUaValue) -> Self {
        Self {
            value: Some(value),
            status_code: status::GOOD,
            server_timestamp: Some(chrono::Utc::now()),
            source_timestamp: None,
        }
    }

    /// Creates a failed read result.
    pub fn failure(status_code: u32) -> Self {
        Self {
            value: None,
            status_code,
            server_timestamp: Some(chrono::Utc::now()),
            source_timestamp: None,
        }
    }

    /// Returns `true` if the status is good.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.status_code == status::GOOD
    }

    /// Returns `true` if the status is bad.
    #[inline]
    pub fn is_bad(&self) -> bool {
        status::is_bad(self.status_code)
    }
}

// =============================================================================
// WriteResult
// =============================================================================

/// Result of a single-attribute write.
#[derive(Debug, Clone)]
pub struct WriteResult {
    /// The node that was written.
    pub node_id: NodeId,

    /// Status code of the write.
    pub status_code: u32,
}

impl WriteResult {
    /// Creates a successful write result.
    pub fn success(node_id: NodeId) -> Self {
        Self {
            node_id,
            status_code: status::GOOD,
        }
    }

    /// Creates a failed write result.
    pub fn failure(node_id: NodeId, status_code: u32) -> Self {
        Self {
            node_id,
            status_code,
        }
    }

    /// Returns `true` if the write was successful.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.status_code == status::GOOD
    }
}

// =============================================================================
// Browse
// =============================================================================

/// Parameters of a single browse call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseRequest {
    /// Node whose references are followed.
    pub node_id: NodeId,
    /// Direction of the references.
    pub direction: BrowseDirection,
    /// Reference type to follow.
    pub reference_type_id: NodeId,
    /// Whether subtypes of the reference type are followed too.
    pub include_subtypes: bool,
    /// Node class filter (bit mask, 0 = all).
    pub node_class_mask: u32,
}

/// A reference returned by a browse call.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseResult {
    /// Target node of the reference.
    pub node_id: NodeId,

    /// Browse name of the target.
    pub browse_name: String,

    /// Display name of the target.
    pub display_name: String,

    /// Node class of the target.
    pub node_class: u32,

    /// Reference type (e.g., HasComponent, Organizes).
    pub reference_type: Option<NodeId>,

    /// Type definition of the target.
    pub type_definition: Option<NodeId>,
}

/// One page of browse results.
#[derive(Debug, Clone, Default)]
pub struct BrowsePage {
    /// References in server order.
    pub references: Vec<BrowseResult>,

    /// Set when the server holds more references for this browse.
    pub continuation_point: Option<Vec<u8>>,
}

impl BrowsePage {
    /// Creates a final page.
    pub fn complete(references: Vec<BrowseResult>) -> Self {
        Self {
            references,
            continuation_point: None,
        }
    }

    /// Returns `true` if more pages follow.
    #[inline]
    pub fn has_more(&self) -> bool {
        self.continuation_point
            .as_ref()
            .is_some_and(|point| !point.is_empty())
    }
}

// =============================================================================
// OpcUaSession / OpcUaConnector Traits
// =============================================================================

/// A live protocol session.
///
/// Every call is one round-trip. Implementations never retry; a failure is
/// returned as-is and the session stays usable or not at the server's whim.
#[async_trait]
pub trait OpcUaSession: Send + Sync {
    /// Reads a batch of attributes. The result has one entry per request, in
    /// request order.
    async fn read(&self, requests: &[ReadRequest]) -> OpcUaResult<Vec<ReadResult>>;

    /// Browses one node and returns the first page of references.
    async fn browse(&self, request: &BrowseRequest) -> OpcUaResult<BrowsePage>;

    /// Fetches the next page for a continuation point.
    async fn browse_next(&self, continuation_point: &[u8]) -> OpcUaResult<BrowsePage>;

    /// Writes one attribute.
    async fn write(
        &self,
        node_id: &NodeId,
        attribute_id: AttributeId,
        value: OpcUaValue,
    ) -> OpcUaResult<WriteResult>;

    /// Returns the endpoint URL the session was established against.
    fn endpoint_url(&self) -> &str;

    /// Closes the session.
    async fn close(&mut self) -> OpcUaResult<()>;
}

/// Negotiates transport, security and session parameters with a server.
#[async_trait]
pub trait OpcUaConnector: Send + Sync {
    /// Opens a session against `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns a connection error if discovery, the secure channel or session
    /// activation fails.
    async fn connect(
        &self,
        endpoint: &str,
        config: &ClientConfig,
    ) -> OpcUaResult<Box<dyn OpcUaSession>>;

    /// Returns the connector name for logging.
    fn name(&self) -> &'static str;
}

// =============================================================================
// Tests
// =============================================================================
