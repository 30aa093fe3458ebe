// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Protocol-level types shared by the gateway, the navigator and the shell.
//!
//! - **NodeId**: the four OPC UA identifier forms with parsing and formatting
//! - **NodeClass**: the closed node class tag and its per-class attribute set
//! - **AttributeId**: the 27 standard attribute kinds and their names
//! - **SecurityMode/Policy**, **UserTokenType**: session negotiation settings
//! - **ClientConfig**: client configuration with builder
//!
//! # Examples
//!
//! ```
//! use opcsh_opcua::types::{AttributeId, ClientConfig, NodeClass, NodeId};
//!
//! let objects: NodeId = "i=85".parse().unwrap();
//! assert_eq!(objects, NodeId::OBJECTS_FOLDER);
//!
//! assert!(NodeClass::Variable.supports(AttributeId::DataType));
//! assert!(!NodeClass::Object.supports(AttributeId::DataType));
//!
//! let config = ClientConfig::builder()
//!     .session_name("inspection")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.browse_concurrency, 1);
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigurationError, OpcUaError, OpcUaResult};

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA node identifier.
///
/// A namespace index plus one of four identifier forms. The string form is
/// `ns=<n>;{i|s|g|b}=<v>`, with the `ns=0;` prefix omitted.
///
/// # Examples
///
/// ```
/// use opcsh_opcua::types::NodeId;
///
/// let numeric = NodeId::numeric(2, 1001);
/// assert_eq!(numeric.to_string(), "ns=2;i=1001");
///
/// let parsed: NodeId = "ns=2;s=Line1.Temperature".parse().unwrap();
/// assert_eq!(parsed.as_string(), Some("Line1.Temperature"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a numeric node ID.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node ID.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    // =========================================================================
    // Well-known nodes
    // =========================================================================

    /// Root folder (`i=84`), the top of every address space.
    pub const ROOT_FOLDER: NodeId = NodeId {
        namespace_index: 0,
        identifier: NodeIdentifier::Numeric(84),
    };

    /// Objects folder (`i=85`).
    pub const OBJECTS_FOLDER: NodeId = NodeId {
        namespace_index: 0,
        identifier: NodeIdentifier::Numeric(85),
    };

    /// Types folder (`i=86`).
    pub const TYPES_FOLDER: NodeId = NodeId {
        namespace_index: 0,
        identifier: NodeIdentifier::Numeric(86),
    };

    /// Views folder (`i=87`).
    pub const VIEWS_FOLDER: NodeId = NodeId {
        namespace_index: 0,
        identifier: NodeIdentifier::Numeric(87),
    };

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns `true` for the null node id (`i=0` in namespace 0).
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && self.identifier == NodeIdentifier::Numeric(0)
    }

    /// Returns the numeric identifier, if any.
    pub fn as_numeric(&self) -> Option<u32> {
        match self.identifier {
            NodeIdentifier::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the string identifier, if any.
    pub fn as_string(&self) -> Option<&str> {
        match &self.identifier {
            NodeIdentifier::String(v) => Some(v),
            _ => None,
        }
    }

    /// Converts to the OPC UA string format.
    pub fn to_opc_string(&self) -> String {
        if self.namespace_index == 0 {
            self.identifier.to_string()
        } else {
            format!("ns={};{}", self.namespace_index, self.identifier)
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::numeric(0, 0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = OpcUaError;

    /// Parses `ns=2;i=1001`, `ns=2;s=Name`, `ns=2;g=<uuid>`, `ns=2;b=<base64>`
    /// or any of those without the `ns=` prefix (namespace 0).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: String| {
            OpcUaError::configuration(ConfigurationError::invalid_node_id(s, reason))
        };

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, id) = rest
                    .split_once(';')
                    .ok_or_else(|| invalid("Missing identifier after namespace".to_string()))?;
                let ns: u16 = ns
                    .parse()
                    .map_err(|_| invalid("Invalid namespace index".to_string()))?;
                (ns, id)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            NodeIdentifier::Numeric(
                id.parse()
                    .map_err(|_| invalid("Invalid numeric identifier".to_string()))?,
            )
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            NodeIdentifier::Guid(
                Uuid::parse_str(id).map_err(|e| invalid(format!("Invalid GUID: {}", e)))?,
            )
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            NodeIdentifier::Opaque(
                BASE64
                    .decode(id)
                    .map_err(|e| invalid(format!("Invalid base64: {}", e)))?,
            )
        } else {
            return Err(invalid(
                "Unknown identifier type. Expected i=, s=, g=, or b=".to_string(),
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// The four OPC UA identifier forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),
    /// String identifier.
    String(String),
    /// GUID identifier.
    Guid(Uuid),
    /// Opaque byte string identifier.
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={}", v),
            Self::String(v) => write!(f, "s={}", v),
            Self::Guid(v) => write!(f, "g={}", v),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// NodeClass
// =============================================================================

/// OPC UA node class.
///
/// `Unspecified` is what a server reports for a node whose class it does not
/// expose; such a node supports only the base attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeClass {
    /// No class reported.
    #[default]
    Unspecified,
    /// Object node.
    Object,
    /// Variable node.
    Variable,
    /// Method node.
    Method,
    /// Object type node.
    ObjectType,
    /// Variable type node.
    VariableType,
    /// Reference type node.
    ReferenceType,
    /// Data type node.
    DataType,
    /// View node.
    View,
}

impl NodeClass {
    /// Every class, `Unspecified` included.
    pub const ALL: [NodeClass; 9] = [
        Self::Unspecified,
        Self::Object,
        Self::Variable,
        Self::Method,
        Self::ObjectType,
        Self::VariableType,
        Self::ReferenceType,
        Self::DataType,
        Self::View,
    ];

    /// Returns the OPC UA bit mask value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Unspecified => 0,
            Self::Object => 1,
            Self::Variable => 2,
            Self::Method => 4,
            Self::ObjectType => 8,
            Self::VariableType => 16,
            Self::ReferenceType => 32,
            Self::DataType => 64,
            Self::View => 128,
        }
    }

    /// Creates from the OPC UA value.
    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|class| class.value() == value)
    }

    /// Returns the symbolic name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::Object => "Object",
            Self::Variable => "Variable",
            Self::Method => "Method",
            Self::ObjectType => "ObjectType",
            Self::VariableType => "VariableType",
            Self::ReferenceType => "ReferenceType",
            Self::DataType => "DataType",
            Self::View => "View",
        }
    }

    /// Returns `true` if nodes of this class carry the given attribute.
    pub fn supports(&self, attribute: AttributeId) -> bool {
        use AttributeId as A;

        if attribute.is_base() {
            return true;
        }

        match self {
            Self::Unspecified => false,
            Self::Object => matches!(attribute, A::EventNotifier),
            Self::Variable => matches!(
                attribute,
                A::Value
                    | A::DataType
                    | A::ValueRank
                    | A::ArrayDimensions
                    | A::AccessLevel
                    | A::UserAccessLevel
                    | A::MinimumSamplingInterval
                    | A::Historizing
                    | A::AccessLevelEx
            ),
            Self::Method => matches!(attribute, A::Executable | A::UserExecutable),
            Self::ObjectType => matches!(attribute, A::IsAbstract),
            Self::VariableType => matches!(
                attribute,
                A::Value | A::DataType | A::ValueRank | A::ArrayDimensions | A::IsAbstract
            ),
            Self::ReferenceType => {
                matches!(attribute, A::IsAbstract | A::Symmetric | A::InverseName)
            }
            Self::DataType => matches!(attribute, A::IsAbstract | A::DataTypeDefinition),
            Self::View => matches!(attribute, A::EventNotifier | A::ContainsNoLoops),
        }
    }

    /// Returns the supported attributes of this class in request order.
    pub fn supported_attributes(&self) -> Vec<AttributeId> {
        AttributeId::REQUEST_ORDER
            .iter()
            .copied()
            .filter(|attribute| self.supports(*attribute))
            .collect()
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// AttributeId
// =============================================================================

/// The standard OPC UA attribute kinds. Variants carry the standard names.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeId {
    NodeId,
    NodeClass,
    BrowseName,
    DisplayName,
    Description,
    WriteMask,
    UserWriteMask,
    IsAbstract,
    Symmetric,
    InverseName,
    ContainsNoLoops,
    EventNotifier,
    Value,
    DataType,
    ValueRank,
    ArrayDimensions,
    AccessLevel,
    UserAccessLevel,
    MinimumSamplingInterval,
    Historizing,
    Executable,
    UserExecutable,
    DataTypeDefinition,
    RolePermissions,
    UserRolePermissions,
    AccessRestrictions,
    AccessLevelEx,
}

/// Name returned for attribute ids outside the known set.
pub const UNKNOWN_ATTRIBUTE_NAME: &str = "Unknown";

impl AttributeId {
    /// The order in which attributes are requested and listed.
    pub const REQUEST_ORDER: [AttributeId; 27] = [
        Self::AccessLevel,
        Self::AccessLevelEx,
        Self::AccessRestrictions,
        Self::ArrayDimensions,
        Self::BrowseName,
        Self::ContainsNoLoops,
        Self::DataType,
        Self::DataTypeDefinition,
        Self::Description,
        Self::DisplayName,
        Self::EventNotifier,
        Self::Executable,
        Self::Historizing,
        Self::InverseName,
        Self::IsAbstract,
        Self::MinimumSamplingInterval,
        Self::NodeClass,
        Self::NodeId,
        Self::RolePermissions,
        Self::Symmetric,
        Self::UserAccessLevel,
        Self::UserExecutable,
        Self::UserRolePermissions,
        Self::UserWriteMask,
        Self::Value,
        Self::ValueRank,
        Self::WriteMask,
    ];

    /// Returns the OPC UA numeric value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::NodeId => 1,
            Self::NodeClass => 2,
            Self::BrowseName => 3,
            Self::DisplayName => 4,
            Self::Description => 5,
            Self::WriteMask => 6,
            Self::UserWriteMask => 7,
            Self::IsAbstract => 8,
            Self::Symmetric => 9,
            Self::InverseName => 10,
            Self::ContainsNoLoops => 11,
            Self::EventNotifier => 12,
            Self::Value => 13,
            Self::DataType => 14,
            Self::ValueRank => 15,
            Self::ArrayDimensions => 16,
            Self::AccessLevel => 17,
            Self::UserAccessLevel => 18,
            Self::MinimumSamplingInterval => 19,
            Self::Historizing => 20,
            Self::Executable => 21,
            Self::UserExecutable => 22,
            Self::DataTypeDefinition => 23,
            Self::RolePermissions => 24,
            Self::UserRolePermissions => 25,
            Self::AccessRestrictions => 26,
            Self::AccessLevelEx => 27,
        }
    }

    /// Creates from the OPC UA numeric value.
    pub fn from_value(value: u32) -> Option<Self> {
        Self::REQUEST_ORDER
            .iter()
            .copied()
            .find(|attribute| attribute.value() == value)
    }

    /// Returns the attribute's standard name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NodeId => "NodeId",
            Self::NodeClass => "NodeClass",
            Self::BrowseName => "BrowseName",
            Self::DisplayName => "DisplayName",
            Self::Description => "Description",
            Self::WriteMask => "WriteMask",
            Self::UserWriteMask => "UserWriteMask",
            Self::IsAbstract => "IsAbstract",
            Self::Symmetric => "Symmetric",
            Self::InverseName => "InverseName",
            Self::ContainsNoLoops => "ContainsNoLoops",
            Self::EventNotifier => "EventNotifier",
            Self::Value => "Value",
            Self::DataType => "DataType",
            Self::ValueRank => "ValueRank",
            Self::ArrayDimensions => "ArrayDimensions",
            Self::AccessLevel => "AccessLevel",
            Self::UserAccessLevel => "UserAccessLevel",
            Self::MinimumSamplingInterval => "MinimumSamplingInterval",
            Self::Historizing => "Historizing",
            Self::Executable => "Executable",
            Self::UserExecutable => "UserExecutable",
            Self::DataTypeDefinition => "DataTypeDefinition",
            Self::RolePermissions => "RolePermissions",
            Self::UserRolePermissions => "UserRolePermissions",
            Self::AccessRestrictions => "AccessRestrictions",
            Self::AccessLevelEx => "AccessLevelEx",
        }
    }

    /// Returns `true` for the attributes every node class carries.
    pub const fn is_base(&self) -> bool {
        matches!(
            self,
            Self::NodeId
                | Self::NodeClass
                | Self::BrowseName
                | Self::DisplayName
                | Self::Description
                | Self::WriteMask
                | Self::UserWriteMask
                | Self::RolePermissions
                | Self::UserRolePermissions
                | Self::AccessRestrictions
        )
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Looks up the name of a raw attribute id, `"Unknown"` when it is not one of
/// the standard kinds.
pub fn attribute_name(value: u32) -> &'static str {
    AttributeId::from_value(value)
        .map(|attribute| attribute.name())
        .unwrap_or(UNKNOWN_ATTRIBUTE_NAME)
}

// =============================================================================
// BrowseDirection
// =============================================================================

/// OPC UA browse direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrowseDirection {
    /// Forward references.
    #[default]
    Forward,
    /// Inverse references.
    Inverse,
    /// Both directions.
    Both,
}

// =============================================================================
// SecurityMode
// =============================================================================

/// OPC UA message security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// Messages are neither signed nor encrypted.
    #[default]
    None,
    /// Messages are signed.
    Sign,
    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

impl SecurityMode {
    /// Returns the display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Sign => "Sign",
            Self::SignAndEncrypt => "SignAndEncrypt",
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SecurityMode {
    type Err = OpcUaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "none" => Ok(Self::None),
            "sign" => Ok(Self::Sign),
            "signandencrypt" | "signencrypt" => Ok(Self::SignAndEncrypt),
            _ => Err(OpcUaError::configuration(ConfigurationError::invalid_security(
                format!("unknown security mode '{}'", s),
            ))),
        }
    }
}

// =============================================================================
// SecurityPolicy
// =============================================================================

/// OPC UA security policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityPolicy {
    /// No security policy.
    #[default]
    None,
    /// Basic128Rsa15 (deprecated).
    Basic128Rsa15,
    /// Basic256 (deprecated).
    Basic256,
    /// Basic256Sha256.
    Basic256Sha256,
    /// Aes128Sha256RsaOaep.
    Aes128Sha256RsaOaep,
    /// Aes256Sha256RsaPss.
    Aes256Sha256RsaPss,
}

impl SecurityPolicy {
    /// Returns the OPC UA policy URI.
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::None => "http://opcfoundation.org/UA/SecurityPolicy#None",
            Self::Basic128Rsa15 => "http://opcfoundation.org/UA/SecurityPolicy#Basic128Rsa15",
            Self::Basic256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256",
            Self::Basic256Sha256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256",
            Self::Aes128Sha256RsaOaep => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep"
            }
            Self::Aes256Sha256RsaPss => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss"
            }
        }
    }

    /// Returns the short name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Basic128Rsa15 => "Basic128Rsa15",
            Self::Basic256 => "Basic256",
            Self::Basic256Sha256 => "Basic256Sha256",
            Self::Aes128Sha256RsaOaep => "Aes128Sha256RsaOaep",
            Self::Aes256Sha256RsaPss => "Aes256Sha256RsaPss",
        }
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SecurityPolicy {
    type Err = OpcUaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "none" => Ok(Self::None),
            "basic128rsa15" => Ok(Self::Basic128Rsa15),
            "basic256" => Ok(Self::Basic256),
            "basic256sha256" => Ok(Self::Basic256Sha256),
            "aes128sha256rsaoaep" => Ok(Self::Aes128Sha256RsaOaep),
            "aes256sha256rsapss" => Ok(Self::Aes256Sha256RsaPss),
            _ => Err(OpcUaError::configuration(ConfigurationError::invalid_security(
                format!("unknown security policy '{}'", s),
            ))),
        }
    }
}

// =============================================================================
// UserTokenType
// =============================================================================

/// How the client authenticates to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserTokenType {
    /// Anonymous authentication.
    #[default]
    Anonymous,

    /// Username and password authentication.
    UserName {
        /// The username.
        username: String,
        /// The password.
        password: String,
    },
}

impl UserTokenType {
    /// Returns `true` if this is anonymous authentication.
    #[inline]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

impl fmt::Display for UserTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::UserName { username, .. } => write!(f, "UserName({})", username),
        }
    }
}

// =============================================================================
// ClientConfig
// =============================================================================

/// The scheme every endpoint URL must use.
pub const ENDPOINT_SCHEME: &str = "opc.tcp://";

/// Returns what is wrong with `endpoint`, or `None` for a usable
/// `opc.tcp://host[:port][/path]` URL.
pub fn endpoint_problem(endpoint: &str) -> Option<&'static str> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Some("Endpoint is empty");
    }
    match endpoint.strip_prefix(ENDPOINT_SCHEME) {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') => None,
        Some(_) => Some("Missing host"),
        None => Some("Endpoint must start with opc.tcp://"),
    }
}

/// Checks that `endpoint` is a usable `opc.tcp://` URL.
pub fn validate_endpoint(endpoint: &str) -> OpcUaResult<()> {
    if endpoint.trim().is_empty() {
        return Err(OpcUaError::configuration(ConfigurationError::missing_field(
            "endpoint",
        )));
    }
    match endpoint_problem(endpoint) {
        Some(reason) => Err(OpcUaError::configuration(
            ConfigurationError::invalid_endpoint(endpoint.trim(), reason),
        )),
        None => Ok(()),
    }
}

/// OPC UA client configuration.
///
/// Describes how sessions are negotiated. The endpoint itself is given per
/// `connect` call, so one configuration serves any number of servers.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use opcsh_opcua::types::{ClientConfig, SecurityMode, SecurityPolicy};
///
/// let config = ClientConfig::builder()
///     .security_mode(SecurityMode::SignAndEncrypt)
///     .security_policy(SecurityPolicy::Basic256Sha256)
///     .session_timeout(Duration::from_secs(30))
///     .trust_all_certificates(true)
///     .build()
///     .unwrap();
/// assert!(config.uses_security());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Application name announced to the server.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Application URI; derived from the name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_uri: Option<String>,

    /// Session name; the application name is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,

    /// Security mode.
    #[serde(default)]
    pub security_mode: SecurityMode,

    /// Security policy.
    #[serde(default)]
    pub security_policy: SecurityPolicy,

    /// User identity.
    #[serde(default)]
    pub user_token: UserTokenType,

    /// Requested session timeout.
    #[serde(default = "default_session_timeout")]
    #[serde(with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Timeout for a single request.
    #[serde(default = "default_request_timeout")]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// PKI directory for client and trusted server certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pki_dir: Option<String>,

    /// Trust every server certificate without checking.
    #[serde(default)]
    pub trust_all_certificates: bool,

    /// Number of per-child attribute reads a browse may have in flight.
    #[serde(default = "default_browse_concurrency")]
    pub browse_concurrency: usize,
}

fn default_application_name() -> String {
    "opcsh".to_string()
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_browse_concurrency() -> usize {
    1
}

impl ClientConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validates this configuration.
    pub fn validate(&self) -> OpcUaResult<()> {
        if self.application_name.trim().is_empty() {
            return Err(OpcUaError::configuration(ConfigurationError::missing_field(
                "application_name",
            )));
        }

        if self.security_mode != SecurityMode::None && self.security_policy == SecurityPolicy::None
        {
            return Err(OpcUaError::configuration(ConfigurationError::invalid_security(
                "Security mode requires a security policy other than None",
            )));
        }

        if self.security_mode == SecurityMode::None && self.security_policy != SecurityPolicy::None
        {
            return Err(OpcUaError::configuration(ConfigurationError::invalid_security(
                "Security policy requires a security mode other than None",
            )));
        }

        if self.session_timeout.is_zero() {
            return Err(OpcUaError::configuration(ConfigurationError::invalid_timeout(
                self.session_timeout,
                "Session timeout must be greater than 0",
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(OpcUaError::configuration(ConfigurationError::invalid_timeout(
                self.request_timeout,
                "Request timeout must be greater than 0",
            )));
        }

        if self.browse_concurrency == 0 {
            return Err(OpcUaError::configuration(ConfigurationError::invalid_value(
                "browse_concurrency",
                "must be at least 1",
            )));
        }

        Ok(())
    }

    /// Returns the effective application URI.
    pub fn effective_application_uri(&self) -> String {
        self.application_uri.clone().unwrap_or_else(|| {
            format!("urn:opcsh:{}", self.application_name.replace(' ', ""))
        })
    }

    /// Session timeout in the protocol's millisecond field, saturating at
    /// `u32::MAX`.
    pub fn session_timeout_millis(&self) -> u32 {
        u32::try_from(self.session_timeout.as_millis()).unwrap_or(u32::MAX)
    }

    /// Returns the effective session name.
    pub fn effective_session_name(&self) -> &str {
        self.session_name.as_deref().unwrap_or(&self.application_name)
    }

    /// Returns `true` if this configuration uses message security.
    #[inline]
    pub fn uses_security(&self) -> bool {
        self.security_mode != SecurityMode::None
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            application_name: default_application_name(),
            application_uri: None,
            session_name: None,
            security_mode: SecurityMode::default(),
            security_policy: SecurityPolicy::default(),
            user_token: UserTokenType::default(),
            session_timeout: default_session_timeout(),
            request_timeout: default_request_timeout(),
            pki_dir: None,
            trust_all_certificates: false,
            browse_concurrency: default_browse_concurrency(),
        }
    }
}

// =============================================================================
// ClientConfigBuilder
// =============================================================================

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Sets the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.config.application_name = name.into();
        self
    }

    /// Sets the application URI.
    pub fn application_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.application_uri = Some(uri.into());
        self
    }

    /// Sets the session name.
    pub fn session_name(mut self, name: impl Into<String>) -> Self {
        self.config.session_name = Some(name.into());
        self
    }

    /// Sets the security mode.
    pub fn security_mode(mut self, mode: SecurityMode) -> Self {
        self.config.security_mode = mode;
        self
    }

    /// Sets the security policy.
    pub fn security_policy(mut self, policy: SecurityPolicy) -> Self {
        self.config.security_policy = policy;
        self
    }

    /// Uses username/password authentication.
    pub fn username(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.user_token = UserTokenType::UserName {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Sets the session timeout.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.config.session_timeout = timeout;
        self
    }

    /// Sets the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sets the PKI directory.
    pub fn pki_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.pki_dir = Some(dir.into());
        self
    }

    /// Trusts every server certificate.
    pub fn trust_all_certificates(mut self, trust: bool) -> Self {
        self.config.trust_all_certificates = trust;
        self
    }

    /// Sets how many per-child reads a browse may run at once.
    pub fn browse_concurrency(mut self, limit: usize) -> Self {
        self.config.browse_concurrency = limit;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> OpcUaResult<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// Serde Helpers
// =============================================================================

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime::format_duration(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
