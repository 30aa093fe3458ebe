// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA transport backed by the `opcua` crate.
//!
//! The `opcua` client is synchronous. Every call runs on tokio's blocking pool
//! so the shell's runtime never stalls on the network.
//!
//! # Example
//!
//! ```rust,ignore
//! use opcsh_opcua::client::RealOpcUaConnector;
//! use opcsh_opcua::{ClientConfig, SessionGateway};
//!
//! let mut gateway = SessionGateway::new(RealOpcUaConnector::new(), ClientConfig::default());
//! let info = gateway.connect("opc.tcp://localhost:4840").await?;
//! println!("connected to {}", info.endpoint);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use opcua::client::prelude::{
    BrowseDescription, BrowseDescriptionResultMask, Client, ClientBuilder, IdentityToken,
    ReadValueId, Session, TimestampsToReturn, WriteValue,
};
use opcua::client::prelude::{AttributeService, ViewService};
use opcua::client::prelude::SecurityPolicy as UaSecurityPolicy;
use opcua::sync::RwLock as OpcUaRwLock;
use opcua::types as ua;

use crate::client::transport::{
    status, BrowsePage, BrowseRequest, BrowseResult, OpcUaConnector, OpcUaSession, OpcUaValue,
    ReadRequest, ReadResult, WriteResult,
};
use crate::error::{
    BrowseError, ConfigurationError, ConnectionError, OpcUaError, OpcUaResult, OperationError,
};
use crate::types::{
    AttributeId, BrowseDirection, ClientConfig, NodeId, NodeIdentifier, SecurityMode,
    SecurityPolicy, UserTokenType,
};

// =============================================================================
// RealOpcUaConnector
// =============================================================================

/// Opens sessions with the `opcua` client stack.
#[derive(Debug, Default, Clone)]
pub struct RealOpcUaConnector;

impl RealOpcUaConnector {
    /// Creates a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OpcUaConnector for RealOpcUaConnector {
    async fn connect(
        &self,
        endpoint: &str,
        config: &ClientConfig,
    ) -> OpcUaResult<Box<dyn OpcUaSession>> {
        let endpoint = endpoint.to_string();
        let config = config.clone();

        let (session, endpoint_url) =
            tokio::task::spawn_blocking(move || open_session(&endpoint, &config))
                .await
                .map_err(|e| {
                    OpcUaError::connection(ConnectionError::closed(format!(
                        "connect task failed: {}",
                        e
                    )))
                })??;

        Ok(Box::new(RealOpcUaSession {
            session,
            endpoint_url,
        }))
    }

    fn name(&self) -> &'static str {
        "opcua"
    }
}

fn build_client(endpoint: &str, config: &ClientConfig) -> OpcUaResult<Client> {
    let mut builder = ClientBuilder::new()
        .application_name(&config.application_name)
        .application_uri(&config.effective_application_uri())
        .session_retry_limit(0)
        .session_timeout(config.session_timeout_millis());

    if let Some(pki_dir) = &config.pki_dir {
        builder = builder.pki_dir(pki_dir);
    }

    if config.trust_all_certificates {
        builder = builder.trust_server_certs(true);
    }

    builder.client().ok_or_else(|| {
        OpcUaError::configuration(ConfigurationError::invalid_value(
            "client",
            format!(
                "failed to build OPC UA client for {} (check pki_dir and application settings)",
                endpoint
            ),
        ))
    })
}

fn open_session(
    endpoint: &str,
    config: &ClientConfig,
) -> OpcUaResult<(Arc<OpcUaRwLock<Session>>, String)> {
    let mut client = build_client(endpoint, config)?;

    let endpoints = client.get_server_endpoints_from_url(endpoint).map_err(|e| {
        OpcUaError::connection(ConnectionError::refused_with_reason(
            endpoint,
            format!("endpoint discovery failed: {}", e),
        ))
    })?;

    if endpoints.is_empty() {
        return Err(ConnectionError::endpoint_not_found(endpoint).into());
    }

    let security_policy = to_opcua_security_policy(config.security_policy);
    let security_mode = to_opcua_security_mode(config.security_mode);

    let selected = endpoints
        .iter()
        .find(|e| {
            e.security_policy_uri.as_ref() == security_policy.to_uri()
                && e.security_mode == security_mode
        })
        .cloned()
        .ok_or_else(|| {
            OpcUaError::connection(ConnectionError::no_suitable_endpoint(format!(
                "{}/{}",
                config.security_mode, config.security_policy
            )))
        })?;

    let endpoint_url = selected.endpoint_url.as_ref().to_string();
    debug!(
        endpoint = %endpoint_url,
        security_policy = %selected.security_policy_uri,
        security_mode = ?selected.security_mode,
        "Selected endpoint"
    );

    let session = client
        .connect_to_endpoint(selected, identity_token(&config.user_token))
        .map_err(|e| {
            OpcUaError::connection(ConnectionError::refused_with_reason(
                endpoint,
                e.to_string(),
            ))
        })?;

    let endpoint_url = if endpoint_url.is_empty() {
        endpoint.to_string()
    } else {
        endpoint_url
    };
    Ok((session, endpoint_url))
}

// =============================================================================
// RealOpcUaSession
// =============================================================================

/// A session opened by [`RealOpcUaConnector`].
pub struct RealOpcUaSession {
    session: Arc<OpcUaRwLock<Session>>,
    endpoint_url: String,
}

impl RealOpcUaSession {
    /// Runs a blocking session call off the async runtime.
    async fn call<T, F>(&self, what: &'static str, f: F) -> OpcUaResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Session) -> OpcUaResult<T> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let session = session.read();
            f(&session)
        })
        .await
        .map_err(|e| {
            OpcUaError::connection(ConnectionError::closed(format!("{} task failed: {}", what, e)))
        })?
    }
}

#[async_trait]
impl OpcUaSession for RealOpcUaSession {
    async fn read(&self, requests: &[ReadRequest]) -> OpcUaResult<Vec<ReadResult>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let label = requests[0].node_id.to_string();
        let read_value_ids: Vec<ReadValueId> = requests
            .iter()
            .map(|request| ReadValueId {
                node_id: to_opcua_node_id(&request.node_id),
                attribute_id: request.attribute_id.value(),
                index_range: ua::UAString::null(),
                data_encoding: ua::QualifiedName::null(),
            })
            .collect();

        trace!(node_id = %label, count = read_value_ids.len(), "Reading attributes");

        self.call("read", move |session| {
            let values = session
                .read(&read_value_ids, TimestampsToReturn::Both, 0.0)
                .map_err(|e| {
                    OpcUaError::read_failed(label, format!("Read failed: {}", e))
                })?;
            Ok(values.iter().map(from_data_value).collect())
        })
        .await
    }

    async fn browse(&self, request: &BrowseRequest) -> OpcUaResult<BrowsePage> {
        let node_label = request.node_id.to_string();
        let description = BrowseDescription {
            node_id: to_opcua_node_id(&request.node_id),
            browse_direction: match request.direction {
                BrowseDirection::Forward => ua::BrowseDirection::Forward,
                BrowseDirection::Inverse => ua::BrowseDirection::Inverse,
                BrowseDirection::Both => ua::BrowseDirection::Both,
            },
            reference_type_id: to_opcua_node_id(&request.reference_type_id),
            include_subtypes: request.include_subtypes,
            node_class_mask: request.node_class_mask,
            result_mask: BrowseDescriptionResultMask::all().bits(),
        };

        trace!(node_id = %node_label, "Browsing node");

        self.call("browse", move |session| {
            let results = session.browse(&[description]).map_err(|e| {
                OpcUaError::browse_failed(node_label.clone(), format!("Browse failed: {}", e))
            })?;
            first_page(&node_label, results)
        })
        .await
    }

    async fn browse_next(&self, continuation_point: &[u8]) -> OpcUaResult<BrowsePage> {
        let point = ua::ByteString::from(continuation_point);

        self.call("browse_next", move |session| {
            let results = session.browse_next(false, &[point]).map_err(|e| {
                OpcUaError::browse_failed("continuation", format!("BrowseNext failed: {}", e))
            })?;
            first_page("continuation", results)
        })
        .await
    }

    async fn write(
        &self,
        node_id: &NodeId,
        attribute_id: AttributeId,
        value: OpcUaValue,
    ) -> OpcUaResult<WriteResult> {
        let our_node_id = node_id.clone();
        let write_value = WriteValue {
            node_id: to_opcua_node_id(node_id),
            attribute_id: attribute_id.value(),
            index_range: ua::UAString::null(),
            value: ua::DataValue::new_now(to_opcua_variant(&value)),
        };

        trace!(node_id = %node_id, attribute = %attribute_id, "Writing attribute");

        self.call("write", move |session| {
            let results = session.write(&[write_value]).map_err(|e| {
                OpcUaError::write_failed(our_node_id.to_string(), format!("Write failed: {}", e))
            })?;
            Ok(match results.first() {
                Some(code) if code.is_good() => WriteResult::success(our_node_id),
                Some(code) => WriteResult::failure(our_node_id, code.bits()),
                None => WriteResult::failure(our_node_id, 0x8000_0000),
            })
        })
        .await
    }

    fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    async fn close(&mut self) -> OpcUaResult<()> {
        self.call("disconnect", |session| {
            session.disconnect();
            Ok(())
        })
        .await
    }
}

fn first_page(node_label: &str, results: Option<Vec<ua::BrowseResult>>) -> OpcUaResult<BrowsePage> {
    let Some(result) = results.and_then(|results| results.into_iter().next()) else {
        return Err(OpcUaError::browse_failed(node_label, "No browse results returned"));
    };

    let code = result.status_code.bits();
    if code == status::BAD_NODE_ID_UNKNOWN {
        return Err(BrowseError::node_not_found(node_label).into());
    }
    if status::is_bad(code) {
        return Err(OperationError::bad_status(node_label, code).into());
    }

    let references = result
        .references
        .unwrap_or_default()
        .iter()
        .map(|r| BrowseResult {
            node_id: from_opcua_node_id(&r.node_id.node_id),
            browse_name: r.browse_name.name.as_ref().to_string(),
            display_name: r.display_name.text.as_ref().to_string(),
            node_class: r.node_class as u32,
            reference_type: Some(from_opcua_node_id(&r.reference_type_id)),
            type_definition: Some(from_opcua_node_id(&r.type_definition.node_id)),
        })
        .collect();

    let continuation_point = result
        .continuation_point
        .value
        .filter(|point| !point.is_empty());

    Ok(BrowsePage {
        references,
        continuation_point,
    })
}

// =============================================================================
// Conversions
// =============================================================================

fn to_opcua_security_policy(policy: SecurityPolicy) -> UaSecurityPolicy {
    match policy {
        SecurityPolicy::None => UaSecurityPolicy::None,
        SecurityPolicy::Basic128Rsa15 => UaSecurityPolicy::Basic128Rsa15,
        SecurityPolicy::Basic256 => UaSecurityPolicy::Basic256,
        SecurityPolicy::Basic256Sha256 => UaSecurityPolicy::Basic256Sha256,
        SecurityPolicy::Aes128Sha256RsaOaep => UaSecurityPolicy::Aes128Sha256RsaOaep,
        SecurityPolicy::Aes256Sha256RsaPss => UaSecurityPolicy::Aes256Sha256RsaPss,
    }
}

fn to_opcua_security_mode(mode: SecurityMode) -> ua::MessageSecurityMode {
    match mode {
        SecurityMode::None => ua::MessageSecurityMode::None,
        SecurityMode::Sign => ua::MessageSecurityMode::Sign,
        SecurityMode::SignAndEncrypt => ua::MessageSecurityMode::SignAndEncrypt,
    }
}

fn identity_token(token: &UserTokenType) -> IdentityToken {
    match token {
        UserTokenType::Anonymous => IdentityToken::Anonymous,
        UserTokenType::UserName { username, password } => {
            IdentityToken::UserName(username.clone(), password.clone())
        }
    }
}

fn to_opcua_node_id(node_id: &NodeId) -> ua::NodeId {
    let ns = node_id.namespace_index;
    match &node_id.identifier {
        NodeIdentifier::Numeric(v) => ua::NodeId::new(ns, *v),
        NodeIdentifier::String(v) => ua::NodeId::new(ns, ua::UAString::from(v.as_str())),
        NodeIdentifier::Guid(v) => ua::NodeId::new(ns, ua::Guid::from(*v)),
        NodeIdentifier::Opaque(v) => ua::NodeId::new(ns, ua::ByteString::from(v.as_slice())),
    }
}

fn from_opcua_node_id(node_id: &ua::NodeId) -> NodeId {
    let ns = node_id.namespace;
    match &node_id.identifier {
        ua::Identifier::Numeric(v) => NodeId::numeric(ns, *v),
        ua::Identifier::String(v) => NodeId::string(ns, v.as_ref()),
        ua::Identifier::Guid(v) => NodeId::guid(ns, uuid::Uuid::from_bytes(*v.as_bytes())),
        ua::Identifier::ByteString(v) => NodeId::opaque(ns, v.value.clone().unwrap_or_default()),
    }
}

fn from_opcua_datetime(value: &ua::DateTime) -> chrono::DateTime<chrono::Utc> {
    let dt = value.as_chrono();
    chrono::DateTime::from_timestamp(dt.timestamp(), dt.timestamp_subsec_nanos())
        .unwrap_or_else(chrono::Utc::now)
}

fn from_data_value(data_value: &ua::DataValue) -> ReadResult {
    let status_code = data_value
        .status
        .as_ref()
        .map(|s| s.bits())
        .unwrap_or(status::GOOD);

    ReadResult {
        value: data_value.value.as_ref().map(from_opcua_variant),
        status_code,
        server_timestamp: data_value.server_timestamp.as_ref().map(from_opcua_datetime),
        source_timestamp: data_value.source_timestamp.as_ref().map(from_opcua_datetime),
    }
}

fn from_opcua_variant(variant: &ua::Variant) -> OpcUaValue {
    use ua::Variant;

    match variant {
        Variant::Empty => OpcUaValue::Null,
        Variant::Boolean(v) => OpcUaValue::Boolean(*v),
        Variant::SByte(v) => OpcUaValue::SByte(*v),
        Variant::Byte(v) => OpcUaValue::Byte(*v),
        Variant::Int16(v) => OpcUaValue::Int16(*v),
        Variant::UInt16(v) => OpcUaValue::UInt16(*v),
        Variant::Int32(v) => OpcUaValue::Int32(*v),
        Variant::UInt32(v) => OpcUaValue::UInt32(*v),
        Variant::Int64(v) => OpcUaValue::Int64(*v),
        Variant::UInt64(v) => OpcUaValue::UInt64(*v),
        Variant::Float(v) => OpcUaValue::Float(*v),
        Variant::Double(v) => OpcUaValue::Double(*v),
        Variant::String(v) => OpcUaValue::String(v.as_ref().to_string()),
        Variant::DateTime(v) => OpcUaValue::DateTime(from_opcua_datetime(v)),
        Variant::Guid(v) => OpcUaValue::Guid(uuid::Uuid::from_bytes(*v.as_bytes())),
        Variant::StatusCode(v) => OpcUaValue::StatusCode(v.bits()),
        Variant::ByteString(v) => OpcUaValue::ByteString(v.value.clone().unwrap_or_default()),
        Variant::XmlElement(v) => OpcUaValue::String(v.as_ref().to_string()),
        Variant::QualifiedName(v) => OpcUaValue::QualifiedName {
            namespace_index: v.namespace_index,
            name: v.name.as_ref().to_string(),
        },
        Variant::LocalizedText(v) => OpcUaValue::LocalizedText {
            locale: v.locale.as_ref().to_string(),
            text: v.text.as_ref().to_string(),
        },
        Variant::NodeId(v) => OpcUaValue::NodeId(from_opcua_node_id(v)),
        Variant::ExpandedNodeId(v) => OpcUaValue::NodeId(from_opcua_node_id(&v.node_id)),
        Variant::ExtensionObject(v) => OpcUaValue::ExtensionObject {
            type_id: from_opcua_node_id(&v.node_id),
            body: match &v.body {
                ua::ExtensionObjectEncoding::ByteString(bytes) => {
                    bytes.value.clone().unwrap_or_default()
                }
                ua::ExtensionObjectEncoding::XmlElement(xml) => xml.as_ref().as_bytes().to_vec(),
                ua::ExtensionObjectEncoding::None => Vec::new(),
            },
        },
        Variant::Variant(v) => from_opcua_variant(v),
        Variant::Array(array) => {
            OpcUaValue::Array(array.values.iter().map(from_opcua_variant).collect())
        }
        other => OpcUaValue::String(format!("{:?}", other)),
    }
}

fn to_opcua_variant(value: &OpcUaValue) -> ua::Variant {
    use ua::Variant;

    match value {
        OpcUaValue::Null => Variant::Empty,
        OpcUaValue::Boolean(v) => Variant::Boolean(*v),
        OpcUaValue::SByte(v) => Variant::SByte(*v),
        OpcUaValue::Byte(v) => Variant::Byte(*v),
        OpcUaValue::Int16(v) => Variant::Int16(*v),
        OpcUaValue::UInt16(v) => Variant::UInt16(*v),
        OpcUaValue::Int32(v) => Variant::Int32(*v),
        OpcUaValue::UInt32(v) => Variant::UInt32(*v),
        OpcUaValue::Int64(v) => Variant::Int64(*v),
        OpcUaValue::UInt64(v) => Variant::UInt64(*v),
        OpcUaValue::Float(v) => Variant::Float(*v),
        OpcUaValue::Double(v) => Variant::Double(*v),
        OpcUaValue::String(v) => Variant::String(ua::UAString::from(v.as_str())),
        OpcUaValue::DateTime(v) => Variant::DateTime(Box::new(ua::DateTime::from(*v))),
        OpcUaValue::Guid(v) => Variant::Guid(Box::new(ua::Guid::from(*v))),
        OpcUaValue::ByteString(v) => Variant::ByteString(ua::ByteString::from(v.as_slice())),
        OpcUaValue::LocalizedText { locale, text } => {
            Variant::LocalizedText(Box::new(ua::LocalizedText::new(locale, text)))
        }
        OpcUaValue::QualifiedName {
            namespace_index,
            name,
        } => Variant::QualifiedName(Box::new(ua::QualifiedName::new(
            *namespace_index,
            name.as_str(),
        ))),
        OpcUaValue::NodeId(v) => Variant::NodeId(Box::new(to_opcua_node_id(v))),
        OpcUaValue::StatusCode(v) => Variant::StatusCode(ua::StatusCode::from_bits_truncate(*v)),
        OpcUaValue::ExtensionObject { type_id, body } => {
            Variant::ExtensionObject(Box::new(ua::ExtensionObject {
                node_id: to_opcua_node_id(type_id),
                body: ua::ExtensionObjectEncoding::ByteString(ua::ByteString::from(
                    body.as_slice(),
                )),
            }))
        }
        OpcUaValue::Array(items) => {
            let variants: Vec<Variant> = items.iter().map(to_opcua_variant).collect();
            match ua::Array::new(ua::VariantTypeId::Variant, variants) {
                Ok(array) => Variant::Array(Box::new(array)),
                Err(_) => Variant::Empty,
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_conversion_round_trip() {
        let ids = [
            NodeId::numeric(0, 84),
            NodeId::string(2, "Line1.Speed"),
            NodeId::opaque(3, vec![0xde, 0xad]),
        ];
        for id in ids {
            assert_eq!(from_opcua_node_id(&to_opcua_node_id(&id)), id);
        }
    }

    #[test]
    fn test_variant_conversion() {
        let text = ua::Variant::LocalizedText(Box::new(ua::LocalizedText::new("en", "Objects")));
        assert_eq!(
            from_opcua_variant(&text),
            OpcUaValue::LocalizedText {
                locale: "en".into(),
                text: "Objects".into()
            }
        );

        let node = ua::Variant::NodeId(Box::new(ua::NodeId::new(0, 11u32)));
        assert_eq!(from_opcua_variant(&node), OpcUaValue::NodeId(NodeId::numeric(0, 11)));

        assert_eq!(from_opcua_variant(&ua::Variant::Empty), OpcUaValue::Null);
    }

    #[test]
    fn test_bad_data_value_keeps_status() {
        let mut data_value = ua::DataValue::null();
        data_value.status = Some(ua::StatusCode::BadAttributeIdInvalid);
        let result = from_data_value(&data_value);
        assert!(result.is_bad());
        assert!(result.value.is_none());
    }

    #[test]
    fn test_security_policy_mapping() {
        let cases = [
            (SecurityPolicy::None, "http://opcfoundation.org/UA/SecurityPolicy#None"),
            (
                SecurityPolicy::Basic256Sha256,
                "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256",
            ),
            (
                SecurityPolicy::Aes256Sha256RsaPss,
                "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss",
            ),
        ];
        for (policy, uri) in cases {
            assert_eq!(to_opcua_security_policy(policy).to_uri(), uri);
        }
    }

    #[test]
    fn test_client_build_failure_is_a_configuration_error() {
        let config = ClientConfig {
            application_name: String::new(),
            ..ClientConfig::default()
        };

        let error = match build_client("opc.tcp://localhost:4840", &config) {
            Err(e) => e,
            Ok(_) => panic!("client built without an application name"),
        };
        assert_eq!(error.category(), "configuration");
        assert!(matches!(
            error,
            OpcUaError::Configuration(ConfigurationError::InvalidValue { .. })
        ));
    }
}
