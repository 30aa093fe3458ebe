// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session gateway.
//!
//! [`SessionGateway`] owns at most one live session and turns node-level
//! requests into batched protocol operations:
//!
//! - `read_node`: one header read (NodeClass + DisplayName), then the
//!   attribute batch.
//! - `read_attributes`: one batched read of exactly the attributes the node's
//!   class supports, with NodeClass and DataType resolved to readable values.
//! - `browse`: forward hierarchical references, continuation points followed,
//!   every child read attribute-complete.
//!
//! Every operation is all-or-nothing. Nothing is retried; failures go straight
//! back to the caller. Each request to the server is bounded by
//! [`ClientConfig::request_timeout`].
//!
//! # Examples
//!
//! ```rust,ignore
//! use opcsh_opcua::{ClientConfig, NodeId, SessionGateway};
//! use opcsh_opcua::client::RealOpcUaConnector;
//!
//! let mut gateway = SessionGateway::new(RealOpcUaConnector::new(), ClientConfig::default());
//! gateway.connect("opc.tcp://localhost:4840").await?;
//!
//! for child in gateway.browse(&NodeId::OBJECTS_FOLDER).await? {
//!     println!("{}", child.display_name());
//! }
//!
//! gateway.disconnect().await?;
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::browse::{BrowseOptions, NodeBrowser};
use crate::client::{
    status, BrowseResult, OpcUaConnector, OpcUaSession, OpcUaValue, ReadRequest, ReadResult,
    WriteResult,
};
use crate::error::{BrowseError, ConnectionError, OpcUaError, OpcUaResult, OperationError};
use crate::model::{Attribute, AttributeValue, Node, ResolvedDataType};
use crate::types::{endpoint_problem, AttributeId, ClientConfig, NodeClass, NodeId};

// =============================================================================
// SessionInfo
// =============================================================================

/// Information about the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    /// The address the user asked for.
    pub requested_endpoint: String,

    /// The endpoint the session actually runs against.
    pub endpoint: String,

    /// Backend that negotiated the session.
    pub connector: &'static str,

    /// When the session was established.
    pub connected_at: DateTime<Utc>,
}

// =============================================================================
// GatewayStats
// =============================================================================

/// Operation counters.
#[derive(Debug, Default)]
pub struct GatewayStats {
    connections: AtomicU64,
    connect_failures: AtomicU64,
    read_batches: AtomicU64,
    attributes_read: AtomicU64,
    browses: AtomicU64,
    browse_pages: AtomicU64,
    writes: AtomicU64,
    failures: AtomicU64,
}

impl GatewayStats {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_connection(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    fn record_connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_read_batch(&self, size: usize) {
        self.read_batches.fetch_add(1, Ordering::Relaxed);
        self.attributes_read.fetch_add(size as u64, Ordering::Relaxed);
    }

    fn record_browse(&self, pages: u64) {
        self.browses.fetch_add(1, Ordering::Relaxed);
        self.browse_pages.fetch_add(pages, Ordering::Relaxed);
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self) -> GatewayStatsSnapshot {
        GatewayStatsSnapshot {
            connections: self.connections.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            read_batches: self.read_batches.load(Ordering::Relaxed),
            attributes_read: self.attributes_read.load(Ordering::Relaxed),
            browses: self.browses.load(Ordering::Relaxed),
            browse_pages: self.browse_pages.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`GatewayStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GatewayStatsSnapshot {
    /// Sessions established.
    pub connections: u64,
    /// Failed connection attempts.
    pub connect_failures: u64,
    /// Batched read requests issued.
    pub read_batches: u64,
    /// Attributes requested across all batches.
    pub attributes_read: u64,
    /// Browse operations completed.
    pub browses: u64,
    /// Browse pages fetched, continuation pages included.
    pub browse_pages: u64,
    /// Writes issued.
    pub writes: u64,
    /// Operations that failed after a session was available.
    pub failures: u64,
}

// =============================================================================
// SessionGateway
// =============================================================================

/// Owns one live session and provides attribute-complete node operations.
pub struct SessionGateway<C: OpcUaConnector> {
    connector: C,
    config: ClientConfig,
    browse_options: BrowseOptions,
    session: Option<Box<dyn OpcUaSession>>,
    info: Option<SessionInfo>,
    stats: GatewayStats,
}

impl<C: OpcUaConnector> SessionGateway<C> {
    /// Creates a disconnected gateway.
    pub fn new(connector: C, config: ClientConfig) -> Self {
        Self {
            connector,
            config,
            browse_options: BrowseOptions::default(),
            session: None,
            info: None,
            stats: GatewayStats::new(),
        }
    }

    // =========================================================================
    // Connection Lifecycle
    // =========================================================================

    /// Opens a session against `address`.
    ///
    /// # Errors
    ///
    /// - `AlreadyConnected` if a session is active; that session is kept.
    /// - `InvalidEndpoint` if `address` is not an `opc.tcp://` URL.
    /// - Whatever the connector reports when negotiation fails. The gateway
    ///   stays disconnected.
    pub async fn connect(&mut self, address: &str) -> OpcUaResult<SessionInfo> {
        if let Some(info) = &self.info {
            return Err(ConnectionError::already_connected(&info.endpoint).into());
        }

        let address = address.trim();
        if let Some(reason) = endpoint_problem(address) {
            return Err(ConnectionError::invalid_endpoint(address, reason).into());
        }

        tracing::info!(
            endpoint = %address,
            connector = self.connector.name(),
            session = self.config.effective_session_name(),
            security_mode = %self.config.security_mode,
            "Connecting to OPC UA server"
        );

        let session = match self.connector.connect(address, &self.config).await {
            Ok(session) => session,
            Err(e) => {
                self.stats.record_connect_failure();
                e.log("connect");
                return Err(e);
            }
        };

        let info = SessionInfo {
            requested_endpoint: address.to_string(),
            endpoint: session.endpoint_url().to_string(),
            connector: self.connector.name(),
            connected_at: Utc::now(),
        };

        tracing::info!(endpoint = %info.endpoint, "Connected to OPC UA server");

        self.stats.record_connection();
        self.session = Some(session);
        self.info = Some(info.clone());
        Ok(info)
    }

    /// Closes the active session.
    ///
    /// The session is released even if the server does not acknowledge the
    /// close.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` when no session is active.
    pub async fn disconnect(&mut self) -> OpcUaResult<()> {
        let mut session = self.session.take().ok_or_else(OpcUaError::not_connected)?;
        let info = self.info.take();

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "Session close was not acknowledged");
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            endpoint = info.as_ref().map(|i| i.endpoint.as_str()).unwrap_or_default(),
            read_batches = stats.read_batches,
            browses = stats.browses,
            failures = stats.failures,
            "Disconnected from OPC UA server"
        );
        Ok(())
    }

    /// Returns `true` while a session is active.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the resolved endpoint of the active session.
    pub fn endpoint(&self) -> Option<&str> {
        self.info.as_ref().map(|info| info.endpoint.as_str())
    }

    /// Returns information about the active session.
    pub fn session_info(&self) -> Option<&SessionInfo> {
        self.info.as_ref()
    }

    /// Returns the operation counters.
    pub fn stats(&self) -> GatewayStatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn session(&self) -> OpcUaResult<&dyn OpcUaSession> {
        self.session.as_deref().ok_or_else(OpcUaError::not_connected)
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Reads a node's class, display name and full attribute set.
    pub async fn read_node(&self, node_id: &NodeId) -> OpcUaResult<Node> {
        let session = self.session()?;
        self.observe(self.fetch_node(session, node_id).await)
    }

    /// Reads every attribute the node's class supports, in request order.
    pub async fn read_attributes(&self, node_id: &NodeId) -> OpcUaResult<Vec<Attribute>> {
        let session = self.session()?;
        let result: OpcUaResult<Vec<Attribute>> = async {
            let node_class = self.fetch_node_class(session, node_id).await?;
            self.fetch_attributes(session, node_id, node_class).await
        }
        .await;
        self.observe(result)
    }

    /// Lists the children of a node over forward hierarchical references.
    ///
    /// Children keep server order and each carries its full attribute set.
    /// A leaf yields an empty list.
    pub async fn browse(&self, node_id: &NodeId) -> OpcUaResult<Vec<Node>> {
        let session = self.session()?;
        let result: OpcUaResult<Vec<Node>> = async {
            let references = self.fetch_references(session, node_id).await?;
            tracing::debug!(node_id = %node_id, children = references.len(), "Browsed node");

            stream::iter(references)
                .map(|reference| self.fetch_child(session, reference))
                .buffered(self.config.browse_concurrency.max(1))
                .try_collect::<Vec<_>>()
                .await
        }
        .await;
        self.observe(result)
    }

    /// Writes a single attribute.
    pub async fn write(
        &self,
        node_id: &NodeId,
        attribute_id: AttributeId,
        value: OpcUaValue,
    ) -> OpcUaResult<WriteResult> {
        let session = self.session()?;
        tracing::trace!(node_id = %node_id, attribute = %attribute_id, "Writing attribute");

        let result: OpcUaResult<WriteResult> = async {
            let result = self
                .deadline("write", session.write(node_id, attribute_id, value))
                .await?;
            self.stats.record_write();
            if result.is_good() {
                Ok(result)
            } else {
                Err(OperationError::bad_status(node_id.to_string(), result.status_code).into())
            }
        }
        .await;
        self.observe(result)
    }

    // =========================================================================
    // Protocol Helpers
    // =========================================================================

    /// Bounds one server request by the configured request timeout.
    async fn deadline<T, F>(&self, operation: &'static str, request: F) -> OpcUaResult<T>
    where
        F: Future<Output = OpcUaResult<T>>,
    {
        let limit = self.config.request_timeout;
        match tokio::time::timeout(limit, request).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout = ?limit, "Request timed out");
                Err(ConnectionError::timeout(operation, limit).into())
            }
        }
    }

    fn observe<T>(&self, result: OpcUaResult<T>) -> OpcUaResult<T> {
        if result.is_err() {
            self.stats.record_failure();
        }
        result
    }

    async fn read_batch(
        &self,
        session: &dyn OpcUaSession,
        node_id: &NodeId,
        requests: &[ReadRequest],
    ) -> OpcUaResult<Vec<ReadResult>> {
        tracing::trace!(node_id = %node_id, count = requests.len(), "Reading attribute batch");

        let results = self.deadline("read", session.read(requests)).await?;
        self.stats.record_read_batch(requests.len());

        if results.len() != requests.len() {
            return Err(OperationError::malformed_response(
                node_id.to_string(),
                requests.len(),
                results.len(),
            )
            .into());
        }
        Ok(results)
    }

    async fn fetch_node(&self, session: &dyn OpcUaSession, node_id: &NodeId) -> OpcUaResult<Node> {
        let requests = [
            ReadRequest::new(node_id.clone(), AttributeId::NodeClass),
            ReadRequest::new(node_id.clone(), AttributeId::DisplayName),
        ];
        let results = self.read_batch(session, node_id, &requests).await?;

        let node_class = node_class_from_result(node_id, &results[0])?;
        let display_name = good_value(node_id, &results[1])?
            .and_then(|value| value.as_text().map(str::to_string))
            .unwrap_or_else(|| node_id.to_string());

        let attributes = self.fetch_attributes(session, node_id, node_class).await?;
        Ok(Node::new(node_id.clone(), display_name, node_class, attributes))
    }

    async fn fetch_node_class(
        &self,
        session: &dyn OpcUaSession,
        node_id: &NodeId,
    ) -> OpcUaResult<NodeClass> {
        let requests = [ReadRequest::new(node_id.clone(), AttributeId::NodeClass)];
        let results = self.read_batch(session, node_id, &requests).await?;
        node_class_from_result(node_id, &results[0])
    }

    async fn fetch_attributes(
        &self,
        session: &dyn OpcUaSession,
        node_id: &NodeId,
        node_class: NodeClass,
    ) -> OpcUaResult<Vec<Attribute>> {
        let supported = node_class.supported_attributes();
        let requests: Vec<ReadRequest> = supported
            .iter()
            .map(|attribute| ReadRequest::new(node_id.clone(), *attribute))
            .collect();

        tracing::debug!(
            node_id = %node_id,
            node_class = %node_class,
            attributes = requests.len(),
            "Reading node attributes"
        );

        let results = self.read_batch(session, node_id, &requests).await?;

        let mut attributes = Vec::with_capacity(results.len());
        for (attribute_id, result) in supported.into_iter().zip(results) {
            if result.is_bad() {
                attributes.push(Attribute::with_status(
                    attribute_id,
                    AttributeValue::Empty,
                    result.status_code,
                ));
                continue;
            }

            let value = result
                .value
                .map(AttributeValue::from)
                .unwrap_or(AttributeValue::Empty);
            let value = match attribute_id {
                AttributeId::NodeClass => resolve_node_class(value),
                AttributeId::DataType => self.resolve_data_type(session, value).await?,
                _ => value,
            };
            attributes.push(Attribute::with_status(attribute_id, value, result.status_code));
        }
        Ok(attributes)
    }

    async fn resolve_data_type(
        &self,
        session: &dyn OpcUaSession,
        value: AttributeValue,
    ) -> OpcUaResult<AttributeValue> {
        let type_id = match value {
            AttributeValue::NodeReference(type_id) => type_id,
            other => return Ok(other),
        };

        let requests = [ReadRequest::new(type_id.clone(), AttributeId::DisplayName)];
        let results = self.read_batch(session, &type_id, &requests).await?;
        let display_name = good_value(&type_id, &results[0])?
            .and_then(|value| value.as_text().map(str::to_string))
            .unwrap_or_else(|| type_id.to_string());

        Ok(AttributeValue::DataType(ResolvedDataType {
            id: type_id,
            display_name,
        }))
    }

    async fn fetch_references(
        &self,
        session: &dyn OpcUaSession,
        node_id: &NodeId,
    ) -> OpcUaResult<Vec<BrowseResult>> {
        let request = self.browse_options.to_request(node_id);
        tracing::trace!(node_id = %node_id, mask = request.node_class_mask, "Browsing node");

        let mut page = self.deadline("browse", session.browse(&request)).await?;
        let mut pages = 1;
        let mut references = std::mem::take(&mut page.references);

        while page.has_more() {
            let point = page.continuation_point.take().unwrap_or_default();
            tracing::trace!(node_id = %node_id, page = pages, "Following continuation point");
            page = self
                .deadline("browse_next", session.browse_next(&point))
                .await
                .map_err(|e| match e {
                    OpcUaError::Operation(OperationError::BadStatus { status_code, .. })
                        if status_code == status::BAD_CONTINUATION_POINT_INVALID =>
                    {
                        BrowseError::InvalidContinuationPoint {
                            node_id: node_id.to_string(),
                        }
                        .into()
                    }
                    other => other,
                })?;
            pages += 1;
            references.append(&mut page.references);
        }

        self.stats.record_browse(pages);
        Ok(references)
    }

    async fn fetch_child(
        &self,
        session: &dyn OpcUaSession,
        reference: BrowseResult,
    ) -> OpcUaResult<Node> {
        let node_class = NodeClass::from_value(reference.node_class).unwrap_or_default();
        let attributes = self
            .fetch_attributes(session, &reference.node_id, node_class)
            .await?;
        Ok(Node::new(
            reference.node_id,
            reference.display_name,
            node_class,
            attributes,
        ))
    }
}

#[async_trait]
impl<C: OpcUaConnector> NodeBrowser for SessionGateway<C> {
    async fn read_node(&self, node_id: &NodeId) -> OpcUaResult<Node> {
        SessionGateway::read_node(self, node_id).await
    }

    async fn browse(&self, node_id: &NodeId) -> OpcUaResult<Vec<Node>> {
        SessionGateway::browse(self, node_id).await
    }
}

// =============================================================================
// Value Helpers
// =============================================================================

/// Returns the value of a header read, failing on a bad status.
fn good_value<'a>(node_id: &NodeId, result: &'a ReadResult) -> OpcUaResult<Option<&'a OpcUaValue>> {
    match result.status_code {
        status::BAD_NODE_ID_UNKNOWN => Err(BrowseError::node_not_found(node_id.to_string()).into()),
        code if status::is_bad(code) => {
            Err(OperationError::bad_status(node_id.to_string(), code).into())
        }
        _ => Ok(result.value.as_ref()),
    }
}

fn node_class_from_result(node_id: &NodeId, result: &ReadResult) -> OpcUaResult<NodeClass> {
    let raw = good_value(node_id, result)?.and_then(OpcUaValue::as_i64);
    let node_class = raw
        .and_then(|raw| u32::try_from(raw).ok())
        .and_then(NodeClass::from_value)
        .unwrap_or_default();

    if node_class == NodeClass::Unspecified {
        tracing::debug!(node_id = %node_id, raw = ?raw, "Server reported no node class");
    }
    Ok(node_class)
}

fn resolve_node_class(value: AttributeValue) -> AttributeValue {
    let resolved = match &value {
        AttributeValue::Scalar(raw) => raw
            .as_i64()
            .and_then(|raw| u32::try_from(raw).ok())
            .and_then(NodeClass::from_value),
        _ => None,
    };
    resolved.map(AttributeValue::NodeClass).unwrap_or(value)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{BrowsePage, BrowseRequest};

    struct RefusingConnector;

    #[async_trait]
    impl OpcUaConnector for RefusingConnector {
        async fn connect(
            &self,
            endpoint: &str,
            _config: &ClientConfig,
        ) -> OpcUaResult<Box<dyn OpcUaSession>> {
            Err(ConnectionError::refused(endpoint).into())
        }

        fn name(&self) -> &'static str {
            "refusing"
        }
    }

    /// A session holding a single variable `ns=1;i=1` of type Double.
    struct SingleVariableSession;

    #[async_trait]
    impl OpcUaSession for SingleVariableSession {
        async fn read(&self, requests: &[ReadRequest]) -> OpcUaResult<Vec<ReadResult>> {
            Ok(requests
                .iter()
                .map(|request| match (request.node_id.as_numeric(), request.attribute_id) {
                    (Some(1), AttributeId::NodeClass) => {
                        ReadResult::success(OpcUaValue::Int32(NodeClass::Variable.value() as i32))
                    }
                    (Some(1), AttributeId::DisplayName) => {
                        ReadResult::success(OpcUaValue::text("Speed"))
                    }
                    (Some(1), AttributeId::DataType) => {
                        ReadResult::success(OpcUaValue::NodeId(NodeId::numeric(0, 11)))
                    }
                    (Some(1), AttributeId::Value) => ReadResult::success(OpcUaValue::Double(3.5)),
                    (Some(1), AttributeId::AccessLevelEx) => {
                        ReadResult::failure(status::BAD_ATTRIBUTE_ID_INVALID)
                    }
                    (Some(11), AttributeId::DisplayName) => {
                        ReadResult::success(OpcUaValue::text("Double"))
                    }
                    (Some(1), _) => ReadResult::success(OpcUaValue::Null),
                    _ => ReadResult::failure(status::BAD_NODE_ID_UNKNOWN),
                })
                .collect())
        }

        async fn browse(&self, _request: &BrowseRequest) -> OpcUaResult<BrowsePage> {
            Ok(BrowsePage::complete(vec![]))
        }

        async fn browse_next(&self, _point: &[u8]) -> OpcUaResult<BrowsePage> {
            Ok(BrowsePage::complete(vec![]))
        }

        async fn write(
            &self,
            node_id: &NodeId,
            _attribute_id: AttributeId,
            _value: OpcUaValue,
        ) -> OpcUaResult<WriteResult> {
            Ok(WriteResult::failure(node_id.clone(), status::BAD_NOT_WRITABLE))
        }

        fn endpoint_url(&self) -> &str {
            "opc.tcp://resolved:4840"
        }

        async fn close(&mut self) -> OpcUaResult<()> {
            Ok(())
        }
    }

    struct SingleVariableConnector;

    #[async_trait]
    impl OpcUaConnector for SingleVariableConnector {
        async fn connect(
            &self,
            _endpoint: &str,
            _config: &ClientConfig,
        ) -> OpcUaResult<Box<dyn OpcUaSession>> {
            Ok(Box::new(SingleVariableSession))
        }

        fn name(&self) -> &'static str {
            "single"
        }
    }

    async fn connected() -> SessionGateway<SingleVariableConnector> {
        let mut gateway = SessionGateway::new(SingleVariableConnector, ClientConfig::default());
        gateway.connect("opc.tcp://requested:4840").await.unwrap();
        gateway
    }

    #[tokio::test]
    async fn test_operations_require_session() {
        let gateway = SessionGateway::new(RefusingConnector, ClientConfig::default());
        let node = NodeId::numeric(1, 1);

        assert!(gateway.read_node(&node).await.unwrap_err().is_not_connected());
        assert!(gateway.read_attributes(&node).await.unwrap_err().is_not_connected());
        assert!(gateway.browse(&node).await.unwrap_err().is_not_connected());
        assert!(gateway
            .write(&node, AttributeId::Value, OpcUaValue::Int32(1))
            .await
            .unwrap_err()
            .is_not_connected());
    }

    #[tokio::test]
    async fn test_failed_connect_keeps_gateway_disconnected() {
        let mut gateway = SessionGateway::new(RefusingConnector, ClientConfig::default());

        let error = gateway.connect("opc.tcp://nowhere:4840").await.unwrap_err();
        assert!(matches!(
            error,
            OpcUaError::Connection(ConnectionError::Refused { .. })
        ));
        assert!(!gateway.is_connected());
        assert!(gateway.endpoint().is_none());
        assert_eq!(gateway.stats().connect_failures, 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_non_opc_tcp_address() {
        let mut gateway = SessionGateway::new(SingleVariableConnector, ClientConfig::default());
        let error = gateway.connect("http://localhost:4840").await.unwrap_err();
        assert!(matches!(
            error,
            OpcUaError::Connection(ConnectionError::InvalidEndpoint { .. })
        ));
        assert!(!gateway.is_connected());
    }

    #[tokio::test]
    async fn test_connect_records_resolved_endpoint() {
        let gateway = connected().await;
        let info = gateway.session_info().unwrap();
        assert_eq!(info.requested_endpoint, "opc.tcp://requested:4840");
        assert_eq!(gateway.endpoint(), Some("opc.tcp://resolved:4840"));
        assert_eq!(info.connector, "single");
    }

    #[tokio::test]
    async fn test_second_connect_is_rejected() {
        let mut gateway = connected().await;
        let error = gateway.connect("opc.tcp://other:4840").await.unwrap_err();
        assert!(matches!(
            error,
            OpcUaError::Connection(ConnectionError::AlreadyConnected { .. })
        ));
        assert_eq!(gateway.endpoint(), Some("opc.tcp://resolved:4840"));
    }

    #[tokio::test]
    async fn test_disconnect_twice() {
        let mut gateway = connected().await;
        gateway.disconnect().await.unwrap();
        assert!(!gateway.is_connected());
        assert!(gateway.disconnect().await.unwrap_err().is_not_connected());
    }

    #[tokio::test]
    async fn test_read_node_resolves_class_and_data_type() {
        let gateway = connected().await;
        let node = gateway.read_node(&NodeId::numeric(1, 1)).await.unwrap();

        assert_eq!(node.display_name(), "Speed");
        assert_eq!(node.node_class(), NodeClass::Variable);
        assert_eq!(node.attributes().len(), NodeClass::Variable.supported_attributes().len());

        let class = node.attribute(AttributeId::NodeClass).unwrap();
        assert_eq!(class.value(), &AttributeValue::NodeClass(NodeClass::Variable));

        let data_type = node.attribute(AttributeId::DataType).unwrap();
        assert_eq!(data_type.value().to_string(), "Double");
    }

    #[tokio::test]
    async fn test_bad_attribute_status_keeps_slot() {
        let gateway = connected().await;
        let attributes = gateway.read_attributes(&NodeId::numeric(1, 1)).await.unwrap();

        let access = attributes
            .iter()
            .find(|a| a.attribute_id() == Some(AttributeId::AccessLevelEx))
            .unwrap();
        assert!(access.value().is_empty());
        assert!(!access.is_good());
    }

    #[tokio::test]
    async fn test_unknown_node_is_reported() {
        let gateway = connected().await;
        let error = gateway.read_node(&NodeId::numeric(1, 999)).await.unwrap_err();
        assert!(matches!(error, OpcUaError::Browse(BrowseError::NodeNotFound { .. })));
        assert_eq!(gateway.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_write_bad_status_is_an_error() {
        let gateway = connected().await;
        let error = gateway
            .write(&NodeId::numeric(1, 1), AttributeId::Value, OpcUaValue::Double(1.0))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            OpcUaError::Operation(OperationError::BadStatus { .. })
        ));
        assert_eq!(gateway.stats().writes, 1);
    }

    #[test]
    fn test_resolve_node_class_keeps_unknown_raw_values() {
        let raw = AttributeValue::Scalar(OpcUaValue::Int32(3));
        assert_eq!(resolve_node_class(raw.clone()), raw);
        assert_eq!(
            resolve_node_class(AttributeValue::Scalar(OpcUaValue::Int32(1))),
            AttributeValue::NodeClass(NodeClass::Object)
        );
    }
}
