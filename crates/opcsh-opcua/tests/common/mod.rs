// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory address space for gateway and navigator tests.
//!
//! ```text
//! Root (i=84)
//! ├── Objects (i=85)
//! │   ├── Server (i=2253)
//! │   ├── Line1 (ns=2;s=Line1)
//! │   │   ├── Speed (ns=2;s=Line1.Speed)    Variable, DataType i=11
//! │   │   └── Start (ns=2;s=Line1.Start)    Method
//! │   └── Line1 (ns=2;s=Line1.Shadow)       duplicate display name
//! ├── Types (i=86)
//! │   └── DataTypes (i=90)
//! │       └── Double (i=11)
//! └── Views (i=87)
//! ```

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use opcsh_opcua::client::{
    status, BrowsePage, BrowseRequest, BrowseResult, OpcUaConnector, OpcUaSession, OpcUaValue,
    ReadRequest, ReadResult, WriteResult,
};
use opcsh_opcua::{
    AttributeId, BrowseError, ClientConfig, ConnectionError, NodeClass, NodeId, OpcUaError,
    OpcUaResult, SessionGateway,
};

pub const ENDPOINT: &str = "opc.tcp://mock:4840";
pub const RESOLVED_ENDPOINT: &str = "opc.tcp://mock.local:4840/server";

// =============================================================================
// Address Space
// =============================================================================

/// One node of the mock server.
#[derive(Debug, Clone)]
pub struct MockNode {
    pub id: NodeId,
    pub name: String,
    pub class: NodeClass,
    pub values: HashMap<AttributeId, OpcUaValue>,
    pub bad: HashMap<AttributeId, u32>,
    pub children: Vec<NodeId>,
}

impl MockNode {
    pub fn new(id: NodeId, name: &str, class: NodeClass) -> Self {
        Self {
            id,
            name: name.to_string(),
            class,
            values: HashMap::new(),
            bad: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_value(mut self, attribute: AttributeId, value: OpcUaValue) -> Self {
        self.values.insert(attribute, value);
        self
    }

    pub fn with_bad_status(mut self, attribute: AttributeId, code: u32) -> Self {
        self.bad.insert(attribute, code);
        self
    }

    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }

    fn read(&self, attribute: AttributeId) -> ReadResult {
        if !self.class.supports(attribute) {
            return ReadResult::failure(status::BAD_ATTRIBUTE_ID_INVALID);
        }
        if let Some(code) = self.bad.get(&attribute) {
            return ReadResult::failure(*code);
        }
        let value = match attribute {
            AttributeId::NodeId => OpcUaValue::NodeId(self.id.clone()),
            AttributeId::NodeClass => OpcUaValue::Int32(self.class.value() as i32),
            AttributeId::BrowseName => OpcUaValue::QualifiedName {
                namespace_index: self.id.namespace_index,
                name: self.name.clone(),
            },
            AttributeId::DisplayName => OpcUaValue::text(self.name.clone()),
            other => self.values.get(&other).cloned().unwrap_or_default(),
        };
        ReadResult::success(value)
    }

    fn reference(&self) -> BrowseResult {
        BrowseResult {
            node_id: self.id.clone(),
            browse_name: self.name.clone(),
            display_name: self.name.clone(),
            node_class: self.class.value(),
            reference_type: None,
            type_definition: None,
        }
    }
}

/// Node table of the mock server.
#[derive(Debug, Clone, Default)]
pub struct AddressSpace {
    nodes: HashMap<NodeId, MockNode>,
}

impl AddressSpace {
    pub fn insert(&mut self, node: MockNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn get(&self, id: &NodeId) -> Option<&MockNode> {
        self.nodes.get(id)
    }

    pub fn children_of(&self, id: &NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// The tree drawn in the module docs.
    pub fn standard() -> Self {
        let mut space = Self::default();

        space.insert(
            MockNode::new(NodeId::ROOT_FOLDER, "Root", NodeClass::Object).with_children(vec![
                NodeId::OBJECTS_FOLDER,
                NodeId::TYPES_FOLDER,
                NodeId::VIEWS_FOLDER,
            ]),
        );
        space.insert(
            MockNode::new(NodeId::OBJECTS_FOLDER, "Objects", NodeClass::Object).with_children(
                vec![
                    NodeId::numeric(0, 2253),
                    line1(),
                    NodeId::string(2, "Line1.Shadow"),
                ],
            ),
        );
        space.insert(
            MockNode::new(NodeId::TYPES_FOLDER, "Types", NodeClass::Object)
                .with_children(vec![NodeId::numeric(0, 90)]),
        );
        space.insert(MockNode::new(NodeId::VIEWS_FOLDER, "Views", NodeClass::Object));
        space.insert(
            MockNode::new(NodeId::numeric(0, 90), "DataTypes", NodeClass::Object)
                .with_children(vec![NodeId::numeric(0, 11)]),
        );
        space.insert(
            MockNode::new(NodeId::numeric(0, 11), "Double", NodeClass::DataType)
                .with_value(AttributeId::IsAbstract, OpcUaValue::Boolean(false)),
        );
        space.insert(
            MockNode::new(NodeId::numeric(0, 2253), "Server", NodeClass::Object)
                .with_value(AttributeId::EventNotifier, OpcUaValue::Byte(1)),
        );
        space.insert(
            MockNode::new(line1(), "Line1", NodeClass::Object)
                .with_children(vec![speed(), NodeId::string(2, "Line1.Start")]),
        );
        space.insert(MockNode::new(
            NodeId::string(2, "Line1.Shadow"),
            "Line1",
            NodeClass::Object,
        ));
        space.insert(
            MockNode::new(speed(), "Speed", NodeClass::Variable)
                .with_value(AttributeId::Value, OpcUaValue::Double(42.5))
                .with_value(AttributeId::DataType, OpcUaValue::NodeId(NodeId::numeric(0, 11)))
                .with_value(AttributeId::ValueRank, OpcUaValue::Int32(-1))
                .with_value(AttributeId::AccessLevel, OpcUaValue::Byte(3))
                .with_bad_status(AttributeId::AccessLevelEx, status::BAD_ATTRIBUTE_ID_INVALID),
        );
        space.insert(
            MockNode::new(NodeId::string(2, "Line1.Start"), "Start", NodeClass::Method)
                .with_value(AttributeId::Executable, OpcUaValue::Boolean(true)),
        );
        space
    }
}

pub fn line1() -> NodeId {
    NodeId::string(2, "Line1")
}

pub fn speed() -> NodeId {
    NodeId::string(2, "Line1.Speed")
}

// =============================================================================
// Control
// =============================================================================

/// Failure injection and request recording shared by connector and sessions.
#[derive(Debug, Default)]
pub struct MockControl {
    pub refuse_connect: Mutex<Option<String>>,
    pub fail_browse: Mutex<HashSet<NodeId>>,
    pub fail_read: Mutex<HashSet<NodeId>>,
    pub read_delays: Mutex<HashMap<NodeId, Duration>>,
    pub live_values: Mutex<HashMap<(NodeId, AttributeId), OpcUaValue>>,
    pub page_size: Mutex<Option<usize>>,
    pub invalidate_continuation: Mutex<bool>,
    pub read_batches: Mutex<Vec<Vec<ReadRequest>>>,
    pub browse_calls: AtomicUsize,
    pub browse_next_calls: AtomicUsize,
    pub closed: AtomicUsize,
}

impl MockControl {
    pub fn fail_browse_of(&self, id: NodeId) {
        self.fail_browse.lock().unwrap().insert(id);
    }

    pub fn fail_read_of(&self, id: NodeId) {
        self.fail_read.lock().unwrap().insert(id);
    }

    pub fn clear_failures(&self) {
        self.fail_browse.lock().unwrap().clear();
        self.fail_read.lock().unwrap().clear();
    }

    pub fn delay_reads_of(&self, id: NodeId, delay: Duration) {
        self.read_delays.lock().unwrap().insert(id, delay);
    }

    /// Makes the server report `value` for the attribute from now on.
    pub fn set_value(&self, id: NodeId, attribute: AttributeId, value: OpcUaValue) {
        self.live_values.lock().unwrap().insert((id, attribute), value);
    }

    pub fn set_page_size(&self, size: usize) {
        *self.page_size.lock().unwrap() = Some(size);
    }

    pub fn batches(&self) -> Vec<Vec<ReadRequest>> {
        self.read_batches.lock().unwrap().clone()
    }

    pub fn clear_batches(&self) {
        self.read_batches.lock().unwrap().clear();
    }
}

// =============================================================================
// MockConnector / MockSession
// =============================================================================

/// Connector serving [`AddressSpace`] sessions.
#[derive(Clone)]
pub struct MockConnector {
    pub space: Arc<AddressSpace>,
    pub control: Arc<MockControl>,
}

impl MockConnector {
    pub fn new(space: AddressSpace) -> Self {
        Self {
            space: Arc::new(space),
            control: Arc::new(MockControl::default()),
        }
    }

    pub fn standard() -> Self {
        Self::new(AddressSpace::standard())
    }
}

#[async_trait]
impl OpcUaConnector for MockConnector {
    async fn connect(
        &self,
        endpoint: &str,
        _config: &ClientConfig,
    ) -> OpcUaResult<Box<dyn OpcUaSession>> {
        if let Some(reason) = self.control.refuse_connect.lock().unwrap().clone() {
            return Err(ConnectionError::refused_with_reason(endpoint, reason).into());
        }
        Ok(Box::new(MockSession {
            space: Arc::clone(&self.space),
            control: Arc::clone(&self.control),
            pending: Mutex::new(HashMap::new()),
            next_point: AtomicUsize::new(1),
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Session over the mock address space.
pub struct MockSession {
    space: Arc<AddressSpace>,
    control: Arc<MockControl>,
    pending: Mutex<HashMap<Vec<u8>, Vec<BrowseResult>>>,
    next_point: AtomicUsize,
}

impl MockSession {
    fn page(&self, mut references: Vec<BrowseResult>) -> BrowsePage {
        let page_size = *self.control.page_size.lock().unwrap();
        match page_size {
            Some(size) if references.len() > size => {
                let rest = references.split_off(size);
                let point = self.next_point.fetch_add(1, Ordering::Relaxed).to_be_bytes().to_vec();
                self.pending.lock().unwrap().insert(point.clone(), rest);
                BrowsePage {
                    references,
                    continuation_point: Some(point),
                }
            }
            _ => BrowsePage::complete(references),
        }
    }
}

#[async_trait]
impl OpcUaSession for MockSession {
    async fn read(&self, requests: &[ReadRequest]) -> OpcUaResult<Vec<ReadResult>> {
        self.control.read_batches.lock().unwrap().push(requests.to_vec());

        let delay = requests.first().and_then(|request| {
            self.control
                .read_delays
                .lock()
                .unwrap()
                .get(&request.node_id)
                .copied()
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self.control.fail_read.lock().unwrap().clone();
        if let Some(request) = requests.iter().find(|r| failing.contains(&r.node_id)) {
            return Err(OpcUaError::read_failed(
                request.node_id.to_string(),
                "injected read failure",
            ));
        }

        let live = self.control.live_values.lock().unwrap().clone();
        Ok(requests
            .iter()
            .map(|request| {
                let key = (request.node_id.clone(), request.attribute_id);
                match (self.space.get(&request.node_id), live.get(&key)) {
                    (Some(_), Some(value)) => ReadResult::success(value.clone()),
                    (Some(node), None) => node.read(request.attribute_id),
                    (None, _) => ReadResult::failure(status::BAD_NODE_ID_UNKNOWN),
                }
            })
            .collect())
    }

    async fn browse(&self, request: &BrowseRequest) -> OpcUaResult<BrowsePage> {
        self.control.browse_calls.fetch_add(1, Ordering::Relaxed);

        if self.control.fail_browse.lock().unwrap().contains(&request.node_id) {
            return Err(OpcUaError::browse_failed(
                request.node_id.to_string(),
                "injected browse failure",
            ));
        }
        if self.space.get(&request.node_id).is_none() {
            return Err(BrowseError::node_not_found(request.node_id.to_string()).into());
        }

        let references = self
            .space
            .children_of(&request.node_id)
            .iter()
            .filter_map(|id| self.space.get(id))
            .filter(|node| {
                request.node_class_mask == 0 || request.node_class_mask & node.class.value() != 0
            })
            .map(MockNode::reference)
            .collect();
        Ok(self.page(references))
    }

    async fn browse_next(&self, continuation_point: &[u8]) -> OpcUaResult<BrowsePage> {
        self.control.browse_next_calls.fetch_add(1, Ordering::Relaxed);

        let invalid = *self.control.invalidate_continuation.lock().unwrap();
        let rest = self.pending.lock().unwrap().remove(continuation_point);
        match rest {
            Some(rest) if !invalid => Ok(self.page(rest)),
            _ => Err(opcsh_opcua::OperationError::bad_status(
                "continuation",
                status::BAD_CONTINUATION_POINT_INVALID,
            )
            .into()),
        }
    }

    async fn write(
        &self,
        node_id: &NodeId,
        attribute_id: AttributeId,
        _value: OpcUaValue,
    ) -> OpcUaResult<WriteResult> {
        match self.space.get(node_id) {
            Some(node) if node.class.supports(attribute_id) => {
                Ok(WriteResult::failure(node_id.clone(), status::BAD_NOT_WRITABLE))
            }
            Some(_) => Ok(WriteResult::failure(
                node_id.clone(),
                status::BAD_ATTRIBUTE_ID_INVALID,
            )),
            None => Ok(WriteResult::failure(node_id.clone(), status::BAD_NODE_ID_UNKNOWN)),
        }
    }

    fn endpoint_url(&self) -> &str {
        RESOLVED_ENDPOINT
    }

    async fn close(&mut self) -> OpcUaResult<()> {
        self.control.closed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// A gateway over the standard space, already connected.
pub async fn connected_gateway() -> (SessionGateway<MockConnector>, Arc<MockControl>) {
    connected_gateway_with(ClientConfig::default()).await
}

/// Like [`connected_gateway`] with a custom client configuration.
pub async fn connected_gateway_with(
    config: ClientConfig,
) -> (SessionGateway<MockConnector>, Arc<MockControl>) {
    let connector = MockConnector::standard();
    let control = Arc::clone(&connector.control);
    let mut gateway = SessionGateway::new(connector, config);
    gateway.connect(ENDPOINT).await.unwrap();
    (gateway, control)
}

/// Node ids of a listing, in order.
pub fn ids(nodes: &[opcsh_opcua::Node]) -> Vec<NodeId> {
    nodes.iter().map(|node| node.id().clone()).collect()
}
