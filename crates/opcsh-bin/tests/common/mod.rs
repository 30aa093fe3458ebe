// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! A small in-memory server for shell tests.
//!
//! ```text
//! Root (i=84)
//! ├── Objects (i=85)
//! │   ├── Pump (ns=1;s=Pump)
//! │   │   └── Speed (ns=1;s=Pump.Speed)    Variable, 42.5, DataType Double
//! │   └── Empty Folder (ns=1;s=Empty)
//! └── Views (i=87)
//! ```

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use opcsh_bin::Shell;
use opcsh_config::OutputFormat;
use opcsh_opcua::client::{
    status, BrowsePage, BrowseRequest, BrowseResult, OpcUaConnector, OpcUaSession, OpcUaValue,
    ReadRequest, ReadResult, WriteResult,
};
use opcsh_opcua::{
    AttributeId, ClientConfig, ConnectionError, NodeClass, NodeId, OpcUaError, OpcUaResult,
};

pub const ENDPOINT: &str = "opc.tcp://plant:4840";
/// What endpoint discovery on [`ENDPOINT`] resolves to.
pub const RESOLVED_ENDPOINT: &str = "opc.tcp://plant.local:4840/ua";

pub fn pump() -> NodeId {
    NodeId::string(1, "Pump")
}

pub fn speed() -> NodeId {
    NodeId::string(1, "Pump.Speed")
}

struct Entry {
    name: &'static str,
    class: NodeClass,
    value: Option<OpcUaValue>,
    data_type: Option<NodeId>,
    children: Vec<NodeId>,
}

fn entry(name: &'static str, class: NodeClass, children: Vec<NodeId>) -> Entry {
    Entry {
        name,
        class,
        value: None,
        data_type: None,
        children,
    }
}

fn plant() -> HashMap<NodeId, Entry> {
    let mut nodes = HashMap::new();
    nodes.insert(
        NodeId::ROOT_FOLDER,
        entry(
            "Root",
            NodeClass::Object,
            vec![NodeId::OBJECTS_FOLDER, NodeId::VIEWS_FOLDER],
        ),
    );
    nodes.insert(
        NodeId::OBJECTS_FOLDER,
        entry(
            "Objects",
            NodeClass::Object,
            vec![pump(), NodeId::string(1, "Empty")],
        ),
    );
    nodes.insert(NodeId::VIEWS_FOLDER, entry("Views", NodeClass::Object, vec![]));
    nodes.insert(pump(), entry("Pump", NodeClass::Object, vec![speed()]));
    nodes.insert(
        NodeId::string(1, "Empty"),
        entry("Empty Folder", NodeClass::Object, vec![]),
    );
    nodes.insert(
        speed(),
        Entry {
            value: Some(OpcUaValue::Double(42.5)),
            data_type: Some(NodeId::numeric(0, 11)),
            ..entry("Speed", NodeClass::Variable, vec![])
        },
    );
    nodes.insert(NodeId::numeric(0, 11), entry("Double", NodeClass::DataType, vec![]));
    nodes
}

/// Failure injection shared by the connector and its sessions.
#[derive(Debug, Default)]
pub struct Control {
    pub refuse_connect: Mutex<bool>,
    pub fail_browse: Mutex<HashSet<NodeId>>,
    pub closed: AtomicUsize,
}

impl Control {
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::Relaxed)
    }
}

#[derive(Clone)]
pub struct PlantConnector {
    pub control: Arc<Control>,
}

impl PlantConnector {
    pub fn new() -> Self {
        Self {
            control: Arc::new(Control::default()),
        }
    }
}

#[async_trait]
impl OpcUaConnector for PlantConnector {
    async fn connect(
        &self,
        endpoint: &str,
        _config: &ClientConfig,
    ) -> OpcUaResult<Box<dyn OpcUaSession>> {
        if *self.control.refuse_connect.lock().unwrap() {
            return Err(ConnectionError::refused(endpoint).into());
        }
        Ok(Box::new(PlantSession {
            nodes: plant(),
            control: Arc::clone(&self.control),
        }))
    }

    fn name(&self) -> &'static str {
        "plant"
    }
}

struct PlantSession {
    nodes: HashMap<NodeId, Entry>,
    control: Arc<Control>,
}

impl PlantSession {
    fn read_one(&self, request: &ReadRequest) -> ReadResult {
        let Some(entry) = self.nodes.get(&request.node_id) else {
            return ReadResult::failure(status::BAD_NODE_ID_UNKNOWN);
        };
        if !entry.class.supports(request.attribute_id) {
            return ReadResult::failure(status::BAD_ATTRIBUTE_ID_INVALID);
        }
        let value = match request.attribute_id {
            AttributeId::NodeId => OpcUaValue::NodeId(request.node_id.clone()),
            AttributeId::NodeClass => OpcUaValue::Int32(entry.class.value() as i32),
            AttributeId::BrowseName | AttributeId::DisplayName => OpcUaValue::text(entry.name),
            AttributeId::Value => entry.value.clone().unwrap_or_default(),
            AttributeId::DataType => entry
                .data_type
                .clone()
                .map(OpcUaValue::NodeId)
                .unwrap_or_default(),
            _ => OpcUaValue::Null,
        };
        ReadResult::success(value)
    }
}

#[async_trait]
impl OpcUaSession for PlantSession {
    async fn read(&self, requests: &[ReadRequest]) -> OpcUaResult<Vec<ReadResult>> {
        Ok(requests.iter().map(|r| self.read_one(r)).collect())
    }

    async fn browse(&self, request: &BrowseRequest) -> OpcUaResult<BrowsePage> {
        if self.control.fail_browse.lock().unwrap().contains(&request.node_id) {
            return Err(OpcUaError::browse_failed(
                request.node_id.to_string(),
                "injected browse failure",
            ));
        }
        let children = self
            .nodes
            .get(&request.node_id)
            .map(|entry| entry.children.clone())
            .unwrap_or_default();
        let references = children
            .into_iter()
            .filter_map(|id| {
                self.nodes.get(&id).map(|entry| BrowseResult {
                    node_id: id.clone(),
                    browse_name: entry.name.to_string(),
                    display_name: entry.name.to_string(),
                    node_class: entry.class.value(),
                    reference_type: None,
                    type_definition: None,
                })
            })
            .collect();
        Ok(BrowsePage::complete(references))
    }

    async fn browse_next(&self, _continuation_point: &[u8]) -> OpcUaResult<BrowsePage> {
        Ok(BrowsePage::default())
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
        RESOLVED_ENDPOINT
    }

    async fn close(&mut self) -> OpcUaResult<()> {
        self.control.closed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// =============================================================================
// Shell Helpers
// =============================================================================

pub type TestShell = Shell<PlantConnector, Vec<u8>>;

pub fn shell_with(output: OutputFormat) -> (TestShell, Arc<Control>) {
    let connector = PlantConnector::new();
    let control = Arc::clone(&connector.control);
    (
        Shell::new(connector, ClientConfig::default(), output, Vec::new()),
        control,
    )
}

pub fn shell() -> (TestShell, Arc<Control>) {
    shell_with(OutputFormat::Text)
}

pub async fn connected_shell() -> (TestShell, Arc<Control>) {
    let (mut shell, control) = shell();
    shell.execute(&format!("connect {}", ENDPOINT)).await.unwrap();
    assert!(shell.is_connected());
    (shell, control)
}

/// Runs one line and returns what it printed.
pub async fn run(shell: &mut TestShell, line: &str) -> String {
    let before = shell.writer().len();
    shell.execute(line).await.unwrap();
    String::from_utf8(shell.writer()[before..].to_vec()).unwrap()
}
