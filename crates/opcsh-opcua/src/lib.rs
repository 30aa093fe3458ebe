// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA session gateway and address-space navigation for opcsh.
//!
//! # Features
//!
//! - One session at a time, with connection statistics
//! - Full attribute reads, filtered by node class
//! - Hierarchical browsing with continuation points
//! - A root-first navigation stack with cd / cd .. / refresh
//! - Attribute writes
//!
//! # Error Handling
//!
//! ```text
//! OpcUaError
//! ├── Connection    - Endpoint and session issues
//! ├── Browse        - Node browsing failures
//! ├── Operation     - Read/write failures and bad status codes
//! └── Configuration - Invalid settings
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use opcsh_opcua::{ClientConfig, Navigator, RealOpcUaConnector, SessionGateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut gateway = SessionGateway::new(RealOpcUaConnector::new(), ClientConfig::default());
//!     gateway.connect("opc.tcp://localhost:4840").await?;
//!
//!     let mut navigator = Navigator::init(&gateway).await?;
//!     navigator.navigate_into(&gateway, "Objects").await?;
//!     for node in navigator.listing() {
//!         println!("{}", node);
//!     }
//!
//!     gateway.disconnect().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod browse;
pub mod client;
pub mod error;
pub mod gateway;
pub mod model;
pub mod navigator;
pub mod types;

pub use error::{
    BrowseError, ConfigurationError, ConnectionError, ErrorCode, ErrorSeverity, OpcUaError,
    OpcUaResult, OperationError,
};

pub use types::{
    attribute_name, AttributeId, BrowseDirection, ClientConfig, ClientConfigBuilder, NodeClass,
    NodeId, NodeIdentifier, SecurityMode, SecurityPolicy, UserTokenType,
};

pub use client::{OpcUaConnector, OpcUaSession, OpcUaValue};

#[cfg(feature = "real-transport")]
pub use client::RealOpcUaConnector;

pub use browse::{BrowseOptions, NodeBrowser};
pub use gateway::{GatewayStats, GatewayStatsSnapshot, SessionGateway, SessionInfo};
pub use model::{Attribute, AttributeValue, Node, ResolvedDataType};
pub use navigator::{Navigator, PathStack};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
