// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA client plumbing.
//!
//! - **Transport Layer**: the [`OpcUaConnector`] / [`OpcUaSession`] seam and
//!   the plain request/result types that cross it
//! - **Real Transport**: the `opcua` crate backend (feature `real-transport`)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       SessionGateway                            │
//! │          (connect / read / browse / write, statistics)          │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │               OpcUaConnector ──► OpcUaSession                   │
//! │                  (abstract transport layer)                     │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │           RealOpcUaConnector / in-memory test doubles           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod transport;

#[cfg(feature = "real-transport")]
mod real_transport;

pub use transport::{
    status, BrowsePage, BrowseRequest, BrowseResult, OpcUaConnector, OpcUaSession, OpcUaValue,
    ReadRequest, ReadResult, WriteResult,
};

#[cfg(feature = "real-transport")]
pub use real_transport::{RealOpcUaConnector, RealOpcUaSession};
