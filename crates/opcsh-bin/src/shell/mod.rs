// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The interactive command loop.
//!
//! The shell owns one [`SessionGateway`] and, while connected, one
//! [`Navigator`]. Each input line is parsed into a [`Command`] and executed
//! to completion before the next prompt is written.
//!
//! ```text
//!   stdin ──► Command::parse ──► Shell::execute ──► Navigator ──► SessionGateway
//!                                     │
//!   stdout ◄── format / JSON ◄────────┘
//! ```
//!
//! Failures of a single command are printed and the loop goes on; the
//! navigator guarantees that a failed operation leaves its state unchanged.

mod command;
pub mod format;

pub use command::Command;

use std::io::Write;

use opcsh_config::OutputFormat;
use opcsh_opcua::{ClientConfig, Navigator, Node, OpcUaConnector, OpcUaError, SessionGateway};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::BinResult;

// =============================================================================
// Messages
// =============================================================================

/// Printed when connecting or initialising navigation fails.
pub const MSG_CONNECT_FAILED: &str = "Error while connecting to host";
/// Printed for unrecognised input.
pub const MSG_UNKNOWN_COMMAND: &str = "Unknown command";
/// Printed when `cd` has no argument.
pub const MSG_MISSING_PARAMETERS: &str = "Missing parameters";
/// Printed when `read` or `cd` names no listed child.
pub const MSG_NODE_NOT_FOUND: &str = "Node was not found";
/// Printed for `write`.
pub const MSG_NOT_IMPLEMENTED: &str = "Not implemented";

// =============================================================================
// Flow
// =============================================================================

/// What the loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Prompt for the next line.
    Continue,
    /// Leave the loop.
    Exit,
}

// =============================================================================
// Shell
// =============================================================================

/// Interactive shell over one OPC UA session.
pub struct Shell<C: OpcUaConnector, W: Write> {
    gateway: SessionGateway<C>,
    navigator: Option<Navigator>,
    output: OutputFormat,
    out: W,
}

impl<C: OpcUaConnector, W: Write> Shell<C, W> {
    /// Creates a disconnected shell writing to `out`.
    pub fn new(connector: C, config: ClientConfig, output: OutputFormat, out: W) -> Self {
        Self {
            gateway: SessionGateway::new(connector, config),
            navigator: None,
            output,
            out,
        }
    }

    /// Returns `true` when a session is open and navigation is initialised.
    pub fn is_connected(&self) -> bool {
        self.gateway.is_connected() && self.navigator.is_some()
    }

    /// The session gateway.
    pub fn gateway(&self) -> &SessionGateway<C> {
        &self.gateway
    }

    /// The navigator, while connected.
    pub fn navigator(&self) -> Option<&Navigator> {
        self.navigator.as_ref()
    }

    /// The output sink.
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// The prompt for the current state: `<endpoint>/<path>> ` when
    /// connected, `> ` otherwise. The endpoint is the one the session
    /// resolved to, not the address that was typed.
    pub fn prompt(&self) -> String {
        match (self.gateway.endpoint(), &self.navigator) {
            (Some(endpoint), Some(navigator)) => {
                format!("{}/{}> ", endpoint, navigator.path().join("/"))
            }
            _ => "> ".to_string(),
        }
    }

    // =========================================================================
    // Loop
    // =========================================================================

    /// Reads commands from `input` until `exit`, end of input, or Ctrl-C.
    ///
    /// An open session is closed before returning.
    pub async fn run<R>(&mut self, input: R) -> BinResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        loop {
            write!(self.out, "{}", self.prompt())?;
            self.out.flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    writeln!(self.out)?;
                    tracing::debug!("Interrupted");
                    None
                }
            };

            let Some(line) = line else {
                break;
            };

            if self.execute(&line).await? == Flow::Exit {
                break;
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Executes one input line.
    ///
    /// Only output failures are returned; protocol failures are printed.
    pub async fn execute(&mut self, line: &str) -> BinResult<Flow> {
        let command = Command::parse(line);
        tracing::trace!(?command, "Executing");

        match command {
            Command::Empty => {}
            Command::Help => {
                let help = format::help(self.is_connected());
                self.out.write_all(help.as_bytes())?;
            }
            Command::Exit => return Ok(Flow::Exit),
            command if self.is_connected() => self.execute_connected(command).await?,
            Command::Connect(address) => {
                self.connect(address.as_deref().unwrap_or("")).await?;
            }
            _ => self.message(MSG_UNKNOWN_COMMAND)?,
        }

        Ok(Flow::Continue)
    }

    /// Connects and initialises navigation at the root folder.
    ///
    /// Returns `false` after printing the connect failure message.
    pub async fn connect(&mut self, address: &str) -> BinResult<bool> {
        if let Err(e) = self.try_connect(address).await {
            e.log("connect");
            self.message(MSG_CONNECT_FAILED)?;
            return Ok(false);
        }
        Ok(true)
    }

    async fn try_connect(&mut self, address: &str) -> Result<(), OpcUaError> {
        self.gateway.connect(address).await?;

        match Navigator::init(&self.gateway).await {
            Ok(navigator) => {
                self.navigator = Some(navigator);
                Ok(())
            }
            Err(e) => {
                // Navigation never started; close the session again.
                if let Err(close) = self.gateway.disconnect().await {
                    tracing::debug!(error = %close, "Closing half-open session failed");
                }
                Err(e)
            }
        }
    }

    /// Closes the session if one is open.
    pub async fn shutdown(&mut self) {
        self.navigator = None;
        if self.gateway.is_connected() {
            if let Err(e) = self.gateway.disconnect().await {
                e.log("disconnect");
            }
        }
    }

    // =========================================================================
    // Connected State
    // =========================================================================

    async fn execute_connected(&mut self, command: Command) -> BinResult<()> {
        let Some(navigator) = self.navigator.as_mut() else {
            return self.message(MSG_UNKNOWN_COMMAND);
        };

        let result = match command {
            Command::List => match navigator.refresh(&self.gateway).await {
                Ok(()) => {
                    let listing = navigator.listing().to_vec();
                    return self.show_listing(&listing);
                }
                Err(e) => Err(e),
            },
            Command::Parent => navigator.navigate_back(&self.gateway).await.map(|_| ()),
            Command::ChangeDir(None) => return self.message(MSG_MISSING_PARAMETERS),
            Command::ChangeDir(Some(name)) => {
                match navigator.navigate_into(&self.gateway, &name).await {
                    Ok(true) => Ok(()),
                    Ok(false) => return self.message(MSG_NODE_NOT_FOUND),
                    Err(e) => Err(e),
                }
            }
            Command::Read(name) => {
                let node = match name {
                    Some(name) => navigator.find_in_listing(&name).cloned(),
                    None => Some(navigator.current().clone()),
                };
                return match node {
                    Some(node) => self.show_node(&node),
                    None => self.message(MSG_NODE_NOT_FOUND),
                };
            }
            Command::Write => return self.message(MSG_NOT_IMPLEMENTED),
            Command::Disconnect => {
                self.navigator = None;
                self.gateway.disconnect().await
            }
            _ => return self.message(MSG_UNKNOWN_COMMAND),
        };

        if let Err(e) = result {
            e.log("command");
            if e.is_not_connected() {
                self.navigator = None;
            }
            self.message(&e.user_message())?;
        }
        Ok(())
    }

    // =========================================================================
    // Output
    // =========================================================================

    fn message(&mut self, text: &str) -> BinResult<()> {
        writeln!(self.out, "{}", text)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn show_listing(&mut self, nodes: &[Node]) -> BinResult<()> {
        match self.output {
            OutputFormat::Text => self.out.write_all(format::node_list(nodes).as_bytes())?,
            OutputFormat::Json => self.json(nodes)?,
        }
        Ok(())
    }

    fn show_node(&mut self, node: &Node) -> BinResult<()> {
        match self.output {
            OutputFormat::Text => self.out.write_all(format::node_info(node).as_bytes())?,
            OutputFormat::Json => self.json(node)?,
        }
        Ok(())
    }

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> BinResult<()> {
        let text = serde_json::to_string_pretty(value)?;
        writeln!(self.out, "{}", text)?;
        Ok(())
    }
}
