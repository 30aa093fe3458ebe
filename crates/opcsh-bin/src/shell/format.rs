// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Text rendering of listings and node details.
//!
//! Columns are left-aligned and padded to the widest entry plus
//! [`COLUMN_GAP`]. Every block ends with a blank line.

use std::fmt::Write as _;

use opcsh_opcua::{AttributeId, Node};

/// Padding added to the widest cell of a column.
pub const COLUMN_GAP: usize = 5;

/// Upper bound for the padded width of the value column in node details.
pub const MAX_VALUE_WIDTH: usize = 50;

/// Label used when a node carries no NodeClass attribute.
const UNKNOWN_CLASS: &str = "Unknown";

fn width<'a>(cells: impl Iterator<Item = &'a str>) -> usize {
    cells.map(|cell| cell.chars().count()).max().unwrap_or(0) + COLUMN_GAP
}

/// The NodeClass column of a listing row.
pub fn class_label(node: &Node) -> String {
    node.attribute(AttributeId::NodeClass)
        .map(|attribute| attribute.value().to_string())
        .unwrap_or_else(|| UNKNOWN_CLASS.to_string())
}

/// Renders children as `name  id  class` rows.
pub fn node_list(nodes: &[Node]) -> String {
    if nodes.is_empty() {
        return "\n".to_string();
    }

    let rows: Vec<(&str, String, String)> = nodes
        .iter()
        .map(|node| (node.display_name(), node.id().to_string(), class_label(node)))
        .collect();

    let name_width = width(rows.iter().map(|row| row.0));
    let id_width = width(rows.iter().map(|row| row.1.as_str()));
    let class_width = width(rows.iter().map(|row| row.2.as_str()));

    let mut out = String::new();
    for (name, id, class) in &rows {
        let _ = writeln!(
            out,
            "{:<name_width$} {:<id_width$} {:<class_width$}",
            name, id, class
        );
    }
    out.push('\n');
    out
}

/// Renders every attribute of `node` as `name  value` rows.
pub fn node_info(node: &Node) -> String {
    let rows: Vec<(&str, String)> = node
        .attributes()
        .iter()
        .map(|attribute| (attribute.name(), attribute.value().to_string()))
        .collect();

    let name_width = width(rows.iter().map(|row| row.0));
    let value_width = width(rows.iter().map(|row| row.1.as_str())).min(MAX_VALUE_WIDTH);

    let mut out = String::new();
    for (name, value) in &rows {
        let _ = writeln!(out, "{:<name_width$} {:<value_width$}", name, value);
    }
    out.push('\n');
    out
}

/// Help for the current connection state.
pub fn help(connected: bool) -> String {
    let mut out = String::new();
    if connected {
        for (usage, description) in [
            ("ls", "List directory"),
            ("cd {Node}", "Navigate to node"),
            ("cd ..", "Navigate to parent"),
            ("Read", "Read attributes of current node"),
            ("Read {Node}", "Read attributes of given node"),
        ] {
            let _ = writeln!(out, "{:<15} {}", usage, description);
        }
    } else {
        out.push_str("Connect {HOST} - Connect to host\n");
        out.push_str("Exit - Exit the application\n");
    }
    out.push('\n');
    out
}

// =============================================================================
// Tests
// =============================================================================
