// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client-side position in the address space.
//!
//! A [`Navigator`] keeps a root-first [`PathStack`] and the listing of the
//! current node's children. Every operation fetches what it needs first and
//! only then commits, so a failed call leaves both untouched.

use crate::browse::NodeBrowser;
use crate::error::OpcUaResult;
use crate::model::Node;
use crate::types::NodeId;

// =============================================================================
// PathStack
// =============================================================================

/// Root-first sequence of visited nodes. Never empty; the root is never
/// removed.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStack {
    root: Node,
    descendants: Vec<Node>,
}

impl PathStack {
    /// Creates a stack holding only `root`.
    pub fn new(root: Node) -> Self {
        Self {
            root,
            descendants: Vec::new(),
        }
    }

    /// The node on top of the stack.
    pub fn top(&self) -> &Node {
        self.descendants.last().unwrap_or(&self.root)
    }

    /// The entry below the top, `None` at the root.
    pub fn parent(&self) -> Option<&Node> {
        match self.descendants.len() {
            0 => None,
            1 => Some(&self.root),
            n => self.descendants.get(n - 2),
        }
    }

    /// The bottom entry.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of entries, root included.
    pub fn len(&self) -> usize {
        self.descendants.len() + 1
    }

    /// Always `false`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` when only the root is left.
    pub fn is_at_root(&self) -> bool {
        self.descendants.is_empty()
    }

    /// Iterates root-first.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        std::iter::once(&self.root).chain(self.descendants.iter())
    }

    fn push(&mut self, node: Node) {
        self.descendants.push(node);
    }

    fn pop(&mut self) -> Option<Node> {
        self.descendants.pop()
    }

    fn replace_top(&mut self, node: Node) {
        match self.descendants.last_mut() {
            Some(top) => *top = node,
            None => self.root = node,
        }
    }
}

// =============================================================================
// Navigator
// =============================================================================

/// Where the user is in the tree and what is listed there.
///
/// # Examples
///
/// ```rust,ignore
/// let mut navigator = Navigator::init(&gateway).await?;
/// assert_eq!(navigator.path(), vec!["Root"]);
///
/// if navigator.navigate_into(&gateway, "Objects").await? {
///     assert_eq!(navigator.path(), vec!["Root", "Objects"]);
/// }
/// navigator.navigate_back(&gateway).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: PathStack,
    listing: Vec<Node>,
}

impl Navigator {
    /// Reads the root folder and its children.
    ///
    /// # Errors
    ///
    /// Fails if either round-trip fails; no navigator exists then.
    pub async fn init<B>(browser: &B) -> OpcUaResult<Self>
    where
        B: NodeBrowser + ?Sized,
    {
        let root = browser.read_node(&NodeId::ROOT_FOLDER).await?;
        let listing = browser.browse(root.id()).await?;

        tracing::debug!(root = %root, children = listing.len(), "Navigator initialised");

        Ok(Self {
            stack: PathStack::new(root),
            listing,
        })
    }

    /// Enters the first listed child whose display name equals `name`.
    ///
    /// Returns `Ok(false)` without any change when no child matches.
    pub async fn navigate_into<B>(&mut self, browser: &B, name: &str) -> OpcUaResult<bool>
    where
        B: NodeBrowser + ?Sized,
    {
        let Some(target) = self.find_in_listing(name).cloned() else {
            tracing::debug!(name = name, "No child with that name");
            return Ok(false);
        };

        let listing = browser.browse(target.id()).await?;

        tracing::debug!(node = %target, children = listing.len(), "Entered node");
        self.stack.push(target);
        self.listing = listing;
        Ok(true)
    }

    /// Returns to the parent node.
    ///
    /// Returns `Ok(false)` without any change at the root.
    pub async fn navigate_back<B>(&mut self, browser: &B) -> OpcUaResult<bool>
    where
        B: NodeBrowser + ?Sized,
    {
        let Some(parent) = self.stack.parent() else {
            return Ok(false);
        };

        let listing = browser.browse(parent.id()).await?;

        self.stack.pop();
        tracing::debug!(node = %self.stack.top(), children = listing.len(), "Returned to parent");
        self.listing = listing;
        Ok(true)
    }

    /// Re-reads the current node and its children.
    ///
    /// The stack keeps its depth and ids; only the top entry and the listing
    /// are replaced.
    pub async fn refresh<B>(&mut self, browser: &B) -> OpcUaResult<()>
    where
        B: NodeBrowser + ?Sized,
    {
        let id = self.stack.top().id().clone();
        let node = browser.read_node(&id).await?;
        let listing = browser.browse(&id).await?;

        self.stack.replace_top(node);
        self.listing = listing;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Display names along the path, root first.
    pub fn path(&self) -> Vec<&str> {
        self.stack.iter().map(Node::display_name).collect()
    }

    /// Node ids along the path, root first.
    pub fn path_ids(&self) -> Vec<&NodeId> {
        self.stack.iter().map(Node::id).collect()
    }

    /// The path stack.
    pub fn stack(&self) -> &PathStack {
        &self.stack
    }

    /// The current node.
    pub fn current(&self) -> &Node {
        self.stack.top()
    }

    /// Children of the current node as last fetched.
    pub fn listing(&self) -> &[Node] {
        &self.listing
    }

    /// First listed child with the given display name.
    pub fn find_in_listing(&self, name: &str) -> Option<&Node> {
        self.listing.iter().find(|node| node.display_name() == name)
    }

    /// Number of path entries, root included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
