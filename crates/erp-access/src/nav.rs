//! Navigation tree and the per-user visibility filter
//!
//! The tree is static application data. Filtering never mutates it: each
//! call to [`NavTree::visible_for`] returns a fresh pruned copy.

use crate::permission::Permission;
use crate::role::RoleMatrix;
use crate::user::{Authorizer, User};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One entry in the sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavNode {
    /// Text shown to the user
    pub label: String,
    /// View identifier, also the node's key
    pub view: String,
    /// Required permission; `None` means visible to everyone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    /// Child entries in display order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
}

impl NavNode {
    /// Ungated leaf
    #[must_use]
    pub fn new(label: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            view: view.into(),
            permission: None,
            children: Vec::new(),
        }
    }

    /// Require `permission` to see this node and its subtree
    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    /// Set the children
    #[must_use]
    pub fn with_children(mut self, children: Vec<NavNode>) -> Self {
        self.children = children;
        self
    }

    /// Whether the node has children
    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Prefix match against the current view
    ///
    /// `"Sales"` is active for `"Sales/Invoices"` and also for `"SalesTax"`;
    /// callers relying on exact segments must pick non-overlapping view ids.
    #[inline]
    #[must_use]
    pub fn is_active(&self, active_view: &str) -> bool {
        active_view.starts_with(self.view.as_str())
    }

    /// Pruned copy of this node, or `None` if `user` may not see it
    #[must_use]
    pub fn visible_for(&self, user: &User, authorizer: &dyn Authorizer) -> Option<NavNode> {
        if !authorizer.permits(user, self.permission.as_ref()) {
            return None;
        }
        Some(NavNode {
            label: self.label.clone(),
            view: self.view.clone(),
            permission: self.permission.clone(),
            children: self
                .children
                .iter()
                .filter_map(|child| child.visible_for(user, authorizer))
                .collect(),
        })
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a NavNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }
}

/// Node whose permission no role is granted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreachableNode {
    /// View of the hidden node
    pub view: String,
    /// The permission nobody holds
    pub permission: Permission,
}

/// Ordered top-level navigation entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavTree {
    nodes: Vec<NavNode>,
}

impl NavTree {
    /// Tree with the given top-level nodes
    #[must_use]
    pub fn new(nodes: Vec<NavNode>) -> Self {
        Self { nodes }
    }

    /// Top-level nodes
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[NavNode] {
        &self.nodes
    }

    /// Number of top-level nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether there are no top-level nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The subset of the tree `user` may see
    ///
    /// A node the user lacks the permission for is dropped together with its
    /// whole subtree; a visible node's children are filtered by the same
    /// rule. An ungated node stays even when all its children are dropped.
    #[must_use]
    pub fn visible_for(&self, user: &User, authorizer: &dyn Authorizer) -> NavTree {
        let nodes: Vec<NavNode> = self
            .nodes
            .iter()
            .filter_map(|node| node.visible_for(user, authorizer))
            .collect();
        debug!(
            user = %user.name,
            role = %user.role,
            visible = nodes.len(),
            total = self.nodes.len(),
            "filtered navigation"
        );
        NavTree { nodes }
    }

    /// Every node, depth first, parents before children
    #[must_use]
    pub fn flatten(&self) -> Vec<&NavNode> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.walk(&mut out);
        }
        out
    }

    /// First node (depth first) with exactly this view id
    #[must_use]
    pub fn find(&self, view: &str) -> Option<&NavNode> {
        self.flatten().into_iter().find(|node| node.view == view)
    }

    /// Nodes gated on a permission that no role in `matrix` grants
    ///
    /// Such nodes are silently hidden from everyone. This only reports them;
    /// filtering is unaffected.
    #[must_use]
    pub fn unreachable_permissions(&self, matrix: &RoleMatrix) -> Vec<UnreachableNode> {
        self.flatten()
            .into_iter()
            .filter_map(|node| {
                let permission = node.permission.as_ref()?;
                (!matrix.grants_anywhere(permission)).then(|| UnreachableNode {
                    view: node.view.clone(),
                    permission: permission.clone(),
                })
            })
            .collect()
    }
}

impl From<Vec<NavNode>> for NavTree {
    fn from(nodes: Vec<NavNode>) -> Self {
        Self::new(nodes)
    }
}
