//! Sidebar rendering

use crate::expansion::{ExpansionPolicy, ExpansionState};
use crate::nav::{NavNode, NavTree};
use crate::user::{Authorizer, User};
use serde::Serialize;

/// One visible sidebar line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuRow {
    /// Nesting level, 0 for top-level entries
    pub depth: usize,
    /// Text shown
    pub label: String,
    /// Target view id
    pub view: String,
    /// Highlighted for the current view
    pub active: bool,
    /// Children are shown below this row
    pub expanded: bool,
    /// Row can be expanded
    pub has_children: bool,
}

/// Depth-first rows for `tree`; children of collapsed nodes are skipped
#[must_use]
pub fn render(tree: &NavTree, state: &ExpansionState, active_view: &str) -> Vec<MenuRow> {
    let mut rows = Vec::new();
    for node in tree.nodes() {
        push_rows(node, 0, state, active_view, &mut rows);
    }
    rows
}

fn push_rows(
    node: &NavNode,
    depth: usize,
    state: &ExpansionState,
    active_view: &str,
    rows: &mut Vec<MenuRow>,
) {
    let expanded = node.has_children() && state.is_open(&node.view);
    rows.push(MenuRow {
        depth,
        label: node.label.clone(),
        view: node.view.clone(),
        active: node.is_active(active_view),
        expanded,
        has_children: node.has_children(),
    });
    if expanded {
        for child in &node.children {
            push_rows(child, depth + 1, state, active_view, rows);
        }
    }
}

/// A user's filtered tree together with its expansion state
#[derive(Debug, Clone)]
pub struct Sidebar {
    tree: NavTree,
    state: ExpansionState,
    active_view: String,
}

impl Sidebar {
    /// Filter `tree` for `user` and seed expansion from `active_view`
    #[must_use]
    pub fn mount(
        tree: &NavTree,
        user: &User,
        authorizer: &dyn Authorizer,
        active_view: &str,
        policy: ExpansionPolicy,
    ) -> Self {
        let tree = tree.visible_for(user, authorizer);
        let state = ExpansionState::mount(&tree, active_view, policy);
        Self {
            tree,
            state,
            active_view: active_view.to_string(),
        }
    }

    /// The filtered tree
    #[must_use]
    pub fn tree(&self) -> &NavTree {
        &self.tree
    }

    /// Current expansion state
    #[must_use]
    pub fn state(&self) -> &ExpansionState {
        &self.state
    }

    /// Current view id
    #[must_use]
    pub fn active_view(&self) -> &str {
        &self.active_view
    }

    /// Move to another view
    pub fn navigate(&mut self, view: &str) {
        self.active_view = view.to_string();
        self.state.navigate(&self.tree, view);
    }

    /// Flip one node's expansion; returns the new flag
    pub fn toggle(&mut self, view: &str) -> bool {
        self.state.toggle(view)
    }

    /// Rows to draw
    #[must_use]
    pub fn rows(&self) -> Vec<MenuRow> {
        render(&self.tree, &self.state, &self.active_view)
    }
}
