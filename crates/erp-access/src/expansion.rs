//! Per-node expand/collapse state for the sidebar

use crate::nav::NavTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happens to open flags when the active view changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionPolicy {
    /// Flags are seeded once at mount; later navigation leaves them alone
    #[default]
    SeedOnce,
    /// Branches that become active on navigation are opened; other flags
    /// keep whatever the user chose
    FollowActive,
}

/// Open flags keyed by view id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    policy: ExpansionPolicy,
    open: BTreeMap<String, bool>,
}

impl ExpansionState {
    /// Seed every node's flag from whether it is active for `active_view`
    #[must_use]
    pub fn mount(tree: &NavTree, active_view: &str, policy: ExpansionPolicy) -> Self {
        let open = tree
            .flatten()
            .into_iter()
            .map(|node| (node.view.clone(), node.is_active(active_view)))
            .collect();
        Self { policy, open }
    }

    /// Policy in effect
    #[inline]
    #[must_use]
    pub fn policy(&self) -> ExpansionPolicy {
        self.policy
    }

    /// Whether `view` is expanded; unknown views are collapsed
    #[must_use]
    pub fn is_open(&self, view: &str) -> bool {
        self.open.get(view).copied().unwrap_or(false)
    }

    /// Flip one node; returns the new flag
    pub fn toggle(&mut self, view: &str) -> bool {
        let flag = self.open.entry(view.to_string()).or_insert(false);
        *flag = !*flag;
        *flag
    }

    /// React to the active view changing, according to the policy
    pub fn navigate(&mut self, tree: &NavTree, active_view: &str) {
        match self.policy {
            ExpansionPolicy::SeedOnce => {}
            ExpansionPolicy::FollowActive => {
                for node in tree.flatten() {
                    if node.is_active(active_view) {
                        self.open.insert(node.view.clone(), true);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NavNode;

    fn tree() -> NavTree {
        NavTree::new(vec![
            NavNode::new("Sales", "Sales")
                .with_children(vec![NavNode::new("Invoices", "Sales/Invoices")]),
            NavNode::new("Finance", "Finance")
                .with_children(vec![NavNode::new("Ledger", "Finance/Ledger")]),
        ])
    }

    #[test]
    fn mount_opens_active_branch_only() {
        let state = ExpansionState::mount(&tree(), "Sales/Invoices", ExpansionPolicy::SeedOnce);
        assert!(state.is_open("Sales"));
        assert!(state.is_open("Sales/Invoices"));
        assert!(!state.is_open("Finance"));
        assert!(!state.is_open("Nowhere"));
    }

    #[test]
    fn toggle_flips_and_reports() {
        let mut state = ExpansionState::mount(&tree(), "Dashboard", ExpansionPolicy::default());
        assert!(state.toggle("Finance"));
        assert!(state.is_open("Finance"));
        assert!(!state.toggle("Finance"));
        assert!(!state.is_open("Finance"));
    }

    #[test]
    fn seed_once_ignores_navigation() {
        let tree = tree();
        let mut state = ExpansionState::mount(&tree, "Sales", ExpansionPolicy::SeedOnce);
        state.navigate(&tree, "Finance/Ledger");
        assert!(state.is_open("Sales"));
        assert!(!state.is_open("Finance"));
    }

    #[test]
    fn follow_active_opens_new_branch_and_keeps_choices() {
        let tree = tree();
        let mut state = ExpansionState::mount(&tree, "Sales", ExpansionPolicy::FollowActive);
        state.navigate(&tree, "Finance/Ledger");
        assert!(state.is_open("Finance"));
        assert!(state.is_open("Sales"));

        state.toggle("Sales");
        state.navigate(&tree, "Finance");
        assert!(!state.is_open("Sales"));
    }
}
