//! ERP Access - roles, permissions and the permission-gated navigation tree
//!
//! - [`Permission`] tokens (`domain:action`) from a fixed [`vocabulary`]
//! - [`Role`]s mapped to permission sets by a [`RoleMatrix`]
//! - One [`Authorizer`] definition of "authorized", consumed everywhere
//! - A static [`NavTree`] filtered per user, with prefix-match activation
//!   and per-node expand/collapse state
//!
//! # Example
//!
//! ```rust,ignore
//! use erp_access::prelude::*;
//!
//! let matrix = RoleMatrix::standard();
//! let user = User::for_role("amal", Role::Cashier, &matrix);
//!
//! let sidebar = Sidebar::mount(&erp_navigation(), &user, &SetMembership, "Pos/Sessions",
//!     ExpansionPolicy::SeedOnce);
//! for row in sidebar.rows() {
//!     println!("{}{}", "  ".repeat(row.depth), row.label);
//! }
//! ```

#![warn(unreachable_pub)]

pub mod catalog;
pub mod error;
pub mod expansion;
pub mod menu;
pub mod nav;
pub mod permission;
pub mod role;
pub mod user;
pub mod vocabulary;

pub use catalog::erp_navigation;
pub use error::AccessError;
pub use expansion::{ExpansionPolicy, ExpansionState};
pub use menu::{render, MenuRow, Sidebar};
pub use nav::{NavNode, NavTree, UnreachableNode};
pub use permission::{Permission, PermissionSet};
pub use role::{Role, RoleMatrix};
pub use user::{Authorizer, SetMembership, User};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for access checks and navigation
    pub use crate::{
        erp_navigation, Authorizer, ExpansionPolicy, ExpansionState, NavNode, NavTree,
        Permission, PermissionSet, Role, RoleMatrix, SetMembership, Sidebar, User,
    };
}
