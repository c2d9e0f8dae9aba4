//! Users and the single authorization predicate

use crate::permission::{Permission, PermissionSet};
use crate::role::{Role, RoleMatrix};
use serde::{Deserialize, Serialize};

/// Signed-in user with resolved permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name
    pub name: String,
    /// Assigned role
    pub role: Role,
    /// Effective permissions
    #[serde(default)]
    pub permissions: PermissionSet,
}

impl User {
    /// User whose permissions are the role's grants in `matrix`
    #[must_use]
    pub fn for_role(name: impl Into<String>, role: Role, matrix: &RoleMatrix) -> Self {
        Self {
            name: name.into(),
            role,
            permissions: matrix.permissions_for(role),
        }
    }

    /// User with an explicit permission set
    #[must_use]
    pub fn with_permissions(
        name: impl Into<String>,
        role: Role,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            permissions: permissions.into_iter().collect(),
        }
    }
}

/// The one definition of "authorized"
///
/// Navigation filtering and page gates both go through this trait so a
/// user can never see a link to a page that would then refuse them.
pub trait Authorizer: Send + Sync {
    /// Whether `user` holds `permission`
    fn can(&self, user: &User, permission: &Permission) -> bool;

    /// Gate with an optional requirement; `None` is open to everyone
    fn permits(&self, user: &User, required: Option<&Permission>) -> bool {
        required.map_or(true, |permission| self.can(user, permission))
    }
}

/// Exact set membership
#[derive(Debug, Clone, Copy, Default)]
pub struct SetMembership;

impl Authorizer for SetMembership {
    #[inline]
    fn can(&self, user: &User, permission: &Permission) -> bool {
        user.permissions.contains(permission)
    }
}
