//! Roles and the role to permission matrix

use crate::error::AccessError;
use crate::permission::{Permission, PermissionSet};
use crate::vocabulary as v;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Fixed set of roles a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Everything
    Admin,
    /// Branch manager: reads everything, runs trading operations
    Manager,
    /// Finance and reporting
    Accountant,
    /// Sales desk
    SalesRep,
    /// Procurement
    Purchaser,
    /// Warehouse and stock
    Storekeeper,
    /// Staff records and payroll
    HrOfficer,
    /// Point of sale only
    Cashier,
}

impl Role {
    /// All roles in declaration order
    pub const ALL: [Role; 8] = [
        Role::Admin,
        Role::Manager,
        Role::Accountant,
        Role::SalesRep,
        Role::Purchaser,
        Role::Storekeeper,
        Role::HrOfficer,
        Role::Cashier,
    ];

    /// Snake-case name used on the wire and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Accountant => "accountant",
            Role::SalesRep => "sales_rep",
            Role::Purchaser => "purchaser",
            Role::Storekeeper => "storekeeper",
            Role::HrOfficer => "hr_officer",
            Role::Cashier => "cashier",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AccessError::UnknownRole(s.to_string()))
    }
}

/// Role to granted permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleMatrix {
    grants: BTreeMap<Role, PermissionSet>,
}

impl RoleMatrix {
    /// Matrix with no grants
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Default grants shipped with the application
    #[must_use]
    pub fn standard() -> Self {
        let reads = v::ALL.iter().filter(|p| p.action() == Some("read"));

        Self::empty()
            .grant(Role::Admin, v::ALL)
            .grant(Role::Manager, reads)
            .grant(
                Role::Manager,
                &[
                    v::SALES_CREATE,
                    v::SALES_UPDATE,
                    v::PURCHASES_CREATE,
                    v::PURCHASES_UPDATE,
                    v::INVENTORY_CREATE,
                    v::INVENTORY_UPDATE,
                ],
            )
            .grant(
                Role::Accountant,
                &[
                    v::FINANCE_READ,
                    v::FINANCE_CREATE,
                    v::FINANCE_UPDATE,
                    v::REPORTS_READ,
                    v::SALES_READ,
                    v::PURCHASES_READ,
                    v::PAYROLL_READ,
                    v::BRANCHES_READ,
                ],
            )
            .grant(
                Role::SalesRep,
                &[
                    v::SALES_READ,
                    v::SALES_CREATE,
                    v::SALES_UPDATE,
                    v::CUSTOMERS_READ,
                    v::CUSTOMERS_CREATE,
                    v::CUSTOMERS_UPDATE,
                    v::PRODUCTS_READ,
                    v::POS_READ,
                ],
            )
            .grant(
                Role::Purchaser,
                &[
                    v::PURCHASES_READ,
                    v::PURCHASES_CREATE,
                    v::PURCHASES_UPDATE,
                    v::PURCHASES_DELETE,
                    v::SUPPLIERS_READ,
                    v::SUPPLIERS_CREATE,
                    v::SUPPLIERS_UPDATE,
                    v::SUPPLIERS_DELETE,
                    v::PRODUCTS_READ,
                    v::INVENTORY_READ,
                ],
            )
            .grant(
                Role::Storekeeper,
                &[
                    v::INVENTORY_READ,
                    v::INVENTORY_CREATE,
                    v::INVENTORY_UPDATE,
                    v::INVENTORY_DELETE,
                    v::PRODUCTS_READ,
                    v::PRODUCTS_CREATE,
                    v::PRODUCTS_UPDATE,
                    v::MANUFACTURING_READ,
                ],
            )
            .grant(
                Role::HrOfficer,
                &[
                    v::HR_READ,
                    v::HR_CREATE,
                    v::HR_UPDATE,
                    v::HR_DELETE,
                    v::PAYROLL_READ,
                    v::PAYROLL_CREATE,
                    v::PAYROLL_UPDATE,
                    v::BRANCHES_READ,
                ],
            )
            .grant(
                Role::Cashier,
                &[
                    v::POS_READ,
                    v::POS_CREATE,
                    v::SALES_READ,
                    v::CUSTOMERS_READ,
                    v::PRODUCTS_READ,
                ],
            )
    }

    /// Add grants for `role` (builder style)
    #[must_use]
    pub fn grant<'a>(
        mut self,
        role: Role,
        permissions: impl IntoIterator<Item = &'a Permission>,
    ) -> Self {
        self.grants
            .entry(role)
            .or_default()
            .extend(permissions.into_iter().cloned());
        self
    }

    /// Permissions granted to `role`; empty if the role has no entry
    #[must_use]
    pub fn permissions_for(&self, role: Role) -> PermissionSet {
        self.grants.get(&role).cloned().unwrap_or_default()
    }

    /// Whether any role is granted `permission`
    #[must_use]
    pub fn grants_anywhere(&self, permission: &Permission) -> bool {
        self.grants.values().any(|set| set.contains(permission))
    }

    /// Roles holding `permission`
    pub fn roles_with<'a>(
        &'a self,
        permission: &'a Permission,
    ) -> impl Iterator<Item = Role> + 'a {
        self.grants
            .iter()
            .filter(move |(_, set)| set.contains(permission))
            .map(|(role, _)| *role)
    }
}
