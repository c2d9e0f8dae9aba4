//! The application's fixed permission vocabulary
//!
//! Navigation entries and page-level gates reuse these tokens. There is no
//! runtime registration; a new feature needs a new constant here.

use crate::permission::Permission;

macro_rules! vocabulary {
    ($($name:ident => $token:literal),* $(,)?) => {
        $(
            #[doc = concat!("`", $token, "`")]
            pub const $name: Permission = Permission::from_static($token);
        )*

        /// Every permission in the vocabulary
        pub const ALL: &[Permission] = &[$($name),*];
    };
}

vocabulary! {
    BRANCHES_READ => "branches:read",
    BRANCHES_CREATE => "branches:create",
    BRANCHES_UPDATE => "branches:update",
    BRANCHES_DELETE => "branches:delete",

    SALES_READ => "sales:read",
    SALES_CREATE => "sales:create",
    SALES_UPDATE => "sales:update",
    SALES_DELETE => "sales:delete",

    PURCHASES_READ => "purchases:read",
    PURCHASES_CREATE => "purchases:create",
    PURCHASES_UPDATE => "purchases:update",
    PURCHASES_DELETE => "purchases:delete",

    CUSTOMERS_READ => "customers:read",
    CUSTOMERS_CREATE => "customers:create",
    CUSTOMERS_UPDATE => "customers:update",
    CUSTOMERS_DELETE => "customers:delete",

    SUPPLIERS_READ => "suppliers:read",
    SUPPLIERS_CREATE => "suppliers:create",
    SUPPLIERS_UPDATE => "suppliers:update",
    SUPPLIERS_DELETE => "suppliers:delete",

    PRODUCTS_READ => "products:read",
    PRODUCTS_CREATE => "products:create",
    PRODUCTS_UPDATE => "products:update",
    PRODUCTS_DELETE => "products:delete",

    INVENTORY_READ => "inventory:read",
    INVENTORY_CREATE => "inventory:create",
    INVENTORY_UPDATE => "inventory:update",
    INVENTORY_DELETE => "inventory:delete",

    HR_READ => "hr:read",
    HR_CREATE => "hr:create",
    HR_UPDATE => "hr:update",
    HR_DELETE => "hr:delete",

    PAYROLL_READ => "payroll:read",
    PAYROLL_CREATE => "payroll:create",
    PAYROLL_UPDATE => "payroll:update",

    MANUFACTURING_READ => "manufacturing:read",
    MANUFACTURING_CREATE => "manufacturing:create",
    MANUFACTURING_UPDATE => "manufacturing:update",

    FINANCE_READ => "finance:read",
    FINANCE_CREATE => "finance:create",
    FINANCE_UPDATE => "finance:update",

    POS_READ => "pos:read",
    POS_CREATE => "pos:create",
    POS_UPDATE => "pos:update",

    REPORTS_READ => "reports:read",

    USERS_READ => "users:read",
    USERS_CREATE => "users:create",
    USERS_UPDATE => "users:update",
    USERS_DELETE => "users:delete",

    SETTINGS_READ => "settings:read",
    SETTINGS_UPDATE => "settings:update",
}

/// Vocabulary entry for `token`, if any
#[must_use]
pub fn lookup(token: &str) -> Option<&'static Permission> {
    ALL.iter().find(|p| p.as_str() == token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_unique_and_well_formed() {
        let mut seen = HashSet::new();
        for permission in ALL {
            assert!(seen.insert(permission.as_str()), "duplicate {permission}");
            assert!(Permission::parse(permission.as_str()).is_ok());
        }
    }

    #[test]
    fn lookup_finds_known_tokens_only() {
        assert_eq!(lookup("sales:read"), Some(&SALES_READ));
        assert!(lookup("sales:approve").is_none());
    }
}
