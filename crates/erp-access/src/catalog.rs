//! The application's navigation tree

use crate::nav::{NavNode, NavTree};
use crate::permission::Permission;
use crate::vocabulary as v;

fn entry(label: &str, view: &str, permission: Permission) -> NavNode {
    NavNode::new(label, view).with_permission(permission)
}

/// Sidebar shipped with the ERP front end
#[must_use]
pub fn erp_navigation() -> NavTree {
    NavTree::new(vec![
        NavNode::new("Dashboard", "Dashboard"),
        entry("Branches", "Branches", v::BRANCHES_READ),
        entry("Sales", "Sales", v::SALES_READ).with_children(vec![
            entry("Invoices", "Sales/Invoices", v::SALES_READ),
            entry("Customers", "Sales/Customers", v::CUSTOMERS_READ),
            entry("Returns", "Sales/Returns", v::SALES_UPDATE),
        ]),
        entry("Purchases", "Purchases", v::PURCHASES_READ).with_children(vec![
            entry("Orders", "Purchases/Orders", v::PURCHASES_READ),
            entry("Suppliers", "Purchases/Suppliers", v::SUPPLIERS_READ),
        ]),
        entry("Inventory", "Inventory", v::INVENTORY_READ).with_children(vec![
            entry("Products", "Inventory/Products", v::PRODUCTS_READ),
            entry("Stock", "Inventory/Stock", v::INVENTORY_READ),
            entry("Adjustments", "Inventory/Adjustments", v::INVENTORY_UPDATE),
        ]),
        entry("HR", "Hr", v::HR_READ).with_children(vec![
            entry("Employees", "Hr/Employees", v::HR_READ),
            entry("Payroll", "Hr/Payroll", v::PAYROLL_READ),
        ]),
        entry("Manufacturing", "Manufacturing", v::MANUFACTURING_READ).with_children(vec![
            entry("Work Orders", "Manufacturing/WorkOrders", v::MANUFACTURING_READ),
            entry("Bills of Material", "Manufacturing/Boms", v::MANUFACTURING_UPDATE),
        ]),
        entry("Finance", "Finance", v::FINANCE_READ).with_children(vec![
            entry("Ledger", "Finance/Ledger", v::FINANCE_READ),
            entry("Reports", "Finance/Reports", v::REPORTS_READ),
        ]),
        entry("POS", "Pos", v::POS_READ).with_children(vec![
            entry("Sessions", "Pos/Sessions", v::POS_READ),
            entry("New Sale", "Pos/NewSale", v::POS_CREATE),
        ]),
        NavNode::new("Settings", "Settings").with_children(vec![
            entry("Users", "Settings/Users", v::USERS_READ),
            entry("General", "Settings/General", v::SETTINGS_READ),
        ]),
    ])
}
