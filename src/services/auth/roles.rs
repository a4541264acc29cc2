use std::collections::{HashMap, HashSet};

/// Static role -> allowed operation names.
///
/// Built once at startup and shared read-only; there is no write path.
#[derive(Debug, Clone)]
pub struct RolePermissions {
    permissions: HashMap<String, HashSet<String>>,
}

impl RolePermissions {
    pub fn new<R, O>(entries: impl IntoIterator<Item = (R, Vec<O>)>) -> Self
    where
        R: Into<String>,
        O: Into<String>,
    {
        let permissions = entries
            .into_iter()
            .map(|(role, ops)| (role.into(), ops.into_iter().map(Into::into).collect()))
            .collect();

        Self { permissions }
    }

    /// Banking defaults: admins manage customers and accounts, customers transact.
    pub fn banking() -> Self {
        Self::new([
            (
                "admin",
                vec![
                    "GetAllActiveCustomer",
                    "GetAllInActiveCustomer",
                    "GetCustomer",
                    "GetAllCustomer",
                    "NewAccount",
                    "NewTransaction",
                ],
            ),
            ("user", vec!["GetCustomer", "NewTransaction"]),
        ])
    }

    pub fn is_authorized(&self, role: &str, operation: &str) -> bool {
        self.permissions
            .get(role)
            .is_some_and(|ops| ops.contains(operation.trim()))
    }
}
