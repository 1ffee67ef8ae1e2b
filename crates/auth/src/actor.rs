use serde::{Deserialize, Serialize};

use tenantgate_core::{TenantId, UserId};

use crate::Permission;

/// The authenticated user a request acts as, with every permission record it
/// holds.
///
/// Built once per request from a resolved identity and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: UserId,
    tenant_id: TenantId,
    #[serde(default)]
    permissions: Vec<Permission>,
}

impl Actor {
    pub fn new(id: UserId, tenant_id: TenantId, permissions: Vec<Permission>) -> Self {
        Self {
            id,
            tenant_id,
            permissions,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// First permission record satisfying `predicate`.
    pub fn find_permission<F>(&self, predicate: F) -> Option<&Permission>
    where
        F: Fn(&Permission) -> bool,
    {
        self.permissions.iter().find(|&p| predicate(p))
    }
}
