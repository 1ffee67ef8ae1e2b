use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Resource name matching every resource in [`Permission::covers`].
pub const ANY_RESOURCE: &str = "*";

/// Privacy masking setting of a permission record.
///
/// Storage keeps this column either as a boolean or as an integer level; only
/// `false` and `0` lift masking.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaskSetting {
    Flag(bool),
    Level(i64),
}

impl MaskSetting {
    pub fn lifts_masking(self) -> bool {
        matches!(self, MaskSetting::Flag(false) | MaskSetting::Level(0))
    }
}

/// CRUD action gated by the per-resource flags of a permission record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    List,
    Read,
    Change,
    Delete,
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::List => "list",
            Action::Read => "read",
            Action::Change => "change",
            Action::Delete => "delete",
        })
    }
}

/// A permission record granted to an actor through a role.
///
/// Records are read-only once loaded. The CRUD flags apply to `resource`; the
/// remaining flags each unlock one authorization axis for every resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub resource: Cow<'static, str>,

    /// Role the record was granted through. Informational only: evaluation
    /// composes the flags of every record an actor holds.
    #[serde(rename = "role_name", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub change: bool,
    #[serde(default)]
    pub delete: bool,

    /// Personal-data masking; `false`/`0` lifts it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<MaskSetting>,
    /// Access to other tenants.
    #[serde(default)]
    pub tenant: bool,
    /// Access to other users.
    #[serde(default)]
    pub user: bool,
    /// Changing user account state.
    #[serde(default)]
    pub state: bool,
    /// System administrator.
    #[serde(rename = "super", default)]
    pub super_user: bool,
}

impl Permission {
    pub fn new(resource: impl Into<Cow<'static, str>>) -> Self {
        Self {
            resource: resource.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_actions(mut self, actions: &[Action]) -> Self {
        for action in actions {
            match action {
                Action::Create => self.create = true,
                Action::List => self.list = true,
                Action::Read => self.read = true,
                Action::Change => self.change = true,
                Action::Delete => self.delete = true,
            }
        }
        self
    }

    pub fn with_mask(mut self, mask: MaskSetting) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_cross_tenant(mut self) -> Self {
        self.tenant = true;
        self
    }

    pub fn with_cross_user(mut self) -> Self {
        self.user = true;
        self
    }

    pub fn with_state_change(mut self) -> Self {
        self.state = true;
        self
    }

    pub fn with_super_user(mut self) -> Self {
        self.super_user = true;
        self
    }

    pub fn as_str(&self) -> &str {
        &self.resource
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == ANY_RESOURCE
    }

    pub fn covers(&self, resource: &str) -> bool {
        self.is_wildcard() || self.as_str() == resource
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.create,
            Action::List => self.list,
            Action::Read => self.read,
            Action::Change => self.change,
            Action::Delete => self.delete,
        }
    }

    pub fn lifts_masking(&self) -> bool {
        self.mask.is_some_and(MaskSetting::lifts_masking)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.role {
            Some(role) => write!(f, "{}@{}", self.resource, role),
            None => f.write_str(&self.resource),
        }
    }
}
