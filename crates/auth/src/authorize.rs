//! Authorization of an actor against tenant, user, privacy, state and
//! system-level scopes.
//!
//! Every privilege axis is decided the same way: the check passes when the
//! context is in force mode or when **any** permission record held by the
//! actor unlocks the axis; otherwise it falls back to an exact identity match.
//! Composition is disjunctive across records, so roles never need to be
//! merged at load time.
//!
//! - No IO
//! - No panics
//! - No shared state

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use tenantgate_core::{Classify, ErrorKind, TenantId, UserId, ensure, ensure_some};

use crate::{Action, Actor, Permission};

/// One independent privilege axis a permission record can unlock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Act on resources of other tenants (`permission.tenant`).
    CrossTenant,
    /// Act on resources of other users (`permission.user`).
    CrossUser,
    /// See unmasked personal data (`permission.mask` is `false`/`0`).
    UnmaskPrivacy,
    /// Change user account state (`permission.state`).
    ChangeUserState,
    /// System-only operations (`permission.super`).
    SuperUser,
}

impl Axis {
    pub const ALL: [Axis; 5] = [
        Axis::CrossTenant,
        Axis::CrossUser,
        Axis::UnmaskPrivacy,
        Axis::ChangeUserState,
        Axis::SuperUser,
    ];

    pub fn unlocked_by(self, permission: &Permission) -> bool {
        match self {
            Axis::CrossTenant => permission.tenant,
            Axis::CrossUser => permission.user,
            Axis::UnmaskPrivacy => permission.lifts_masking(),
            Axis::ChangeUserState => permission.state,
            Axis::SuperUser => permission.super_user,
        }
    }
}

impl core::fmt::Display for Axis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Axis::CrossTenant => "cross_tenant",
            Axis::CrossUser => "cross_user",
            Axis::UnmaskPrivacy => "unmask_privacy",
            Axis::ChangeUserState => "change_user_state",
            Axis::SuperUser => "super_user",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl AuthzError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl Classify for AuthzError {
    fn kind(&self) -> ErrorKind {
        match self {
            AuthzError::Forbidden(_) => ErrorKind::Forbidden,
            AuthzError::BadRequest(_) => ErrorKind::BadRequest,
            AuthzError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// What unlocked an axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Grant {
    Force,
    Permission {
        resource: String,
        role: Option<String>,
    },
}

/// Audit view of a single axis decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisExplanation {
    pub axis: Axis,
    pub granted: bool,
    pub grant: Option<Grant>,
    pub reason: String,
}

/// Per-call authorization scope: the acting user plus the force switch.
///
/// Force mode bypasses every axis and is reserved for trusted internal
/// callers. It lives on the context, so it is visible at the call site and
/// ends with the call.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationContext<'a> {
    actor: Option<&'a Actor>,
    force: bool,
}

impl<'a> AuthorizationContext<'a> {
    pub fn new(actor: &'a Actor) -> Self {
        Self {
            actor: Some(actor),
            force: false,
        }
    }

    /// A context with no resolved actor (e.g. a background job).
    pub fn without_actor() -> Self {
        Self {
            actor: None,
            force: false,
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn is_forced(&self) -> bool {
        self.force
    }

    pub fn actor(&self) -> Option<&'a Actor> {
        self.actor
    }

    /// The acting user's id; [`UserId::SYSTEM`] for a forced context without
    /// an actor.
    pub fn actor_id(&self) -> Option<UserId> {
        match self.actor {
            Some(actor) => Some(actor.id()),
            None if self.force => Some(UserId::SYSTEM),
            None => None,
        }
    }

    // ── Axis predicates ─────────────────────────────────────────────────────

    /// What unlocks `axis` for this context, if anything.
    pub fn grant(&self, axis: Axis) -> Option<Grant> {
        if self.force {
            return Some(Grant::Force);
        }
        self.actor
            .and_then(|actor| actor.find_permission(|p| axis.unlocked_by(p)))
            .map(|p| Grant::Permission {
                resource: p.resource.to_string(),
                role: p.role.clone(),
            })
    }

    pub fn holds(&self, axis: Axis) -> bool {
        self.force
            || self
                .actor
                .is_some_and(|actor| actor.permissions().iter().any(|p| axis.unlocked_by(p)))
    }

    pub fn has_cross_tenant(&self) -> bool {
        self.holds(Axis::CrossTenant)
    }

    pub fn has_cross_user(&self) -> bool {
        self.holds(Axis::CrossUser)
    }

    pub fn can_unmask_privacy(&self) -> bool {
        self.holds(Axis::UnmaskPrivacy)
    }

    /// Whether personal data must stay masked in responses.
    pub fn should_mask_privacy(&self) -> bool {
        !self.can_unmask_privacy()
    }

    pub fn has_change_user_state(&self) -> bool {
        self.holds(Axis::ChangeUserState)
    }

    pub fn is_super_user(&self) -> bool {
        self.holds(Axis::SuperUser)
    }

    pub fn explain(&self, axis: Axis) -> AxisExplanation {
        let grant = self.grant(axis);
        let reason = match (&grant, self.actor) {
            (Some(Grant::Force), _) => "force mode bypasses every axis".to_string(),
            (Some(Grant::Permission { resource, role }), _) => match role {
                Some(role) => format!("unlocked by permission '{resource}' of role '{role}'"),
                None => format!("unlocked by permission '{resource}'"),
            },
            (None, Some(actor)) => format!(
                "none of the {} permission record(s) held by user {} unlock {axis}",
                actor.permissions().len(),
                actor.id()
            ),
            (None, None) => "no actor is bound to the request".to_string(),
        };

        AxisExplanation {
            axis,
            granted: grant.is_some(),
            grant,
            reason,
        }
    }

    // ── Tenant scope ────────────────────────────────────────────────────────

    /// Fail unless the actor may act on `requested`.
    ///
    /// An absent request value stands for the actor's own tenant.
    pub fn assert_tenant_access(&self, requested: Option<TenantId>) -> Result<(), AuthzError> {
        if self.has_cross_tenant() {
            return Ok(());
        }

        let actor = self.require_actor(AuthzError::Forbidden)?;
        let tenant_id = requested.unwrap_or(actor.tenant_id());
        ensure(tenant_id == actor.tenant_id(), || {
            deny(Axis::CrossTenant, actor);
            AuthzError::forbidden(format!(
                "tenant {tenant_id} is outside the actor's tenant {}",
                actor.tenant_id()
            ))
        })
    }

    /// Tenant a newly created resource lands in.
    ///
    /// Cross-tenant actors may target any tenant they name; everybody else
    /// creates in their own tenant regardless of the request.
    pub fn resolve_tenant_for_create(
        &self,
        requested: Option<TenantId>,
    ) -> Result<TenantId, AuthzError> {
        if self.has_cross_tenant() {
            if let Some(tenant_id) = requested {
                return Ok(tenant_id);
            }
        }

        Ok(self.require_actor(AuthzError::NotFound)?.tenant_id())
    }

    /// Tenant filter for reads.
    ///
    /// Cross-tenant actors get the requested value back verbatim (`None`
    /// meaning every tenant); everybody else is pinned to their own tenant.
    pub fn resolve_tenant_for_read(
        &self,
        requested: Option<TenantId>,
    ) -> Result<Option<TenantId>, AuthzError> {
        if self.has_cross_tenant() {
            return Ok(requested);
        }

        let actor = self.require_actor(AuthzError::NotFound)?;
        Ok(Some(actor.tenant_id()))
    }

    /// Fail when a batch spans tenants the actor may not touch.
    ///
    /// Without cross-tenant rights the batch must resolve to exactly one
    /// tenant, the actor's own. An empty batch therefore fails too.
    pub fn assert_multi_tenant_consistency<I>(&self, tenant_ids: I) -> Result<(), AuthzError>
    where
        I: IntoIterator<Item = TenantId>,
    {
        if self.has_cross_tenant() {
            return Ok(());
        }

        let actor = self.require_actor(AuthzError::Forbidden)?;
        let distinct: BTreeSet<TenantId> = tenant_ids.into_iter().collect();
        let single_own_tenant =
            distinct.len() == 1 && distinct.first() == Some(&actor.tenant_id());

        ensure(single_own_tenant, || {
            deny(Axis::CrossTenant, actor);
            AuthzError::forbidden(format!(
                "batch spans tenants {distinct:?}; actor is limited to tenant {}",
                actor.tenant_id()
            ))
        })
    }

    // ── User scope ──────────────────────────────────────────────────────────

    /// Fail unless the actor may act on resources owned by `target`.
    pub fn assert_user_access(&self, target: UserId) -> Result<(), AuthzError> {
        if self.has_cross_user() {
            return Ok(());
        }

        let actor = self.require_actor(AuthzError::Forbidden)?;
        ensure(actor.id() == target, || {
            deny(Axis::CrossUser, actor);
            AuthzError::forbidden(format!("user {} cannot act on user {target}", actor.id()))
        })
    }

    /// Fail unless the actor may change the account state of `target`.
    pub fn assert_state_change(&self, target: UserId) -> Result<(), AuthzError> {
        if self.has_change_user_state() {
            return Ok(());
        }

        let actor = self.require_actor(AuthzError::Forbidden)?;
        ensure(actor.id() == target, || {
            deny(Axis::ChangeUserState, actor);
            AuthzError::forbidden(format!(
                "user {} cannot change the state of user {target}",
                actor.id()
            ))
        })
    }

    /// Super-users may not alter their own account state through the state
    /// change path. Not enforced for anyone else.
    pub fn assert_no_self_state_change(
        &self,
        actor_id: UserId,
        target_id: UserId,
    ) -> Result<(), AuthzError> {
        if !self.is_super_user() {
            return Ok(());
        }

        ensure(actor_id != target_id, || {
            AuthzError::bad_request(format!("the actor({actor_id}) cannot change self state"))
        })
    }

    // ── System scope ────────────────────────────────────────────────────────

    pub fn assert_super_user(&self) -> Result<(), AuthzError> {
        if self.is_super_user() {
            return Ok(());
        }

        let actor = self.require_actor(AuthzError::Forbidden)?;
        deny(Axis::SuperUser, actor);
        Err(AuthzError::forbidden(format!(
            "user {} is not a system administrator",
            actor.id()
        )))
    }

    // ── Resource actions ────────────────────────────────────────────────────

    /// Fail unless some permission record covering `resource` allows `action`.
    pub fn assert_action(&self, resource: &str, action: Action) -> Result<(), AuthzError> {
        if self.force {
            return Ok(());
        }

        let actor = self.require_actor(AuthzError::Forbidden)?;
        let allowed = actor
            .permissions()
            .iter()
            .any(|p| p.covers(resource) && p.allows(action));

        ensure(allowed, || {
            debug!(user_id = %actor.id(), %resource, %action, "action denied");
            AuthzError::forbidden(format!("missing '{action}' permission on '{resource}'"))
        })
    }

    fn require_actor(
        &self,
        err: fn(String) -> AuthzError,
    ) -> Result<&'a Actor, AuthzError> {
        ensure_some(self.actor, || err("the actor is invalid".to_string()))
    }
}

fn deny(axis: Axis, actor: &Actor) {
    debug!(
        %axis,
        user_id = %actor.id(),
        tenant_id = %actor.tenant_id(),
        permissions = actor.permissions().len(),
        "authorization axis denied"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::permissions::{ANY_RESOURCE, MaskSetting};

    const OWN_TENANT: TenantId = TenantId::new(7);

    fn actor_with(permissions: Vec<Permission>) -> Actor {
        Actor::new(UserId::new(100), OWN_TENANT, permissions)
    }

    fn plain_actor() -> Actor {
        actor_with(vec![
            Permission::new("orders")
                .with_role("operator")
                .with_actions(&[Action::Read, Action::List])
                .with_mask(MaskSetting::Level(1)),
        ])
    }

    fn granting(axis: Axis) -> Permission {
        let p = Permission::new(ANY_RESOURCE).with_role("admin");
        match axis {
            Axis::CrossTenant => p.with_cross_tenant(),
            Axis::CrossUser => p.with_cross_user(),
            Axis::UnmaskPrivacy => p.with_mask(MaskSetting::Flag(false)),
            Axis::ChangeUserState => p.with_state_change(),
            Axis::SuperUser => p.with_super_user(),
        }
    }

    #[test]
    fn tenant_access_requires_own_tenant_without_bypass() {
        let actor = plain_actor();
        let ctx = AuthorizationContext::new(&actor);

        let err = ctx.assert_tenant_access(Some(TenantId::new(9))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        assert!(ctx.assert_tenant_access(Some(OWN_TENANT)).is_ok());
        assert!(ctx.assert_tenant_access(None).is_ok());
    }

    #[test]
    fn tenant_access_bypassed_by_permission_or_force() {
        let actor = actor_with(vec![granting(Axis::CrossTenant)]);
        assert!(
            AuthorizationContext::new(&actor)
                .assert_tenant_access(Some(TenantId::new(9)))
                .is_ok()
        );

        let plain = plain_actor();
        assert!(
            AuthorizationContext::new(&plain)
                .force(true)
                .assert_tenant_access(Some(TenantId::new(9)))
                .is_ok()
        );
    }

    #[test]
    fn tenant_access_without_actor_is_forbidden() {
        let err = AuthorizationContext::without_actor()
            .assert_tenant_access(Some(OWN_TENANT))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn create_tenant_is_pinned_without_bypass() {
        let actor = plain_actor();
        let ctx = AuthorizationContext::new(&actor);
        assert_eq!(ctx.resolve_tenant_for_create(Some(TenantId::new(99))), Ok(OWN_TENANT));
        assert_eq!(ctx.resolve_tenant_for_create(None), Ok(OWN_TENANT));
    }

    #[test]
    fn create_tenant_follows_request_with_bypass() {
        let actor = actor_with(vec![granting(Axis::CrossTenant)]);
        let ctx = AuthorizationContext::new(&actor);
        assert_eq!(
            ctx.resolve_tenant_for_create(Some(TenantId::new(99))),
            Ok(TenantId::new(99))
        );
        assert_eq!(ctx.resolve_tenant_for_create(None), Ok(OWN_TENANT));

        let forced = AuthorizationContext::without_actor().force(true);
        assert_eq!(
            forced.resolve_tenant_for_create(Some(TenantId::new(3))),
            Ok(TenantId::new(3))
        );
        assert_eq!(
            forced.resolve_tenant_for_create(None).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn read_tenant_resolution() {
        let actor = plain_actor();
        assert_eq!(
            AuthorizationContext::new(&actor).resolve_tenant_for_read(Some(TenantId::new(9))),
            Ok(Some(OWN_TENANT))
        );

        let admin = actor_with(vec![granting(Axis::CrossTenant)]);
        let ctx = AuthorizationContext::new(&admin);
        assert_eq!(ctx.resolve_tenant_for_read(Some(TenantId::new(9))), Ok(Some(TenantId::new(9))));
        assert_eq!(ctx.resolve_tenant_for_read(None), Ok(None));

        let err = AuthorizationContext::without_actor()
            .resolve_tenant_for_read(Some(OWN_TENANT))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn super_user_cannot_change_own_state() {
        let admin = actor_with(vec![granting(Axis::SuperUser)]);
        let ctx = AuthorizationContext::new(&admin);

        let err = ctx
            .assert_no_self_state_change(admin.id(), admin.id())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(ctx.assert_no_self_state_change(admin.id(), UserId::new(5)).is_ok());
    }

    #[test]
    fn self_state_rule_not_enforced_for_regular_users() {
        let actor = plain_actor();
        let ctx = AuthorizationContext::new(&actor);
        assert!(ctx.assert_no_self_state_change(actor.id(), actor.id()).is_ok());
    }

    #[test]
    fn multi_tenant_consistency() {
        let actor = plain_actor();
        let ctx = AuthorizationContext::new(&actor);

        assert!(ctx.assert_multi_tenant_consistency([OWN_TENANT, OWN_TENANT]).is_ok());
        assert!(
            ctx.assert_multi_tenant_consistency([OWN_TENANT, TenantId::new(8)])
                .is_err()
        );
        assert!(ctx.assert_multi_tenant_consistency([TenantId::new(8)]).is_err());
        assert!(ctx.assert_multi_tenant_consistency(Vec::new()).is_err());

        let admin = actor_with(vec![granting(Axis::CrossTenant)]);
        assert!(
            AuthorizationContext::new(&admin)
                .assert_multi_tenant_consistency([OWN_TENANT, TenantId::new(8)])
                .is_ok()
        );
    }

    #[test]
    fn user_and_state_axes_fall_back_to_identity() {
        let actor = plain_actor();
        let ctx = AuthorizationContext::new(&actor);

        assert!(ctx.assert_user_access(actor.id()).is_ok());
        assert!(ctx.assert_user_access(UserId::new(1)).is_err());
        assert!(ctx.assert_state_change(actor.id()).is_ok());
        assert!(ctx.assert_state_change(UserId::new(1)).is_err());

        let manager = actor_with(vec![granting(Axis::CrossUser), granting(Axis::ChangeUserState)]);
        let ctx = AuthorizationContext::new(&manager);
        assert!(ctx.assert_user_access(UserId::new(1)).is_ok());
        assert!(ctx.assert_state_change(UserId::new(1)).is_ok());
    }

    #[test]
    fn masking_follows_mask_flag() {
        let actor = plain_actor();
        assert!(AuthorizationContext::new(&actor).should_mask_privacy());

        let auditor = actor_with(vec![Permission::new("users").with_mask(MaskSetting::Level(0))]);
        assert!(!AuthorizationContext::new(&auditor).should_mask_privacy());
    }

    #[test]
    fn super_user_gate() {
        let actor = plain_actor();
        assert_eq!(
            AuthorizationContext::new(&actor).assert_super_user().unwrap_err().kind(),
            ErrorKind::Forbidden
        );

        let admin = actor_with(vec![granting(Axis::SuperUser)]);
        assert!(AuthorizationContext::new(&admin).assert_super_user().is_ok());
    }

    #[test]
    fn action_gate_matches_resource_and_flag() {
        let actor = plain_actor();
        let ctx = AuthorizationContext::new(&actor);

        assert!(ctx.assert_action("orders", Action::Read).is_ok());
        assert!(ctx.assert_action("orders", Action::Delete).is_err());
        assert!(ctx.assert_action("users", Action::Read).is_err());

        let wildcard = actor_with(vec![Permission::new(ANY_RESOURCE).with_actions(&[Action::Delete])]);
        assert!(
            AuthorizationContext::new(&wildcard)
                .assert_action("users", Action::Delete)
                .is_ok()
        );

        assert!(
            AuthorizationContext::without_actor()
                .force(true)
                .assert_action("users", Action::Delete)
                .is_ok()
        );
    }

    #[test]
    fn force_mode_reports_system_actor() {
        assert_eq!(AuthorizationContext::without_actor().actor_id(), None);
        assert_eq!(
            AuthorizationContext::without_actor().force(true).actor_id(),
            Some(UserId::SYSTEM)
        );

        let actor = plain_actor();
        assert_eq!(
            AuthorizationContext::new(&actor).force(true).actor_id(),
            Some(actor.id())
        );
    }

    #[test]
    fn explanation_names_the_unlocking_record() {
        let admin = actor_with(vec![plain_actor().permissions()[0].clone(), granting(Axis::SuperUser)]);
        let explained = AuthorizationContext::new(&admin).explain(Axis::SuperUser);

        assert!(explained.granted);
        assert_eq!(
            explained.grant,
            Some(Grant::Permission {
                resource: ANY_RESOURCE.to_string(),
                role: Some("admin".to_string()),
            })
        );

        let denied = AuthorizationContext::new(&admin).explain(Axis::CrossTenant);
        assert!(!denied.granted);
        assert!(denied.reason.contains("2 permission record(s)"));

        let forced = AuthorizationContext::without_actor().force(true).explain(Axis::CrossUser);
        assert_eq!(forced.grant, Some(Grant::Force));
    }

    fn arb_permission() -> impl Strategy<Value = Permission> {
        (
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            prop::option::of(prop_oneof![
                any::<bool>().prop_map(MaskSetting::Flag),
                (0i64..3).prop_map(MaskSetting::Level),
            ]),
        )
            .prop_map(|(tenant, user, state, super_user, mask)| Permission {
                tenant,
                user,
                state,
                super_user,
                mask,
                ..Permission::new("orders")
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Adding a record that unlocks one axis makes that axis pass and
        /// leaves every other axis untouched.
        #[test]
        fn adding_a_grant_only_unlocks_its_axis(
            permissions in prop::collection::vec(arb_permission(), 0..5),
            axis_index in 0usize..5,
        ) {
            let axis = Axis::ALL[axis_index];
            let before = actor_with(permissions.clone());
            let mut extended = permissions;
            extended.push(granting(axis));
            let after = actor_with(extended);

            let before_ctx = AuthorizationContext::new(&before);
            let after_ctx = AuthorizationContext::new(&after);

            prop_assert!(after_ctx.holds(axis));
            for other in Axis::ALL.into_iter().filter(|a| *a != axis) {
                prop_assert_eq!(before_ctx.holds(other), after_ctx.holds(other));
            }
        }

        /// Force mode passes every axis regardless of permissions.
        #[test]
        fn force_passes_every_axis(permissions in prop::collection::vec(arb_permission(), 0..5)) {
            let actor = actor_with(permissions);
            let ctx = AuthorizationContext::new(&actor).force(true);
            for axis in Axis::ALL {
                prop_assert!(ctx.holds(axis));
            }
            prop_assert!(ctx.assert_tenant_access(Some(TenantId::new(12345))).is_ok());
        }
    }
}
