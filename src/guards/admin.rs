use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    guards::{GuardDecision, NavigationContext, NavigationGuard},
    permissions::{AdminPermissionPolicy, PermissionSet, PermissionSourceState, PolicyState},
    route::NavigationTarget,
    routes::HOME,
    session::SessionState,
};

/// PermissionGate
///
/// Guards every route whose effective meta requires admin.
///
/// *Mechanism*:
/// 1. If the session is logged in and its permissions were never loaded, load
///    them (joining a fetch another navigation already started).
/// 2. Evaluate the policy for the target's route name.
/// 3. Proceed when granted. Otherwise, and on any fetch failure, redirect home.
///
/// Anonymous sessions never fetch; they are judged on whatever is cached.
pub struct PermissionGate {
    session: SessionState,
    source: PermissionSourceState,
    policy: PolicyState,
    fallback: NavigationTarget,
}

impl PermissionGate {
    pub fn new(session: SessionState, source: PermissionSourceState) -> Self {
        Self {
            session,
            source,
            policy: Arc::new(AdminPermissionPolicy),
            fallback: NavigationTarget::named(HOME),
        }
    }

    pub fn with_policy(mut self, policy: PolicyState) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fallback(mut self, fallback: NavigationTarget) -> Self {
        self.fallback = fallback;
        self
    }

    fn deny(&self) -> GuardDecision {
        GuardDecision::Redirect(self.fallback.clone())
    }
}

#[async_trait]
impl NavigationGuard for PermissionGate {
    async fn before_each(&self, context: &NavigationContext) -> GuardDecision {
        if !context.target.meta.requires_admin {
            return GuardDecision::Proceed;
        }

        let cache = self.session.permissions();
        let permissions = if !cache.is_loaded() && self.session.is_logged() {
            match cache.load(&self.source).await {
                Ok(permissions) => permissions,
                Err(error) => {
                    tracing::warn!(%error, route = context.target.identifier(), "permission fetch failed, redirecting");
                    return self.deny();
                }
            }
        } else {
            cache.snapshot().unwrap_or_else(PermissionSet::new)
        };

        let route = context.target.identifier();
        if self.policy.has_admin_permission(&permissions, route) {
            GuardDecision::Proceed
        } else {
            tracing::info!(route, "admin permission missing, redirecting");
            self.deny()
        }
    }
}
