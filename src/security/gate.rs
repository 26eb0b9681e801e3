//! Route access decisions for the portal's admin and member areas.
//!
//! The gate is a pure function of a request path and an optional session
//! token. It never fails: any token it cannot make sense of becomes a
//! [`Viewer::Unresolved`], which the configured [`UnresolvedSessionPolicy`]
//! maps onto one of the two other kinds of viewer.

use tracing::debug;

use super::claims::{Role, TokenVerifier, Viewer};
use crate::config::{GateConfig, SecurityConfig, UnresolvedSessionPolicy};

/// Outcome of running a request through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Forward the request unchanged.
    Allow,
    /// Send the client elsewhere.
    Redirect(String),
}

#[derive(Debug)]
pub struct AccessGate {
    routes: GateConfig,
    verifier: TokenVerifier,
}

impl AccessGate {
    pub fn new(routes: GateConfig, verifier: TokenVerifier) -> Self {
        Self { routes, verifier }
    }

    pub fn from_config(routes: &GateConfig, security: &SecurityConfig) -> Self {
        let verifier = if security.verify_signature {
            TokenVerifier::hs256(&security.jwt_secret)
        } else {
            TokenVerifier::Unverified
        };
        Self::new(routes.clone(), verifier)
    }

    /// Name of the cookie holding the session token.
    pub fn cookie_name(&self) -> &str {
        &self.routes.cookie_name
    }

    /// Work out who is asking from the session cookie value, if any.
    pub fn resolve(&self, token: Option<&str>) -> Viewer {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Viewer::Anonymous;
        };
        match self.verifier.claims(token) {
            Ok(claims) => Viewer::from_claims(&claims),
            Err(e) => {
                debug!(name: "gate.token.rejected", error = %e, "Session token yields no claims");
                Viewer::Unresolved
            }
        }
    }

    pub fn decide(&self, path: &str, token: Option<&str>) -> Decision {
        self.decide_for(path, self.resolve(token))
    }

    /// Decide for an already resolved viewer.
    pub fn decide_for(&self, path: &str, viewer: Viewer) -> Decision {
        let routes = &self.routes;
        let in_admin = under_prefix(path, &routes.admin_prefix);
        let in_user = under_prefix(path, &routes.user_prefix);
        let admin_public = routes.admin_public_routes.iter().any(|r| r == path);
        let user_public = routes.user_public_routes.iter().any(|r| r == path);

        let viewer = match (viewer, routes.unresolved_session) {
            (Viewer::Unresolved, UnresolvedSessionPolicy::Anonymous) => Viewer::Anonymous,
            (viewer, _) => viewer,
        };

        if viewer == Viewer::Anonymous {
            if in_admin && !admin_public {
                return Decision::Redirect(routes.admin_login.clone());
            }
            if in_user && !user_public {
                return Decision::Redirect(routes.user_login.clone());
            }
            return Decision::Allow;
        }

        let role = viewer.role();

        // Signed in but back on a login/signup page
        if role == Some(Role::User) && user_public {
            return Decision::Redirect(routes.user_dashboard.clone());
        }
        if role == Some(Role::Admin) && admin_public {
            return Decision::Redirect(routes.admin_dashboard.clone());
        }

        if in_admin && role != Some(Role::Admin) {
            return Decision::Redirect(routes.user_dashboard.clone());
        }
        if in_user && role != Some(Role::User) {
            return Decision::Redirect(routes.admin_dashboard.clone());
        }

        Decision::Allow
    }
}

/// `/admin` covers `/admin` and `/admin/...`, not `/administrator`.
fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
