//! Route permission guard
//!
//! Each protected route names the permission it requires. A caller holds a
//! permission when the token lists it directly or when one of the token's
//! roles grants it under the configured role policy. A caller acting on
//! their own record (path `id` equal to the token subject) passes without it;
//! such requests carry a [`SelfAccess`] marker so handlers can refuse changes
//! that need the permission itself, like a user promoting their own role.
//!
//! The guard reads the [`Claims`] left by the JWT middleware, so it must be
//! installed with `route_layer` beneath it:
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/v1/product", get(list::<Product>))
//!     .route_layer(from_fn_with_state(
//!         RequirePermission::new("getProducts", policy),
//!         RequirePermission::middleware,
//!     ))
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::RawPathParamsRejection, RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};

use super::token::Claims;
use crate::config::AccessConfig;
use crate::error::Error;

/// Path parameter compared against the token subject
const ID_PARAM: &str = "id";

/// How a request got past the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The caller holds the route permission
    Granted,
    /// The caller lacks the permission but targets their own record
    SelfOnly,
}

/// Request extension set when access rests on self access alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfAccess;

/// Permissions granted by each role
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    roles: HashMap<String, HashSet<String>>,
}

impl RolePolicy {
    pub fn new(roles: HashMap<String, Vec<String>>) -> Self {
        Self {
            roles: roles
                .into_iter()
                .map(|(role, perms)| (role, perms.into_iter().collect()))
                .collect(),
        }
    }

    pub fn allows(&self, claims: &Claims, permission: &str) -> bool {
        claims.has_permission(permission)
            || claims
                .roles
                .iter()
                .filter_map(|role| self.roles.get(role))
                .any(|granted| granted.contains(permission))
    }
}

impl From<&AccessConfig> for RolePolicy {
    fn from(config: &AccessConfig) -> Self {
        Self::new(config.roles.clone())
    }
}

/// Guard state for one route
#[derive(Debug, Clone)]
pub struct RequirePermission {
    permission: &'static str,
    policy: Arc<RolePolicy>,
}

impl RequirePermission {
    pub fn new(permission: &'static str, policy: Arc<RolePolicy>) -> Self {
        Self { permission, policy }
    }

    /// Whether the claims may use the route; `path_id` enables self access
    pub fn check(&self, claims: &Claims, path_id: Option<&str>) -> Result<Access, Error> {
        if self.policy.allows(claims, self.permission) {
            return Ok(Access::Granted);
        }
        if path_id.is_some_and(|id| id == claims.subject_id()) {
            return Ok(Access::SelfOnly);
        }

        tracing::warn!(
            subject = %claims.sub,
            permission = self.permission,
            "Permission denied"
        );
        Err(Error::Forbidden("Forbidden".to_string()))
    }

    /// Middleware function for axum
    pub async fn middleware(
        State(guard): State<Self>,
        params: Result<RawPathParams, RawPathParamsRejection>,
        mut request: Request<Body>,
        next: Next,
    ) -> Result<Response, Error> {
        let claims = request
            .extensions()
            .get::<Claims>()
            .ok_or_else(|| Error::Unauthorized("Please authenticate".to_string()))?;

        let path_id = params.as_ref().ok().and_then(|params| {
            params
                .iter()
                .find(|(name, _)| *name == ID_PARAM)
                .map(|(_, value)| value)
        });

        if guard.check(claims, path_id)? == Access::SelfOnly {
            request.extensions_mut().insert(SelfAccess);
        }

        Ok(next.run(request).await)
    }
}
