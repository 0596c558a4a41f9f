//! Caller identity and the admin capability check in front of staff-only routes.

use axum::http::HeaderMap;
use serde::Serialize;

use super::cohort::MemberId;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLES_HEADER: &str = "x-actor-roles";
pub const ADMIN_ROLE: &str = "admin";

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: MemberId,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|held| held.eq_ignore_ascii_case(role))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("admin capability required")]
    AuthorizationDenied,
}

pub trait AccessGuard: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Actor, AccessError>;

    fn require_admin(&self, headers: &HeaderMap) -> Result<Actor, AccessError> {
        let actor = self.authenticate(headers)?;
        if actor.has_role(ADMIN_ROLE) {
            Ok(actor)
        } else {
            Err(AccessError::AuthorizationDenied)
        }
    }
}

/// Trusts identity headers stamped by the upstream identity proxy.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderAccessGuard;

impl AccessGuard for HeaderAccessGuard {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Actor, AccessError> {
        let id = headers
            .get(ACTOR_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AccessError::AuthenticationRequired)?;
        let roles = headers
            .get(ACTOR_ROLES_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|role| !role.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Actor {
            id: MemberId::new(id),
            roles,
        })
    }
}
