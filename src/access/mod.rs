//! Ownership-scoped access control.
//!
//! Every protected request goes through two steps: the bearer token is
//! resolved to a [`Principal`], then the principal is checked against the
//! route's [`AccessTarget`]. Nothing is cached; each request reads the
//! identity provider and the store afresh.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::{Store, StoreError};
use crate::identity::{IdentityError, IdentityProvider};

/// Authenticated caller of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Establishment,
    Jammer,
}

impl Resource {
    pub fn label(self) -> &'static str {
        match self {
            Resource::Establishment => "Estabelecimento",
            Resource::Jammer => "Jammer",
        }
    }
}

/// What a route addresses, which selects the check mode
#[derive(Debug, Clone, Copy)]
pub enum AccessTarget<'a> {
    /// `/user/{id}/...` as it appeared in the path
    SelfPath(&'a str),
    /// A single establishment, owned directly
    Establishment(i64),
    /// A single jammer, owned through its establishment
    Jammer(i64),
    /// `/admin/...`
    Admin,
}

/// Why a request was allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    SelfPath,
    Owner,
    AdminOverride,
    Admin,
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("bearer token rejected")]
    InvalidToken,

    #[error("principal does not own the target")]
    Forbidden,

    #[error("principal is not an administrator")]
    AdminRequired,

    #[error("{} not found", .0.label())]
    NotFound(Resource),

    #[error(transparent)]
    Identity(IdentityError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct AccessGate {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn Store>,
}

impl AccessGate {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn Store>) -> Self {
        Self { identity, store }
    }

    /// Resolve a bearer token to the request's principal.
    /// An absent or blank token never reaches the identity provider.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Principal, AccessError> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AccessError::MissingToken),
        };

        match self.identity.resolve(token).await {
            Ok(identity) => Ok(Principal {
                id: identity.id,
                email: identity.email,
            }),
            Err(IdentityError::Transport(msg)) => Err(AccessError::Identity(IdentityError::Transport(msg))),
            Err(e) => {
                debug!("Token rejected by identity provider: {}", e);
                Err(AccessError::InvalidToken)
            }
        }
    }

    /// Decide whether `principal` may act on `target`.
    ///
    /// Resource lookups happen before the ownership comparison, so an
    /// absent resource is reported as not found rather than forbidden.
    pub async fn authorize(&self, principal: &Principal, target: AccessTarget<'_>) -> Result<Grant, AccessError> {
        let grant = match target {
            AccessTarget::SelfPath(path_id) => {
                if Uuid::parse_str(path_id).ok() != Some(principal.id) {
                    warn!("User {} denied access to /user/{}", principal.id, path_id);
                    return Err(AccessError::Forbidden);
                }
                Grant::SelfPath
            }
            AccessTarget::Establishment(id) => {
                let establishment = self
                    .store
                    .find_establishment(id)
                    .await?
                    .ok_or(AccessError::NotFound(Resource::Establishment))?;
                self.owner_or_admin(principal, Some(establishment.user_id), Resource::Establishment, id)
                    .await?
            }
            AccessTarget::Jammer(id) => {
                let ownership = self
                    .store
                    .find_jammer_ownership(id)
                    .await?
                    .ok_or(AccessError::NotFound(Resource::Jammer))?;
                self.owner_or_admin(principal, ownership.owner, Resource::Jammer, id)
                    .await?
            }
            AccessTarget::Admin => {
                if !self.is_admin(principal).await? {
                    warn!("User {} denied access to admin route", principal.id);
                    return Err(AccessError::AdminRequired);
                }
                Grant::Admin
            }
        };

        debug!("User {} granted {:?} on {:?}", principal.id, grant, target);
        Ok(grant)
    }

    async fn owner_or_admin(
        &self,
        principal: &Principal,
        owner: Option<Uuid>,
        resource: Resource,
        id: i64,
    ) -> Result<Grant, AccessError> {
        if owner == Some(principal.id) {
            return Ok(Grant::Owner);
        }
        if self.is_admin(principal).await? {
            return Ok(Grant::AdminOverride);
        }
        warn!("User {} denied access to {} {}", principal.id, resource.label(), id);
        Err(AccessError::Forbidden)
    }

    /// A principal without a `users` row is never an administrator
    async fn is_admin(&self, principal: &Principal) -> Result<bool, AccessError> {
        let user = self.store.find_user(principal.id).await?;
        Ok(user.map(|u| u.is_admin).unwrap_or(false))
    }
}
