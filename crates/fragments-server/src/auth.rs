use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use fragments_types::OwnerId;

use crate::error::{ServerError, ServerResult};

/// An authenticated caller.
///
/// `owner` is derived from the principal name by hashing, so the stores only
/// ever see the opaque digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub principal: String,
    pub owner: OwnerId,
}

impl Identity {
    pub fn new(principal: impl Into<String>) -> Self {
        let principal = principal.into();
        let owner = OwnerId::from_principal(&principal);
        Self { principal, owner }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { user: String, password: String },
    Bearer(String),
    Anonymous,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { user, .. } => f.debug_struct("Basic").field("user", user).finish_non_exhaustive(),
            Self::Bearer(_) => f.write_str("Bearer(..)"),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

impl Credentials {
    /// Read credentials from the `Authorization` header.
    ///
    /// No header is `Anonymous`; a header that is present but malformed is
    /// an error.
    pub fn from_headers(headers: &HeaderMap) -> ServerResult<Self> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(Self::Anonymous);
        };
        let value = value
            .to_str()
            .map_err(|_| ServerError::Unauthorized("malformed authorization header".into()))?;
        let (scheme, rest) = value.split_once(' ').unwrap_or((value, ""));
        let rest = rest.trim();

        if scheme.eq_ignore_ascii_case("basic") {
            let decoded = STANDARD
                .decode(rest)
                .ok()
                .and_then(|raw| String::from_utf8(raw).ok())
                .ok_or_else(|| ServerError::Unauthorized("malformed basic credentials".into()))?;
            let (user, password) = decoded
                .split_once(':')
                .ok_or_else(|| ServerError::Unauthorized("malformed basic credentials".into()))?;
            Ok(Self::Basic {
                user: user.to_string(),
                password: password.to_string(),
            })
        } else if scheme.eq_ignore_ascii_case("bearer") && !rest.is_empty() {
            Ok(Self::Bearer(rest.to_string()))
        } else {
            Err(ServerError::Unauthorized(format!("unsupported authorization scheme: {scheme}")))
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
}

/// Accepts any presented principal without checking a secret.
///
/// Anonymous requests are still refused: every fragment needs an owner.
pub struct AllowAllAuth;

#[async_trait]
impl AuthProvider for AllowAllAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Basic { user, .. } if !user.is_empty() => Ok(Identity::new(user.as_str())),
            Credentials::Bearer(token) => Ok(Identity::new(format!("bearer:{token}"))),
            _ => Err(ServerError::Unauthorized("credentials required".into())),
        }
    }
}

/// HTTP Basic against a fixed user table.
pub struct BasicUsersAuth {
    users: BTreeMap<String, String>,
}

impl BasicUsersAuth {
    pub fn new(users: BTreeMap<String, String>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl AuthProvider for BasicUsersAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        let Credentials::Basic { user, password } = credentials else {
            return Err(ServerError::Unauthorized("basic credentials required".into()));
        };
        match self.users.get(user) {
            Some(expected) if expected == password => Ok(Identity::new(user.as_str())),
            _ => {
                tracing::debug!(user = %user, "rejected basic credentials");
                Err(ServerError::Unauthorized("invalid username or password".into()))
            }
        }
    }
}
