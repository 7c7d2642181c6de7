//! Admin and customer sessions backed by a persistence medium.
//!
//! Both sessions are "token present means logged in": there is no local
//! token validation, the backend rejects stale tokens and the caller then
//! drops them. [`AdminSession`] belongs in the session-scoped medium,
//! [`UserSession`] in the local one.

use tracing::{debug, warn};

use flora_core::{CoreError, User};
use flora_storage::KeyValueStore;

use crate::error::ShopError;

pub const ADMIN_TOKEN_KEY: &str = "adminToken";
pub const ADMIN_LOGIN_FLAG_KEY: &str = "adminLoginSuccess";
pub const USER_KEY: &str = "user";
pub const USER_TOKEN_KEY: &str = "token";

/// Where an unauthenticated admin is sent.
pub const ADMIN_LOGIN_ROUTE: &str = "/admin-login";
/// Where an unauthenticated customer is sent.
pub const USER_LOGIN_ROUTE: &str = "/login";

/// Outcome of a route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(&'static str),
}

fn non_empty(token: String) -> Result<String, ShopError> {
    if token.trim().is_empty() {
        return Err(CoreError::MissingField { field: "token" }.into());
    }
    Ok(token)
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// Back-office session: a bearer token in the session-scoped medium.
pub struct AdminSession<S: KeyValueStore> {
    medium: S,
    token: Option<String>,
}

impl<S: KeyValueStore> AdminSession<S> {
    /// Restores the session. A read failure counts as logged out.
    pub fn open(medium: S) -> Self {
        let token = match medium.get(ADMIN_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "admin session check failed; treating as logged out");
                None
            }
        };
        AdminSession { medium, token }
    }

    /// Stores the token issued by the login endpoint.
    ///
    /// The token is written last: the session only becomes authenticated
    /// once it is stored, and a failed first login leaves no flag behind.
    pub fn login(&mut self, token: impl Into<String>) -> Result<(), ShopError> {
        let token = non_empty(token.into())?;
        self.medium.set(ADMIN_LOGIN_FLAG_KEY, "true")?;
        if let Err(e) = self.medium.set(ADMIN_TOKEN_KEY, &token) {
            if self.token.is_none() {
                if let Err(cleanup) = self.medium.remove(ADMIN_LOGIN_FLAG_KEY) {
                    warn!(error = %cleanup, "could not roll back admin login flag");
                }
            }
            return Err(e.into());
        }
        self.token = Some(token);
        debug!("admin logged in");
        Ok(())
    }

    /// Forgets the token. The in-memory session is logged out even if the
    /// medium could not be updated; that error is still returned.
    pub fn logout(&mut self) -> Result<(), ShopError> {
        self.token = None;
        self.medium.remove(ADMIN_TOKEN_KEY)?;
        self.medium.remove(ADMIN_LOGIN_FLAG_KEY)?;
        debug!("admin logged out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Gate for back-office routes.
    pub fn guard(&self) -> Access {
        if self.is_authenticated() {
            Access::Granted
        } else {
            Access::Redirect(ADMIN_LOGIN_ROUTE)
        }
    }

    pub fn into_medium(self) -> S {
        self.medium
    }
}

// ---------------------------------------------------------------------------
// Customer
// ---------------------------------------------------------------------------

/// Storefront customer session: the user record and its token.
pub struct UserSession<S: KeyValueStore> {
    medium: S,
    current: Option<(User, String)>,
}

impl<S: KeyValueStore> UserSession<S> {
    /// Restores the session when both the user record and the token are
    /// stored and readable.
    pub fn open(medium: S) -> Self {
        let current = match (
            medium.load_json::<User>(USER_KEY),
            medium.get(USER_TOKEN_KEY),
        ) {
            (Ok(Some(user)), Ok(Some(token))) if !token.is_empty() => Some((user, token)),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "user session unreadable; treating as logged out");
                None
            }
            _ => None,
        };
        UserSession { medium, current }
    }

    /// Stores the user record, then the token. If the token cannot be
    /// stored the previous user record is put back.
    pub fn login(&mut self, user: User, token: impl Into<String>) -> Result<(), ShopError> {
        let token = non_empty(token.into())?;
        let previous = self.medium.get(USER_KEY)?;
        self.medium.save_json(USER_KEY, &user)?;
        if let Err(e) = self.medium.set(USER_TOKEN_KEY, &token) {
            let restored = match previous {
                Some(raw) => self.medium.set(USER_KEY, &raw),
                None => self.medium.remove(USER_KEY),
            };
            if let Err(cleanup) = restored {
                warn!(error = %cleanup, "could not roll back user record");
            }
            return Err(e.into());
        }
        debug!(user = %user.id, "user logged in");
        self.current = Some((user, token));
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), ShopError> {
        self.current = None;
        self.medium.remove(USER_KEY)?;
        self.medium.remove(USER_TOKEN_KEY)?;
        debug!("user logged out");
        Ok(())
    }

    /// Drops the token after the backend rejected it (401/403). The user
    /// record stays so the login form can be prefilled.
    pub fn invalidate(&mut self) -> Result<(), ShopError> {
        self.current = None;
        self.medium.remove(USER_TOKEN_KEY)?;
        debug!("user token invalidated");
        Ok(())
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|(user, _)| user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|(_, token)| token.as_str())
    }

    /// `Authorization` header value for backend calls.
    pub fn bearer(&self) -> Option<String> {
        self.token().map(|token| format!("Bearer {}", token))
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    /// Gate for customer-only routes (favorites).
    pub fn guard(&self) -> Access {
        if self.is_logged_in() {
            Access::Granted
        } else {
            Access::Redirect(USER_LOGIN_ROUTE)
        }
    }

    pub fn into_medium(self) -> S {
        self.medium
    }
}
