//! Session gate.
//!
//! Nothing past the gate runs without a validated credential. Validation is a
//! `GET /me` with the candidate key; any failure, including a network error,
//! removes the persisted key so a bad key is never retried on next start.

use autoshorts_models::UserProfile;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::credential::{Credential, CredentialStore};
use crate::error::{ClientError, ClientResult};

/// Shown when validation fails without a server-provided detail.
pub const INVALID_KEY_MESSAGE: &str = "Invalid API Key";

/// Shown when the entered key is blank.
pub const EMPTY_KEY_MESSAGE: &str = "Please enter your API key";

/// Result of checking a credential against the backend.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub user: Option<UserProfile>,
    pub error: Option<String>,
}

/// An authenticated session: the account profile and a client carrying the
/// validated credential.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserProfile,
    client: ApiClient,
}

impl Session {
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

pub struct AuthGate<S: CredentialStore> {
    client: ApiClient,
    store: S,
    session: Option<Session>,
    last_error: Option<String>,
}

impl<S: CredentialStore> AuthGate<S> {
    /// `client` is used as a template; its own credential is ignored.
    pub fn new(client: ApiClient, store: S) -> Self {
        Self {
            client: client.with_credential(None),
            store,
            session: None,
            last_error: None,
        }
    }

    /// Check `credential` with `GET /me`.
    pub async fn validate(&self, credential: &Credential) -> ValidationOutcome {
        match self
            .client
            .with_credential(Some(credential.clone()))
            .me()
            .await
        {
            Ok(user) => ValidationOutcome {
                valid: true,
                user: Some(user),
                error: None,
            },
            Err(e) => {
                debug!("Credential validation failed: {}", e);
                ValidationOutcome {
                    valid: false,
                    user: None,
                    error: Some(e.user_message(INVALID_KEY_MESSAGE)),
                }
            }
        }
    }

    /// Validate a persisted credential, if any, without reporting failures.
    ///
    /// Returns whether a session was established.
    pub async fn restore(&mut self) -> ClientResult<bool> {
        let Some(credential) = self.store.load()? else {
            return Ok(false);
        };

        let outcome = self.validate(&credential).await;
        match (outcome.valid, outcome.user) {
            (true, Some(user)) => {
                info!(email = %user.email_label(), "Restored session");
                self.establish(credential, user);
                Ok(true)
            }
            _ => {
                warn!("Stored credential was rejected, removing it");
                self.store.clear()?;
                self.session = None;
                Ok(false)
            }
        }
    }

    /// Persist and validate a freshly entered key.
    ///
    /// A blank key fails without any request. A rejected key is removed from
    /// the store again.
    pub async fn login(&mut self, raw: &str) -> ClientResult<&Session> {
        let Some(credential) = Credential::new(raw) else {
            self.last_error = Some(EMPTY_KEY_MESSAGE.to_string());
            return Err(ClientError::input(EMPTY_KEY_MESSAGE));
        };

        self.last_error = None;
        self.store.save(&credential)?;

        let outcome = self.validate(&credential).await;
        match (outcome.valid, outcome.user) {
            (true, Some(user)) => {
                info!(email = %user.email_label(), tier = %user.tier_label(), "Logged in");
                Ok(self.establish(credential, user))
            }
            _ => {
                self.store.clear()?;
                self.session = None;
                let message = outcome
                    .error
                    .unwrap_or_else(|| INVALID_KEY_MESSAGE.to_string());
                self.last_error = Some(message.clone());
                Err(ClientError::Unauthorized(message))
            }
        }
    }

    /// Forget the credential and all account state.
    pub fn logout(&mut self) -> ClientResult<()> {
        self.store.clear()?;
        self.session = None;
        self.last_error = None;
        info!("Logged out");
        Ok(())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Authenticated client, once a session exists.
    pub fn client(&self) -> Option<&ApiClient> {
        self.session.as_ref().map(Session::client)
    }

    /// Error from the last login attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn establish(&mut self, credential: Credential, user: UserProfile) -> &Session {
        self.session.insert(Session {
            user,
            client: self.client.with_credential(Some(credential)),
        })
    }
}
