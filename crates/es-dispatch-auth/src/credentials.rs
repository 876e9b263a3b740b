//! Credentials and the providers that resolve them.
//!
//! Signing needs an access key ID, a secret access key and, for temporary
//! credentials, a session token. [`CredentialProvider`] resolves them at
//! signing time; [`EnvironmentCredentialProvider`] reads the usual
//! `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`
//! variables and [`StaticCredentialProvider`] holds a fixed set.
//!
//! Verification runs the other way round and only needs the secret for a
//! given access key ID, see [`SecretKeyLookup`].

use std::fmt;

use crate::error::AuthError;

/// Access key material used to sign a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create long-term credentials (no session token).
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token, as issued with temporary credentials.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// The access key ID.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The secret access key.
    #[must_use]
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// The session token, if any.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Resolves the credentials used to sign the next request.
///
/// Called once per request, so implementations backed by rotating
/// credentials always hand out the current set.
pub trait CredentialProvider: Send + Sync {
    /// Resolve the credentials to sign with.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if no credentials are available.
    fn provide_credentials(&self) -> Result<Credentials, AuthError>;
}

/// Looks up secret access keys by access key ID on the verifying side.
pub trait SecretKeyLookup: Send + Sync {
    /// Retrieve the secret access key for the given access key ID.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccessKeyNotFound`] if the access key ID is not recognized.
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError>;
}

/// A provider that always returns the same credentials.
///
/// # Examples
///
/// ```
/// use es_dispatch_auth::credentials::{CredentialProvider, Credentials, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new(Credentials::new("AKID", "secret"));
/// let creds = provider.provide_credentials().unwrap();
/// assert_eq!(creds.access_key_id(), "AKID");
/// ```
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    /// Create a provider for a fixed set of credentials.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn provide_credentials(&self) -> Result<Credentials, AuthError> {
        Ok(self.credentials.clone())
    }
}

impl SecretKeyLookup for StaticCredentialProvider {
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError> {
        if self.credentials.access_key_id == access_key_id {
            Ok(self.credentials.secret_access_key.clone())
        } else {
            Err(AuthError::AccessKeyNotFound(access_key_id.to_owned()))
        }
    }
}

/// Reads credentials from `<PREFIX>_ACCESS_KEY_ID`, `<PREFIX>_SECRET_ACCESS_KEY`
/// and the optional `<PREFIX>_SESSION_TOKEN` environment variables.
///
/// Variables are read on every call, never cached.
#[derive(Debug, Clone)]
pub struct EnvironmentCredentialProvider {
    prefix: String,
}

impl Default for EnvironmentCredentialProvider {
    fn default() -> Self {
        Self::with_prefix("AWS")
    }
}

impl EnvironmentCredentialProvider {
    /// Create a provider reading variables under the given prefix (`AWS` by default).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn resolve_with<F>(&self, lookup: F) -> Result<Credentials, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| format!("{}_{suffix}", self.prefix);
        let required = |name: String| {
            lookup(&name)
                .filter(|v| !v.is_empty())
                .ok_or(AuthError::MissingCredentials(name))
        };

        let access_key_id = required(var("ACCESS_KEY_ID"))?;
        let secret_access_key = required(var("SECRET_ACCESS_KEY"))?;
        let credentials = Credentials::new(access_key_id, secret_access_key);

        Ok(match lookup(&var("SESSION_TOKEN")).filter(|v| !v.is_empty()) {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }
}

impl CredentialProvider for EnvironmentCredentialProvider {
    fn provide_credentials(&self) -> Result<Credentials, AuthError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }
}
