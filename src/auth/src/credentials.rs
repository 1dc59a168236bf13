// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Result;
use crate::errors::CredentialsError;
use std::sync::Arc;

/// The environment variable holding the access key id.
pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
/// The environment variable holding the secret access key.
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
/// The environment variable holding the (optional) session token.
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// The identity used to sign requests.
///
/// The `Debug` implementation never prints the secret key nor the session
/// token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Creates long-term credentials.
    pub fn new<K: Into<String>, S: Into<String>>(access_key_id: K, secret_access_key: S) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attaches a session token, turning these into temporary credentials.
    pub fn with_session_token<T: Into<String>>(mut self, v: T) -> Self {
        self.session_token = Some(v.into());
        self
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[censored]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[censored]"),
            )
            .finish()
    }
}

/// Resolves the credentials used to sign each request attempt.
///
/// The pipeline calls [credentials][CredentialsProvider::credentials] once per
/// attempt. Implementations that fetch credentials from a remote source should
/// cache them.
#[async_trait::async_trait]
pub trait CredentialsProvider: Send + Sync + std::fmt::Debug {
    async fn credentials(&self) -> Result<Credentials>;
}

/// A shared credentials provider.
pub type SharedCredentialsProvider = Arc<dyn CredentialsProvider>;

/// Always returns the same credentials.
#[derive(Clone, Debug)]
pub struct StaticCredentialsProvider {
    credentials: Credentials,
}

impl StaticCredentialsProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait::async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn credentials(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }
}

/// Loads the credentials from the environment on each call.
///
/// Both [ACCESS_KEY_ID_ENV] and [SECRET_ACCESS_KEY_ENV] must be set and not
/// empty. [SESSION_TOKEN_ENV] is optional.
#[derive(Clone, Debug, Default)]
pub struct EnvironmentCredentialsProvider;

impl EnvironmentCredentialsProvider {
    pub fn new() -> Self {
        Self
    }

    fn load() -> Result<Credentials> {
        let access_key_id = required_var(ACCESS_KEY_ID_ENV)?;
        let secret_access_key = required_var(SECRET_ACCESS_KEY_ENV)?;
        let credentials = Credentials::new(access_key_id, secret_access_key);
        Ok(match std::env::var(SESSION_TOKEN_ENV) {
            Ok(token) if !token.is_empty() => credentials.with_session_token(token),
            _ => credentials,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        Ok(_) => Err(CredentialsError::from_msg(
            false,
            format!("the {name} environment variable is empty"),
        )),
        Err(e) => Err(CredentialsError::new(false, e)),
    }
}

#[async_trait::async_trait]
impl CredentialsProvider for EnvironmentCredentialsProvider {
    async fn credentials(&self) -> Result<Credentials> {
        Self::load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoped_env::ScopedEnv;
    use serial_test::serial;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn debug_hides_secrets() {
        let credentials = Credentials::new("AKID", "super-secret").with_session_token("tok3n");
        let got = format!("{credentials:?}");
        assert!(got.contains("AKID"), "{got}");
        assert!(!got.contains("super-secret"), "{got}");
        assert!(!got.contains("tok3n"), "{got}");
    }

    #[tokio::test]
    async fn static_provider() -> TestResult {
        let provider = StaticCredentialsProvider::new(Credentials::new("AKID", "secret"));
        let got = provider.credentials().await?;
        assert_eq!(got.access_key_id(), "AKID");
        assert_eq!(got.secret_access_key(), "secret");
        assert_eq!(got.session_token(), None);
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn environment_provider() -> TestResult {
        let _a = ScopedEnv::set(ACCESS_KEY_ID_ENV, "env-akid");
        let _s = ScopedEnv::set(SECRET_ACCESS_KEY_ENV, "env-secret");
        let _t = ScopedEnv::set(SESSION_TOKEN_ENV, "env-token");
        let got = EnvironmentCredentialsProvider::new().credentials().await?;
        assert_eq!(got.access_key_id(), "env-akid");
        assert_eq!(got.secret_access_key(), "env-secret");
        assert_eq!(got.session_token(), Some("env-token"));
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn environment_provider_missing() {
        let _a = ScopedEnv::remove(ACCESS_KEY_ID_ENV);
        let _s = ScopedEnv::set(SECRET_ACCESS_KEY_ENV, "env-secret");
        let err = EnvironmentCredentialsProvider::new()
            .credentials()
            .await
            .unwrap_err();
        assert!(!err.is_retryable(), "{err:?}");
    }

    #[tokio::test]
    #[serial]
    async fn environment_provider_empty() {
        let _a = ScopedEnv::set(ACCESS_KEY_ID_ENV, "");
        let _s = ScopedEnv::set(SECRET_ACCESS_KEY_ENV, "env-secret");
        let err = EnvironmentCredentialsProvider::new()
            .credentials()
            .await
            .unwrap_err();
        assert!(format!("{err}").contains(ACCESS_KEY_ID_ENV), "{err}");
    }
}
