//! Credentials for the hosted services
//!
//! Supports both static and dynamic authentication:
//! - Static: key or token set once at creation
//! - Dynamic: callback that provides fresh credentials before each request
//!
//! The same source type backs the chat-completions provider (sent as an
//! `api-key` header) and the agent-service client (sent as a bearer token).
//!
//! # Example: rotating agent-service token
//!
//! ```ignore
//! use triage_desk::llm::{auth_provider, AuthConfig};
//! use triage_desk::threads::AgentServiceClient;
//!
//! let client = AgentServiceClient::with_auth_provider(connection, auth_provider(|| async {
//!     let token = fetch_token().await?;
//!     Ok(AuthConfig::new(token))
//! }));
//! ```

use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Authentication configuration for API requests
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// API key or bearer token
    pub api_key: String,
    /// Optional base URL overriding the configured endpoint
    pub base_url: Option<String>,
}

impl AuthConfig {
    /// Create a new auth config with just a key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    /// Create a new auth config with key and custom base URL
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Some(base_url.into()),
        }
    }
}

/// Type alias for the boxed future returned by auth providers
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<AuthConfig>> + Send + 'a>>;

/// Trait for providing credentials dynamically
///
/// Called before each request. Implementations handle caching and refresh.
pub trait AuthProvider: Send + Sync {
    /// Get authentication configuration
    fn get_auth(&self) -> AuthFuture<'_>;
}

/// Wrapper to implement AuthProvider for async closures
pub struct FnAuthProvider<F> {
    func: F,
}

impl<F, Fut> AuthProvider for FnAuthProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<AuthConfig>> + Send + 'static,
{
    fn get_auth(&self) -> AuthFuture<'_> {
        Box::pin((self.func)())
    }
}

/// Create an auth provider from an async closure
pub fn auth_provider<F, Fut>(func: F) -> FnAuthProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<AuthConfig>> + Send + 'static,
{
    FnAuthProvider { func }
}

/// Internal auth source - either static or dynamic
pub(crate) enum AuthSource {
    /// Static credentials set at creation time
    Static(AuthConfig),
    /// Dynamic credentials from a provider
    Dynamic(Arc<dyn AuthProvider>),
}

impl Clone for AuthSource {
    fn clone(&self) -> Self {
        match self {
            AuthSource::Static(config) => AuthSource::Static(config.clone()),
            AuthSource::Dynamic(provider) => AuthSource::Dynamic(Arc::clone(provider)),
        }
    }
}

impl AuthSource {
    /// Get auth config (either returns static or calls provider)
    pub(crate) async fn get_auth(&self) -> Result<AuthConfig> {
        match self {
            AuthSource::Static(config) => Ok(config.clone()),
            AuthSource::Dynamic(provider) => provider.get_auth().await,
        }
    }
}
