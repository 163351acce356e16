//! Client side of the hosted backend: authentication, row storage for the
//! `profiles`, `modules` and `lessons` collections, and object storage for
//! lesson materials.
//!
//! Everything the application persists goes through [`Backend`]. The service
//! talks to [`RestBackend`] in production and the test suite swaps in
//! [`MemoryBackend`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

mod error;
pub use error::{BackendError, BackendResult};

mod query;
pub use query::{Collection, Filter, Order, Query};

pub mod memory;
pub use memory::MemoryBackend;

pub mod rest;
pub use rest::RestBackend;

/// The user record of the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful sign in.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

/// Every call takes the caller's access token so the backend can apply its own
/// row-level rules. An empty token means an anonymous caller.
#[async_trait::async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session>;

    /// `None` when the token is unknown or expired.
    async fn get_user(&self, token: &str) -> BackendResult<Option<AuthUser>>;

    async fn sign_out(&self, token: &str) -> BackendResult<()>;

    async fn select(&self, token: &str, query: &Query) -> BackendResult<Vec<Value>>;

    async fn count(&self, token: &str, collection: Collection) -> BackendResult<i64>;

    /// Returns the stored row, including generated columns.
    async fn insert(&self, token: &str, collection: Collection, row: Value) -> BackendResult<Value>;

    /// Applies `patch` to every row matched by the query filters.
    async fn update(&self, token: &str, query: &Query, patch: Value) -> BackendResult<()>;

    /// Deletes every row matched by the query filters.
    async fn delete(&self, token: &str, query: &Query) -> BackendResult<()>;

    async fn upload(
        &self,
        token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> BackendResult<()>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}
