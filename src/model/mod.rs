use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    backend::{Backend, Query},
    web::AuthenticatedUser,
};

mod access;
pub use access::require_role;

pub mod entity;

mod error;
pub use error::{ModelError, ModelResult};

mod repo;
pub use repo::{CrudRepository, ResourceType, ResourceTyped};

#[derive(Debug, Clone)]
pub struct ModelManager {
    backend: Arc<dyn Backend>, // shared client, cloning only bumps the refcount
}

impl ModelManager {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Runs `query` as `actor` and decodes every row.
    pub async fn fetch<T>(&self, actor: &AuthenticatedUser, query: &Query) -> ModelResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let rows = self.backend.select(actor.access_token(), query).await?;
        let items = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(items)
    }

    pub async fn fetch_optional<T>(
        &self,
        actor: &AuthenticatedUser,
        query: &Query,
    ) -> ModelResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        Ok(self.fetch(actor, query).await?.into_iter().next())
    }
}
