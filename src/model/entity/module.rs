use crate::backend::{Collection, Query};
use crate::model::repo::{ResourceType, ResourceTyped};
use crate::model::{ModelManager, error::ModelResult, repo::CrudRepository};
use crate::player::Navigable;
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Module {
    id: Uuid,
    title: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    is_locked: bool,
    #[serde(default)]
    order_index: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ModuleCreate {
    pub title: String,
    pub image_url: Option<String>,
    pub is_locked: bool,
    pub order_index: i32,
}

impl ResourceTyped for Module {
    fn get_resource_type() -> ResourceType {
        ResourceType::Module
    }

    fn collection() -> Collection {
        Collection::Modules
    }
}

impl Navigable for Module {
    fn nav_id(&self) -> Uuid {
        self.id
    }
}

impl Module {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }

    /// Card badge, `Module 03`.
    pub fn label(&self) -> String {
        format!("Module {:02}", self.order_index)
    }

    pub async fn set_locked(
        mut self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        is_locked: bool,
    ) -> ModelResult<Self> {
        let query = Query::from(Self::collection()).eq("id", self.id);
        mm.backend()
            .update(actor.access_token(), &query, json!({ "is_locked": is_locked }))
            .await?;

        self.is_locked = is_locked;
        Ok(self)
    }

    pub async fn find_by_title(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        title: &str,
    ) -> ModelResult<Option<Self>> {
        let query = Query::from(Self::collection()).eq("title", title);
        mm.fetch_optional(actor, &query).await
    }
}

#[async_trait]
impl CrudRepository<Module, ModuleCreate, Uuid> for Module {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> ModelResult<Self> {
        let row = mm
            .backend()
            .insert(actor.access_token(), Self::collection(), serde_json::to_value(&data)?)
            .await?;

        Ok(serde_json::from_value(row)?)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> ModelResult<Self> {
        let query = Query::from(Self::collection()).eq("id", self.id);
        mm.backend()
            .update(actor.access_token(), &query, serde_json::to_value(&data)?)
            .await?;

        self.title = data.title;
        self.image_url = data.image_url;
        self.is_locked = data.is_locked;
        self.order_index = data.order_index;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, actor: &AuthenticatedUser) -> ModelResult<()> {
        let query = Query::from(Self::collection()).eq("id", self.id);
        mm.backend().delete(actor.access_token(), &query).await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        id: Uuid,
    ) -> ModelResult<Option<Self>> {
        let query = Query::from(Self::collection()).eq("id", id);
        mm.fetch_optional(actor, &query).await
    }

    async fn list(mm: &ModelManager, actor: &AuthenticatedUser) -> ModelResult<Vec<Self>> {
        let query = Query::from(Self::collection()).order("order_index", true);
        mm.fetch(actor, &query).await
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> ModelResult<i64> {
        let count = mm
            .backend()
            .count(actor.access_token(), Self::collection())
            .await?;
        Ok(count)
    }
}
