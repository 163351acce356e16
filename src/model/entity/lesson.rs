use crate::backend::{Collection, Query};
use crate::model::repo::{ResourceType, ResourceTyped};
use crate::model::{ModelManager, error::ModelResult, repo::CrudRepository};
use crate::player::Navigable;
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Lesson {
    id: Uuid,
    module_id: Uuid,
    title: String,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    pdf_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Lesson {
    fn get_resource_type() -> ResourceType {
        ResourceType::Lesson
    }

    fn collection() -> Collection {
        Collection::Lessons
    }
}

impl Navigable for Lesson {
    fn nav_id(&self) -> Uuid {
        self.id
    }
}

impl Lesson {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn module_id(&self) -> Uuid {
        self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn video_url(&self) -> &str {
        self.video_url.as_deref().unwrap_or_default()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn pdf_url(&self) -> Option<&str> {
        self.pdf_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonCreate {
    pub module_id: Uuid,
    pub title: String,
    pub video_url: String,
    pub description: Option<String>,
    pub pdf_url: Option<String>,
}

#[async_trait]
impl CrudRepository<Lesson, LessonCreate, Uuid> for Lesson {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: LessonCreate,
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
        data: LessonCreate,
    ) -> ModelResult<Self> {
        let query = Query::from(Self::collection()).eq("id", self.id);
        mm.backend()
            .update(actor.access_token(), &query, serde_json::to_value(&data)?)
            .await?;

        self.module_id = data.module_id;
        self.title = data.title;
        self.video_url = Some(data.video_url);
        self.description = data.description;
        self.pdf_url = data.pdf_url;
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

    /// Newest first, the order of the admin listing.
    async fn list(mm: &ModelManager, actor: &AuthenticatedUser) -> ModelResult<Vec<Self>> {
        let query = Query::from(Self::collection()).order("created_at", false);
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

impl Lesson {
    /// Lessons of one module in the order they were added.
    pub async fn all_by_module(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        module_id: Uuid,
    ) -> ModelResult<Vec<Self>> {
        let query = Query::from(Self::collection())
            .eq("module_id", module_id)
            .order("created_at", true);
        mm.fetch(actor, &query).await
    }
}
