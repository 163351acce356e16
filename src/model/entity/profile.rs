use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::backend::{Collection, Query};
use crate::model::repo::{ResourceType, ResourceTyped};
use crate::model::{ModelManager, error::ModelResult};
use crate::web::AuthenticatedUser;

pub static DEFAULT_DISPLAY_NAME: &str = "Student";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(other)]
    Student,
}

impl Role {
    pub fn toggled(self) -> Self {
        match self {
            Self::Admin => Self::Student,
            Self::Student => Self::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }

    /// Page a freshly signed in user lands on.
    pub fn landing_page(&self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Student => "/modules",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Profile row kept by the backend next to each auth user.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Profile {
    id: Uuid,
    #[serde(default)]
    full_name: Option<String>,
    /// A missing or NULL role reads as [`Role::Student`].
    #[serde(default, serialize_with = "serialize_role")]
    #[schema(value_type = Role)]
    role: Option<Role>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

fn serialize_role<S: serde::Serializer>(role: &Option<Role>, serializer: S) -> Result<S::Ok, S::Error> {
    role.unwrap_or_default().serialize(serializer)
}

impl ResourceTyped for Profile {
    fn get_resource_type() -> ResourceType {
        ResourceType::Profile
    }

    fn collection() -> Collection {
        Collection::Profiles
    }
}

impl Profile {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role.unwrap_or_default()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        id: Uuid,
    ) -> ModelResult<Option<Self>> {
        let query = Query::from(Self::collection()).eq("id", id);
        mm.fetch_optional(actor, &query).await
    }

    /// Newest profiles first.
    pub async fn list(mm: &ModelManager, actor: &AuthenticatedUser) -> ModelResult<Vec<Self>> {
        let query = Query::from(Self::collection()).order("created_at", false);
        mm.fetch(actor, &query).await
    }

    pub async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> ModelResult<i64> {
        let count = mm
            .backend()
            .count(actor.access_token(), Self::collection())
            .await?;
        Ok(count)
    }

    pub async fn set_role(
        mut self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        role: Role,
    ) -> ModelResult<Self> {
        let query = Query::from(Self::collection()).eq("id", self.id);
        mm.backend()
            .update(actor.access_token(), &query, json!({ "role": role }))
            .await?;

        self.role = Some(role);
        Ok(self)
    }
}

/// Full name when the profile has one, else the local part of the email.
pub fn display_name(full_name: Option<&str>, email: Option<&str>) -> String {
    if let Some(name) = full_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    email
        .and_then(|email| email.split('@').next())
        .filter(|local| !local.is_empty())
        .unwrap_or(DEFAULT_DISPLAY_NAME)
        .to_string()
}
