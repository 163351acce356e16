use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::{Lesson, Module, Profile};

#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct Stats {
    pub students: i64,
    pub lessons: i64,
    pub modules: i64,
}

/// Lesson as listed in the admin panel, with its module title resolved.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AdminLessonRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub module_title: Option<String>,
    pub title: String,
    pub video_url: String,
    pub description: Option<String>,
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AdminLessonRow {
    pub fn join(lessons: &[Lesson], modules: &[Module]) -> Vec<Self> {
        let titles: HashMap<Uuid, &str> = modules.iter().map(|m| (m.id(), m.title())).collect();

        lessons
            .iter()
            .map(|lesson| Self {
                id: lesson.id(),
                module_id: lesson.module_id(),
                module_title: titles.get(&lesson.module_id()).map(|t| t.to_string()),
                title: lesson.title().to_string(),
                video_url: lesson.video_url().to_string(),
                description: lesson.description().map(str::to_string),
                pdf_url: lesson.pdf_url().map(str::to_string),
                created_at: lesson.created_at(),
            })
            .collect()
    }
}

/// The whole admin dataset, fetched again after every mutation.
#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct AdminDashboard {
    pub stats: Stats,
    pub modules: Vec<Module>,
    pub lessons: Vec<AdminLessonRow>,
    pub profiles: Vec<Profile>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MutationResponse {
    pub message: String,
    pub dashboard: AdminDashboard,
}

/// Multipart body of the lesson form, documentation only.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct LessonForm {
    module_id: Uuid,
    title: String,
    video_url: String,
    description: Option<String>,
    /// Lesson material, at most 100MB
    #[schema(value_type = Option<String>, format = Binary)]
    pdf: Option<Vec<u8>>,
}
