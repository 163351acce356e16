use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    model::entity::Lesson,
    player::{Embed, LessonQuery, Selection, embed},
    web::dto::modules::ModuleLink,
};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonLink {
    pub id: Uuid,
    pub title: String,
    pub active: bool,
    pub href: String,
}

impl LessonLink {
    pub fn new(lesson: &Lesson, selection: &Selection) -> Self {
        let target = Selection::Lesson {
            module: lesson.module_id(),
            lesson: lesson.id(),
        };

        Self {
            id: lesson.id(),
            title: lesson.title().to_string(),
            active: selection.lesson_id() == Some(lesson.id()),
            href: target.location(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Pdf,
    Drive,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MaterialLink {
    pub kind: MaterialKind,
    pub label: String,
    pub href: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ActiveLesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub player: Embed,
    pub materials: Vec<MaterialLink>,
}

impl From<&Lesson> for ActiveLesson {
    fn from(lesson: &Lesson) -> Self {
        let player = embed::resolve(lesson.video_url());

        let mut materials = vec![];
        if let Some(pdf) = lesson.pdf_url().filter(|url| !url.is_empty()) {
            materials.push(MaterialLink {
                kind: MaterialKind::Pdf,
                label: String::from("PDF guide"),
                href: pdf.to_string(),
            });
        }
        if let Embed::External { href } = &player {
            materials.push(MaterialLink {
                kind: MaterialKind::Drive,
                label: String::from("Open in Google Drive"),
                href: href.clone(),
            });
        }

        Self {
            id: lesson.id(),
            module_id: lesson.module_id(),
            title: lesson.title().to_string(),
            description: lesson.description().map(str::to_string),
            video_url: lesson.video_url().to_string(),
            player,
            materials,
        }
    }
}

/// Everything the lesson player renders for one selection.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StudentArea {
    pub user_name: String,
    pub avatar_url: String,
    pub modules: Vec<ModuleLink>,
    pub active_module: Option<Uuid>,
    pub lessons: Vec<LessonLink>,
    pub active_lesson: Option<ActiveLesson>,
    /// Query the page URL should carry for this selection.
    pub query: LessonQuery,
    pub location: String,
}

pub fn avatar_url(name: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("name", name)
        .append_pair("background", "E11D48")
        .append_pair("color", "fff")
        .finish();
    format!("https://ui-avatars.com/api/?{query}")
}
