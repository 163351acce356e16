use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::Field},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ModelManager, ResourceType, ResourceTyped,
        entity::{Lesson, LessonCreate, Module, Profile},
    },
    utils::uploads::{material_content_type, material_path},
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::admin::{AdminDashboard, AdminLessonRow, LessonForm, MutationResponse, Stats},
        error::ErrorResponse,
        middlewares,
        routes::or_default_logged,
    },
};

/// Room for the text fields and multipart framing on top of the material cap.
const FORM_OVERHEAD: usize = 1024 * 1024;

fn body_limit(material_max_bytes: usize) -> usize {
    material_max_bytes.saturating_add(FORM_OVERHEAD)
}

pub fn routes<S>(state: AppState) -> Router<S> {
    let body_limit = body_limit(state.config().app().material_max_bytes());

    Router::new()
        .route("/", get(admin_dashboard_handler))
        .route("/lessons", post(lesson_create_handler))
        .route(
            "/lessons/{id}",
            put(lesson_update_handler).delete(lesson_delete_handler),
        )
        .route("/modules/{id}/lock", post(module_lock_handler))
        .route("/profiles/{id}/role", post(profile_role_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfirmQuery {
    /// Must be `true` for the action to run
    #[serde(default)]
    confirm: bool,
}

impl ConfirmQuery {
    fn require(&self, r#type: ResourceType, action: &'static str) -> WebResult<()> {
        if self.confirm {
            Ok(())
        } else {
            Err(WebError::confirmation_required(r#type, action))
        }
    }
}

async fn load_dashboard(mm: &ModelManager, actor: &AuthenticatedUser) -> AdminDashboard {
    let stats = Stats {
        students: or_default_logged(Profile::count(mm, actor).await),
        lessons: or_default_logged(Lesson::count(mm, actor).await),
        modules: or_default_logged(Module::count(mm, actor).await),
    };
    let modules = or_default_logged(Module::list(mm, actor).await);
    let lessons = or_default_logged(Lesson::list(mm, actor).await);
    let profiles = or_default_logged(Profile::list(mm, actor).await);

    AdminDashboard {
        stats,
        lessons: AdminLessonRow::join(&lessons, &modules),
        modules,
        profiles,
    }
}

async fn mutation_response<T: Into<String>>(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    message: T,
) -> impl IntoResponse + use<T> {
    let body = MutationResponse {
        message: message.into(),
        dashboard: load_dashboard(mm, actor).await,
    };
    (StatusCode::OK, Json(body))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/",
    description = "Admin panel: counts, modules, lessons with their module title and profiles",
    responses(
        (status = 200, description = "Admin dataset", body = AdminDashboard),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Reserved for admins", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn admin_dashboard_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin()?;
    let dashboard = load_dashboard(state.pool(), admin).await;
    Ok((StatusCode::OK, Json(dashboard)))
}

/// Uploaded lesson material, fully buffered.
#[derive(Debug)]
struct Material {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct LessonFormData {
    module_id: Option<String>,
    title: String,
    video_url: String,
    description: Option<String>,
    material: Option<Material>,
}

impl LessonFormData {
    async fn read(mut multipart: Multipart, max_bytes: usize) -> WebResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "module_id" => form.module_id = Some(text(field, max_bytes).await?),
                "title" => form.title = text(field, max_bytes).await?,
                "video_url" => form.video_url = text(field, max_bytes).await?,
                "description" => {
                    let description = text(field, max_bytes).await?;
                    form.description = (!description.trim().is_empty()).then_some(description);
                }
                "pdf" => form.material = read_material(field, max_bytes).await?,
                _ => {}
            }
        }

        Ok(form)
    }

    /// Validates the form against an existing module and builds the row,
    /// `pdf_url` is left for the caller to fill in.
    async fn validate(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        action: &'static str,
    ) -> WebResult<LessonCreate> {
        let module_id = self
            .module_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id.trim()).ok())
            .ok_or_else(|| WebError::resource_bad_request(Lesson::get_resource_type(), "select a module"))?;

        let title = self.title.trim();
        if title.is_empty() {
            return Err(WebError::resource_bad_request(
                Lesson::get_resource_type(),
                "the title is required",
            ));
        }
        let video_url = self.video_url.trim();
        if video_url.is_empty() {
            return Err(WebError::resource_bad_request(
                Lesson::get_resource_type(),
                "the video URL is required",
            ));
        }

        let module = Module::find_by_id(mm, actor, module_id)
            .await
            .map_err(|e| WebError::resource_mutation_error(Module::get_resource_type(), action, e))?;
        if module.is_none() {
            return Err(WebError::resource_bad_request(
                Lesson::get_resource_type(),
                "select a module",
            ));
        }

        Ok(LessonCreate {
            module_id,
            title: title.to_string(),
            video_url: video_url.to_string(),
            description: self.description.clone(),
            pdf_url: None,
        })
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError, max_bytes: usize) -> WebError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        WebError::material_too_large(max_bytes)
    } else {
        WebError::resource_bad_request(Lesson::get_resource_type(), e.body_text())
    }
}

async fn text(field: Field<'_>, max_bytes: usize) -> WebResult<String> {
    field.text().await.map_err(|e| multipart_error(e, max_bytes))
}

/// Reads the file field chunk by chunk and gives up as soon as the cap is
/// exceeded. A file input left empty yields `None`.
async fn read_material(mut field: Field<'_>, max_bytes: usize) -> WebResult<Option<Material>> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);

    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if bytes.len() + chunk.len() > max_bytes {
            tracing::warn!(
                file = file_name.as_deref().unwrap_or_default(),
                max_bytes,
                "material rejected, over the size limit"
            );
            return Err(WebError::material_too_large(max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.is_empty() && file_name.as_deref().unwrap_or_default().is_empty() {
        return Ok(None);
    }

    Ok(Some(Material {
        file_name,
        content_type,
        bytes,
    }))
}

/// Stores the material and returns its public URL.
async fn upload_material(
    state: &AppState,
    actor: &AuthenticatedUser,
    material: Material,
) -> WebResult<String> {
    let bucket = state.config().app().materials_bucket();
    let path = material_path(material.file_name.as_deref());
    let content_type = material_content_type(material.content_type.as_deref());
    let size = material.bytes.len();

    let backend = state.pool().backend();
    backend
        .upload(actor.access_token(), bucket, &path, &content_type, material.bytes)
        .await
        .map_err(WebError::material_upload_failed)?;

    tracing::info!(bucket, path = %path, size, "material uploaded");
    Ok(backend.public_url(bucket, &path))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/lessons",
    description = "Creates a lesson, uploading its material first when one is attached",
    request_body(content = LessonForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Lesson created", body = MutationResponse),
        (status = 400, description = "Missing module, title or video URL", body = ErrorResponse),
        (status = 403, description = "Reserved for admins", body = ErrorResponse),
        (status = 413, description = "Material over the size limit", body = ErrorResponse),
        (status = 502, description = "Backend rejected the change", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn lesson_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin()?;
    let mm = state.pool();

    let max_bytes = state.config().app().material_max_bytes();
    let mut form = LessonFormData::read(multipart, max_bytes).await?;
    let mut data = form.validate(mm, admin, "create lesson").await?;

    if let Some(material) = form.material.take() {
        data.pdf_url = Some(upload_material(&state, admin, material).await?);
    }

    let lesson = Lesson::create(mm, admin, data)
        .await
        .map_err(|e| {
            WebError::resource_mutation_error(Lesson::get_resource_type(), "create lesson", e)
        })?;
    tracing::info!(lesson = %lesson.id(), module = %lesson.module_id(), "lesson created");

    Ok(mutation_response(mm, admin, "Lesson created.").await)
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/lessons/{id}",
    description = "Updates a lesson. Without a new file the current material is kept",
    params(
        ("id" = Uuid, Path, description = "Lesson id")
    ),
    request_body(content = LessonForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Lesson updated", body = MutationResponse),
        (status = 400, description = "Missing module, title or video URL", body = ErrorResponse),
        (status = 404, description = "No such lesson", body = ErrorResponse),
        (status = 413, description = "Material over the size limit", body = ErrorResponse),
        (status = 502, description = "Backend rejected the change", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn lesson_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin()?;
    let mm = state.pool();

    let max_bytes = state.config().app().material_max_bytes();
    let mut form = LessonFormData::read(multipart, max_bytes).await?;

    let action = "update lesson";
    let lesson = Lesson::find_by_id(mm, admin, id)
        .await
        .map_err(|e| WebError::resource_mutation_error(Lesson::get_resource_type(), action, e))?
        .ok_or(WebError::resource_not_found(Lesson::get_resource_type()))?;
    let mut data = form.validate(mm, admin, action).await?;

    data.pdf_url = match form.material.take() {
        Some(material) => Some(upload_material(&state, admin, material).await?),
        None => lesson.pdf_url().map(str::to_string),
    };

    let lesson = lesson
        .update(mm, admin, data)
        .await
        .map_err(|e| WebError::resource_mutation_error(Lesson::get_resource_type(), action, e))?;
    tracing::info!(lesson = %lesson.id(), "lesson updated");

    Ok(mutation_response(mm, admin, "Lesson updated.").await)
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/lessons/{id}",
    description = "Deletes a lesson, requires `confirm=true`",
    params(
        ("id" = Uuid, Path, description = "Lesson id"),
        ConfirmQuery,
    ),
    responses(
        (status = 200, description = "Lesson deleted", body = MutationResponse),
        (status = 404, description = "No such lesson", body = ErrorResponse),
        (status = 428, description = "Missing confirmation", body = ErrorResponse),
        (status = 502, description = "Backend rejected the change", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn lesson_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin()?;
    confirm.require(Lesson::get_resource_type(), "delete this lesson")?;
    let mm = state.pool();

    let action = "delete lesson";
    let lesson = Lesson::find_by_id(mm, admin, id)
        .await
        .map_err(|e| WebError::resource_mutation_error(Lesson::get_resource_type(), action, e))?
        .ok_or(WebError::resource_not_found(Lesson::get_resource_type()))?;

    lesson
        .delete(mm, admin)
        .await
        .map_err(|e| WebError::resource_mutation_error(Lesson::get_resource_type(), action, e))?;
    tracing::info!(lesson = %id, "lesson deleted");

    Ok(mutation_response(mm, admin, "Lesson deleted.").await)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/modules/{id}/lock",
    description = "Flips the lock flag of a module",
    params(
        ("id" = Uuid, Path, description = "Module id")
    ),
    responses(
        (status = 200, description = "Lock toggled", body = MutationResponse),
        (status = 404, description = "No such module", body = ErrorResponse),
        (status = 502, description = "Backend rejected the change", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn module_lock_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin()?;
    let mm = state.pool();

    let action = "change lock";
    let module = Module::find_by_id(mm, admin, id)
        .await
        .map_err(|e| WebError::resource_mutation_error(Module::get_resource_type(), action, e))?
        .ok_or(WebError::resource_not_found(Module::get_resource_type()))?;

    let locked = !module.is_locked();
    module
        .set_locked(mm, admin, locked)
        .await
        .map_err(|e| WebError::resource_mutation_error(Module::get_resource_type(), action, e))?;
    tracing::info!(module = %id, locked, "module lock changed");

    let message = if locked {
        "Module locked."
    } else {
        "Module unlocked."
    };
    Ok(mutation_response(mm, admin, message).await)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/profiles/{id}/role",
    description = "Switches a user between `student` and `admin`, requires `confirm=true`",
    params(
        ("id" = Uuid, Path, description = "Profile id"),
        ConfirmQuery,
    ),
    responses(
        (status = 200, description = "Role changed", body = MutationResponse),
        (status = 404, description = "No such profile", body = ErrorResponse),
        (status = 428, description = "Missing confirmation", body = ErrorResponse),
        (status = 502, description = "Backend rejected the change", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn profile_role_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.admin()?;
    confirm.require(Profile::get_resource_type(), "change this role")?;
    let mm = state.pool();

    let action = "change role";
    let profile = Profile::find_by_id(mm, admin, id)
        .await
        .map_err(|e| WebError::resource_mutation_error(Profile::get_resource_type(), action, e))?
        .ok_or(WebError::resource_not_found(Profile::get_resource_type()))?;

    let role = profile.role().toggled();
    profile
        .set_role(mm, admin, role)
        .await
        .map_err(|e| WebError::resource_mutation_error(Profile::get_resource_type(), action, e))?;
    tracing::info!(profile = %id, %role, "role changed");

    Ok(mutation_response(mm, admin, format!("Role changed to {role}.")).await)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_body_limit() {
        assert_eq!(body_limit(1024), 1024 + FORM_OVERHEAD);
        assert_eq!(body_limit(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_confirm_required() {
        let err = ConfirmQuery::default()
            .require(ResourceType::Lesson, "delete this lesson")
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::PRECONDITION_REQUIRED);
        assert!(ConfirmQuery { confirm: true }.require(ResourceType::Lesson, "x").is_ok());
    }
}
