use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Json, Router, extract::State, middleware, response::IntoResponse, routing::get};

use crate::model::CrudRepository;
use crate::model::entity::{Lesson, Module, Role};
use crate::player::{LessonQuery, Selection};
use crate::web::dto::lessons::{ActiveLesson, LessonLink, StudentArea, avatar_url};
use crate::web::dto::modules::ModuleLink;
use crate::web::error::ErrorResponse;
use crate::web::routes::or_default_logged;
use crate::web::{AppState, RequestContext, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(lesson_view_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/lesson",
    description = "Lesson player for the selection named by the query. Unknown or locked ids fall back to the first available module and lesson; `query` is what the page URL should carry afterwards",
    params(LessonQuery),
    responses(
        (status = 200, description = "Student area view", body = StudentArea),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub(crate) async fn lesson_view_handler(
    State(state): State<AppState>,
    Query(query): Query<LessonQuery>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let mm = state.pool();

    let modules = or_default_logged(Module::list(mm, user).await);

    // locked modules stay in the sidebar but only admins can open them
    let open_locked = user.user_role() == Role::Admin;
    let navigable: Vec<Module> = modules
        .iter()
        .filter(|m| open_locked || !m.is_locked())
        .cloned()
        .collect();

    let selection = Selection::mount(&navigable, &query);
    let lessons = match selection.module_id() {
        Some(module_id) => or_default_logged(Lesson::all_by_module(mm, user, module_id).await),
        None => vec![],
    };
    let selection = selection.with_lessons(&lessons, query.lesson_id());

    let active_lesson = selection
        .lesson_id()
        .and_then(|id| lessons.iter().find(|l| l.id() == id))
        .map(ActiveLesson::from);

    let user_name = user.display_name();
    let body = StudentArea {
        avatar_url: avatar_url(&user_name),
        user_name,
        modules: modules
            .iter()
            .map(|m| ModuleLink::new(m, &selection, open_locked || !m.is_locked()))
            .collect(),
        active_module: selection.module_id(),
        lessons: lessons.iter().map(|l| LessonLink::new(l, &selection)).collect(),
        active_lesson,
        query: selection.query(),
        location: selection.location(),
    };

    Ok((StatusCode::OK, Json(body)))
}
