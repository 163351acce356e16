use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::get,
};

use crate::{
    model::{CrudRepository, entity::Module},
    web::{
        AppState, RequestContext, WebResult,
        dto::modules::{MemberArea, ModuleCard},
        error::ErrorResponse,
        middlewares,
        routes::or_default_logged,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(modules_list_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/modules/",
    description = "Member area: display name and every module ordered by its index. Locked modules carry no player link",
    responses(
        (status = 200, description = "Member area view", body = MemberArea),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
    ),
    tag = "modules",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn modules_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let modules = or_default_logged(Module::list(state.pool(), user).await);

    let body = MemberArea {
        user_name: user.display_name(),
        modules: modules.iter().map(ModuleCard::from).collect(),
    };
    Ok((StatusCode::OK, Json(body)))
}
