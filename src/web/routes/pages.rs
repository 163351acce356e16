use std::path::PathBuf;

use axum::{
    Router,
    extract::State,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tower_http::services::ServeDir;

use crate::{
    model::{ResourceType, entity::Role},
    web::{AppState, RequestContext, WebError, WebResult, error::ServerError, middlewares},
};

/// Page routes serve the front-end shell. Guards run before the shell is read
/// so a protected page never reaches a visitor it would redirect.
pub fn routes<S>(state: AppState) -> Router<S> {
    let assets = ServeDir::new(state.config().app().static_dir());

    Router::new()
        .route("/", get(index_page_handler))
        .route("/modules", get(member_page_handler))
        .route("/lesson", get(member_page_handler))
        .route("/admin", get(admin_page_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .fallback_service(assets)
        .with_state(state)
}

async fn shell(state: &AppState) -> WebResult<Html<String>> {
    let path = PathBuf::from(state.config().app().static_dir()).join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(Html(html)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "front-end shell missing");
            Err(WebError::resource_not_found(ResourceType::Page))
        }
        Err(e) => Err(ServerError::from(e).into()),
    }
}

async fn index_page_handler(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    shell(&state).await
}

async fn member_page_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<Response> {
    if ctx.maybe_user().is_none() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(shell(&state).await?.into_response())
}

async fn admin_page_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<Response> {
    match ctx.maybe_user().map(|user| user.user_role()) {
        None => Ok(Redirect::to("/").into_response()),
        Some(Role::Admin) => Ok(shell(&state).await?.into_response()),
        Some(_) => Ok(Redirect::to(Role::Student.landing_page()).into_response()),
    }
}
