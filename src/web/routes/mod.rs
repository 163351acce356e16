use crate::{
    error::log_error,
    model::ModelResult,
    web::{AppState, doc::ApiDoc},
};
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod account;
pub mod admin;
pub mod lessons;
pub mod modules;
pub mod pages;

/// Views render with empty data when a fetch fails, the failure is only logged.
pub fn or_default_logged<T: Default>(result: ModelResult<T>) -> T {
    result.unwrap_or_else(|e| {
        log_error(&e);
        T::default()
    })
}

pub fn build_app<S: Send + Sync + Clone + 'static>(state: AppState) -> Router<S> {
    let docs = state.config().app().docs();

    let mut router = Router::new()
        .nest("/api/v1/account/", account::routes(state.clone()))
        .nest("/api/v1/modules/", modules::routes(state.clone()))
        .nest("/api/v1/lesson", lessons::routes(state.clone()))
        .nest("/api/v1/admin/", admin::routes(state.clone()));

    if docs {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
        .merge(pages::routes(state))
        .layer(CookieManagerLayer::default())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}
