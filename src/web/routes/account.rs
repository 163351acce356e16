use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower_cookies::{Cookies, cookie::time::Duration};

use crate::{
    error::log_error,
    model::entity::Profile,
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::account::{AccountResponse, SigninBody, SigninResponse, SignoutResponse},
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN, session_cookie},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/me", get(account_me_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signin", post(account_signin_handler))
        .route("/signout", post(account_signout_handler))
        .merge(protected)
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Signs the user in through the backend and stores the session cookie",
    request_body = SigninBody,
    responses(
        (status = 200, description = "User signed in, `redirect` names the landing page", body = SigninResponse),
        (status = 401, description = "Credentials rejected by the backend", body = ErrorResponse),
        (status = 502, description = "Backend unreachable", body = ErrorResponse),
    ),
    tag = "account",
)]
pub(crate) async fn account_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SigninBody>,
) -> WebResult<impl IntoResponse> {
    let session = state
        .pool()
        .backend()
        .sign_in(payload.email.trim(), &payload.password)
        .await
        .map_err(WebError::auth_invalid_credentials)?;

    let user_id = session.user.id;
    let actor = AuthenticatedUser::new(user_id, session.user.email, session.access_token.clone());
    let actor = match Profile::find_by_id(state.pool(), &actor, user_id).await {
        Ok(Some(profile)) => actor.with_profile(&profile),
        Ok(None) => actor,
        Err(e) => {
            log_error(&e);
            actor
        }
    };

    // the cookie lives as long as the backend session
    let mut cookie = session_cookie(session.access_token);
    if let Some(secs) = session.expires_in.filter(|secs| *secs > 0) {
        cookie.set_max_age(Duration::seconds(secs));
    }
    cookies.add(cookie);
    tracing::info!(user = %user_id, role = %actor.user_role(), "signed in");

    let body = SigninResponse {
        account: AccountResponse::from(&actor),
        redirect: actor.user_role().landing_page().to_string(),
    };
    Ok((StatusCode::OK, Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signout",
    description = "Ends the backend session and removes the session cookie",
    responses(
        (status = 200, description = "Signed out", body = SignoutResponse),
    ),
    tag = "account",
)]
pub(crate) async fn account_signout_handler(
    State(state): State<AppState>,
    cookies: Cookies,
) -> impl IntoResponse {
    if let Some(cookie) = cookies.get(AUTH_TOKEN) {
        if let Err(e) = state.pool().backend().sign_out(cookie.value()).await {
            log_error(&e);
        }
    }
    cookies.remove(session_cookie(String::new()));

    Json(SignoutResponse {
        redirect: String::from("/"),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/account/me",
    description = "Current user with display name and role",
    responses(
        (status = 200, description = "Current user", body = AccountResponse),
        (status = 401, description = "No session", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn account_me_handler(ctx: RequestContext) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    Ok((StatusCode::OK, Json(AccountResponse::from(user))))
}
