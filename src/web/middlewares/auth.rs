use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::{Cookie, Cookies};

use crate::{
    backend::BackendResult,
    error::log_error,
    model::entity::Profile,
    web::{AppState, RequestContext, context::AuthenticatedUser},
};

pub static AUTH_TOKEN: &str = "SID";

/// Resolves the `SID` cookie into a [`RequestContext`]. An unknown or expired
/// session degrades to an anonymous request and the cookie is dropped. When
/// the backend cannot be reached the request is anonymous too, but the cookie
/// is kept for the next one.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Response {
    let token = cookies.get(AUTH_TOKEN).map(|c| c.value().to_string());

    let user = match token {
        Some(token) => match resolve_user(&state, &token).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                tracing::debug!("session token rejected by backend");
                cookies.remove(session_cookie(String::new()));
                None
            }
            Err(e) => {
                log_error(&e);
                tracing::warn!(status = ?e.status(), "session lookup failed, cookie kept");
                None
            }
        },
        None => None,
    };

    req.extensions_mut().insert(RequestContext::new(user));
    next.run(req).await
}

/// `Ok(None)` when the backend rejects the token, `Err` when it could not
/// answer at all.
async fn resolve_user(state: &AppState, token: &str) -> BackendResult<Option<AuthenticatedUser>> {
    let Some(user) = state.pool().backend().get_user(token).await? else {
        return Ok(None);
    };

    let actor = AuthenticatedUser::new(user.id, user.email, token);
    let actor = match Profile::find_by_id(state.pool(), &actor, user.id).await {
        Ok(Some(profile)) => actor.with_profile(&profile),
        Ok(None) => actor,
        Err(e) => {
            // without a profile the user keeps the student role
            log_error(&e);
            actor
        }
    };
    Ok(Some(actor))
}

/// The session cookie as set on sign in.
pub fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie
}
