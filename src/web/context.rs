//! Request context, e.g. who is calling, their role and backend token.
//!

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{
    model::entity::{Profile, Role, display_name},
    web::{WebResult, error::WebError},
};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user_id: Uuid,
    user_role: Role,
    email: Option<String>,
    full_name: Option<String>,
    access_token: String,
}

impl AuthenticatedUser {
    pub fn new<T: Into<String>>(user_id: Uuid, email: Option<String>, access_token: T) -> Self {
        Self {
            user_id,
            user_role: Role::Student,
            email,
            full_name: None,
            access_token: access_token.into(),
        }
    }

    /// Actor for tooling that talks to the backend with a service key.
    pub fn service<T: Into<String>>(access_token: T) -> Self {
        Self::new(Uuid::max(), None, access_token).with_role(Role::Admin)
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.user_role = role;
        self
    }

    pub fn with_profile(mut self, profile: &Profile) -> Self {
        self.user_role = profile.role();
        self.full_name = profile.full_name().map(str::to_string);
        self
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn user_role(&self) -> Role {
        self.user_role
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn display_name(&self) -> String {
        display_name(self.full_name.as_deref(), self.email.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    maybe_user: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn new(maybe_user: Option<AuthenticatedUser>) -> Self {
        Self { maybe_user }
    }

    pub fn maybe_user(&self) -> Option<&AuthenticatedUser> {
        self.maybe_user.as_ref()
    }

    pub fn user(&self) -> WebResult<&AuthenticatedUser> {
        self.maybe_user.as_ref().ok_or(WebError::auth_required())
    }

    /// The caller, provided they are an admin.
    pub fn admin(&self) -> WebResult<&AuthenticatedUser> {
        let user = self.user()?;
        crate::model::require_role(user, Role::Admin).map_err(|_| WebError::admin_required())?;
        Ok(user)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts.extensions.get::<RequestContext>();
        if let Some(ctx) = ctx {
            Ok(ctx.clone())
        } else {
            Ok(RequestContext::new(None))
        }
    }
}
