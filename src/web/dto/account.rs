use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::Role;

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SigninBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: String,
    pub role: Role,
}

/// Where the client navigates next.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SigninResponse {
    pub account: AccountResponse,
    pub redirect: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SignoutResponse {
    pub redirect: String,
}

impl From<&crate::web::AuthenticatedUser> for AccountResponse {
    fn from(user: &crate::web::AuthenticatedUser) -> Self {
        Self {
            id: user.user_id(),
            email: user.email().map(str::to_string),
            display_name: user.display_name(),
            role: user.user_role(),
        }
    }
}
