use crate::{
    model::{
        entity::Role,
        error::{ModelError, ModelResult},
    },
    web::AuthenticatedUser,
};

/// Admins pass every role check.
pub fn require_role(actor: &AuthenticatedUser, role: Role) -> ModelResult<()> {
    let actual = actor.user_role();
    if actual == Role::Admin || actual == role {
        Ok(())
    } else {
        Err(ModelError::Forbidden)
    }
}
