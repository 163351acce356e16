use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "Backend access token of the signed in user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::account::account_signin_handler,
        crate::web::routes::account::account_signout_handler,
        crate::web::routes::account::account_me_handler,
        crate::web::routes::modules::modules_list_handler,
        crate::web::routes::lessons::lesson_view_handler,
        crate::web::routes::admin::admin_dashboard_handler,
        crate::web::routes::admin::lesson_create_handler,
        crate::web::routes::admin::lesson_update_handler,
        crate::web::routes::admin::lesson_delete_handler,
        crate::web::routes::admin::module_lock_handler,
        crate::web::routes::admin::profile_role_handler,
    ),
    modifiers(&CookieAuthModifier),
    tags(
        (name = "account", description = "Sign in, sign out and the current user"),
        (name = "modules", description = "Member area"),
        (name = "lessons", description = "Lesson player"),
        (name = "admin", description = "Admin panel and its mutations"),
    )
)]
pub struct ApiDoc;
