use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    model::entity::Module,
    player::Selection,
};

/// One card of the module listing.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ModuleCard {
    pub id: Uuid,
    pub title: String,
    pub label: String,
    pub image_url: Option<String>,
    pub is_locked: bool,
    pub order_index: i32,
    /// Player location, absent for locked modules.
    pub href: Option<String>,
}

impl From<&Module> for ModuleCard {
    fn from(module: &Module) -> Self {
        let href = (!module.is_locked()).then(|| {
            Selection::Module {
                module: module.id(),
            }
            .location()
        });

        Self {
            id: module.id(),
            title: module.title().to_string(),
            label: module.label(),
            image_url: module.image_url().map(str::to_string),
            is_locked: module.is_locked(),
            order_index: module.order_index(),
            href,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MemberArea {
    pub user_name: String,
    pub modules: Vec<ModuleCard>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ModuleLink {
    pub id: Uuid,
    pub title: String,
    pub is_locked: bool,
    pub active: bool,
    pub href: Option<String>,
}

impl ModuleLink {
    pub fn new(module: &Module, selection: &Selection, navigable: bool) -> Self {
        Self {
            id: module.id(),
            title: module.title().to_string(),
            is_locked: module.is_locked(),
            active: selection.module_id() == Some(module.id()),
            href: navigable.then(|| {
                Selection::Module {
                    module: module.id(),
                }
                .location()
            }),
        }
    }
}
