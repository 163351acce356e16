use crate::{
    backend::Collection,
    model::{ModelManager, error::ModelResult},
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Profile,
    Module,
    Lesson,
    Page,
}

pub trait ResourceTyped {
    fn get_resource_type() -> ResourceType;

    fn collection() -> Collection;
}

#[async_trait::async_trait]
pub trait CrudRepository<T, CreateUpdate, V>
where
    T: ResourceTyped,
    V: Clone + Copy,
{
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CreateUpdate,
    ) -> ModelResult<T>;

    async fn update(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CreateUpdate,
    ) -> ModelResult<T>
    where
        Self: Sized;

    async fn delete(self, mm: &ModelManager, actor: &AuthenticatedUser) -> ModelResult<()>
    where
        Self: Sized;

    async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        id: V,
    ) -> ModelResult<Option<T>>;

    /// Whole collection in its display order.
    async fn list(mm: &ModelManager, actor: &AuthenticatedUser) -> ModelResult<Vec<T>>;

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> ModelResult<i64>;
}
