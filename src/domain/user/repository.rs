//! User and user group repository interfaces

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{User, UserGroup};
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>>;
    async fn find_all(&self) -> DomainResult<Vec<User>>;
    async fn save(&self, user: User) -> DomainResult<User>;
    async fn update(&self, user: User) -> DomainResult<()>;
}

#[async_trait]
pub trait UserGroupRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<UserGroup>>;
    async fn find_all(&self) -> DomainResult<Vec<UserGroup>>;
    async fn save(&self, group: UserGroup) -> DomainResult<UserGroup>;
}
