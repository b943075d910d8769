//! Program repository interface

use async_trait::async_trait;

use super::model::Program;
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait ProgramRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Program>>;
    async fn find_all(&self) -> DomainResult<Vec<Program>>;
    async fn save(&self, program: Program) -> DomainResult<Program>;
    async fn update(&self, program: Program) -> DomainResult<()>;
}
