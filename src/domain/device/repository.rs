//! Device repository interface

use async_trait::async_trait;

use super::model::Device;
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Device>>;
    async fn find_all(&self) -> DomainResult<Vec<Device>>;
    async fn save(&self, device: Device) -> DomainResult<Device>;
    async fn update(&self, device: Device) -> DomainResult<()>;
}
