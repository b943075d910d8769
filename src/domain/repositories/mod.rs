//! Repository access for the domain layer
//!
//! `RepositoryProvider` gives unified access to all per-aggregate
//! repositories. Services request only the repository they need:
//!
//! ```ignore
//! async fn handle(repos: &dyn RepositoryProvider) {
//!     let program = repos.programs().find_by_id(7).await?;
//!     let running = repos.executions().find_running_for_device(3).await?;
//! }
//! ```

use super::credit::LedgerRepository;
use super::device::DeviceRepository;
use super::execution::ExecutionRepository;
use super::program::ProgramRepository;
use super::user::{UserGroupRepository, UserRepository};

pub trait RepositoryProvider: Send + Sync {
    fn programs(&self) -> &dyn ProgramRepository;
    fn devices(&self) -> &dyn DeviceRepository;
    fn users(&self) -> &dyn UserRepository;
    fn groups(&self) -> &dyn UserGroupRepository;
    fn executions(&self) -> &dyn ExecutionRepository;
    fn ledger(&self) -> &dyn LedgerRepository;
}
