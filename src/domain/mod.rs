pub mod credit;
pub mod device;
pub mod execution;
pub mod money;
pub mod program;
pub mod repositories;
pub mod user;

// Re-export commonly used types
pub use credit::{CreditAccountingEntry, LedgerRepository};
pub use device::{Device, DeviceRepository};
pub use execution::{Execution, ExecutionRepository, ExecutionState};
pub use money::{format_currency, round_currency};
pub use program::{Program, ProgramRepository, ProgramType, TimeUnit};
pub use repositories::RepositoryProvider;
pub use user::{Discount, User, UserGroup, UserGroupRepository, UserRepository};

pub use crate::shared::errors::{DomainError, DomainResult};
