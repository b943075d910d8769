pub mod credit;
pub mod execution;
pub mod expiry_sweep;
pub mod reconciler;

pub use credit::CreditService;
pub use execution::ExecutionService;
pub use expiry_sweep::start_expiry_sweep;
pub use reconciler::{ReconciliationReport, ReconciliationService};
