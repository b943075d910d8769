pub mod events;
pub mod services;

pub use events::{create_event_bus, Event, EventBus};
pub use services::{
    start_expiry_sweep, CreditService, ExecutionService, ReconciliationReport,
    ReconciliationService,
};
