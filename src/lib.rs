//! # Washhub billing core
//!
//! Billing, discount and credit-ledger engine for a laundry machine
//! management application. Turns a metered device session (a program
//! execution) into a monetary charge, applies per-group discounts and
//! records the charge against a per-user credit ledger.
//!
//! ## Architecture
//!
//! - **domain**: entities, pure price/discount calculators and repository
//!   traits (one directory per aggregate)
//! - **application**: lifecycle, ledger and reconciliation services, the
//!   background expiry sweep, and the domain event bus
//! - **infrastructure**: in-memory storage for development and tests; a
//!   durable `RepositoryProvider` is supplied by the embedding application
//! - **shared**: error taxonomy, shutdown signal, retry helper
//!
//! The crate is a library boundary: screens, authentication and the
//! device maintenance protocol live in the embedding application and talk
//! to this core through the service structs and the event bus.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use config::{default_config_path, init_tracing, ConfigError, EngineConfig};

// Re-export the service layer for easy access
pub use application::{
    create_event_bus, start_expiry_sweep, CreditService, Event, EventBus, ExecutionService,
    ReconciliationReport, ReconciliationService,
};

// Re-export core domain types
pub use domain::{DomainError, DomainResult, RepositoryProvider};

pub use infrastructure::InMemoryStorage;
