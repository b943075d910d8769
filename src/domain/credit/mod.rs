pub mod model;
pub mod repository;

pub use model::CreditAccountingEntry;
pub use repository::LedgerRepository;
