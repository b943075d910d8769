pub mod model;
pub mod repository;

pub use model::{Execution, ExecutionState};
pub use repository::ExecutionRepository;
