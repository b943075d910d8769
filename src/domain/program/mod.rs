pub mod model;
pub mod repository;

pub use model::{Program, ProgramType, TimeUnit};
pub use repository::ProgramRepository;
