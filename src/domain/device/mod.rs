pub mod model;
pub mod repository;

pub use model::Device;
pub use repository::DeviceRepository;
