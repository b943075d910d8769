pub mod model;
pub mod repository;

pub use model::{Discount, User, UserGroup};
pub use repository::{UserGroupRepository, UserRepository};
