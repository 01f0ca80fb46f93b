pub mod billing;
pub mod calculations;
pub mod db;
pub mod models;

pub use db::repository::{ParameterRepository, RepositoryError};
pub use models::*;
