pub mod factory;
pub mod repository;
mod snapshot;

pub use factory::{DbConfig, RepositoryFactory, RepositoryRegistry};
pub use repository::{ParameterRepository, RepositoryError};
pub use snapshot::{load_billing_models, load_parameter_snapshot};
