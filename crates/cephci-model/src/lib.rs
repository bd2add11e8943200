pub mod config;
pub use config::RunConfig;

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;
