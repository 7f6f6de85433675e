pub mod config;
pub mod error;
pub mod file_store;
pub mod store;

pub use config::Config;
pub use error::{DossierError, Result};
pub use file_store::{JsonFileStore, StorePersister};
pub use store::*;
