pub mod cache;
pub mod db;
pub mod models;
pub mod queries;
pub mod retry_queue;
pub mod schema;
pub mod signals;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
