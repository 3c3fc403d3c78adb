pub mod error;
pub mod json_store;
pub mod progress_store;
pub mod schema;

pub use error::StoreError;
pub use progress_store::ProgressStore;
