mod types;

pub use types::{ConfigError, EventError, StorageError, TransformError};
