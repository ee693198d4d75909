pub mod config;
pub mod constants;
pub mod errors;
pub mod event;
pub mod guard;
pub mod storage;
pub mod template;
pub mod transform;
pub mod validation;

// 公開API
pub use config::{parse_variants, HandlerConfig, ResizeSpec};
pub use constants::{DEFAULT_QUALITY, MAX_DIMENSION, MAX_INPUT_SIZE, MAX_PIXELS};
pub use errors::{ConfigError, EventError, StorageError, TransformError};
pub use event::NotificationEvent;
pub use guard::SelfTriggerGuard;
pub use storage::{InMemoryStorage, ObjectStorage, S3Storage, StoredObject};
pub use template::KeyTemplate;
pub use transform::{
    decode_image, encode_image, plan_resize, resize_image, DecodedImage, FitMode, Orientation,
    OutputFormat, ResizePlan, TransformParams,
};
pub use validation::{validate_key, validate_params};
