pub mod error;
pub mod handler;
pub mod pipeline;
pub mod response;
pub mod transform;

pub use error::{InvocationError, VariantError};
pub use handler::function_handler;
pub use pipeline::{Handled, ImageTransformHandler};
pub use response::{HandlerResponse, ResponseStatus, VariantResult, VariantStatus};
