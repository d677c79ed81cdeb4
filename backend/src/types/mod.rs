mod environment;
mod error;

pub use environment::{Environment, DEFAULT_IMAGE_MODEL};
pub use error::{AppError, INVALID_PROMPT_MESSAGE};
