//! Client-side API orchestration for the Word Canvas backend.
//!
//! Layers, leaf-first: the [`envelope`] every operation resolves to, the
//! [`redact`]ion rules used before anything is logged, the normalizing
//! request [`client`], the deduplicating response [`cache`], and the
//! [`generation`] client tying them together for the image endpoint.

pub mod cache;
pub mod client;
pub mod config;
pub mod envelope;
pub mod generation;
pub mod interceptor;
pub mod redact;

pub use cache::{CacheSnapshot, MutateOptions, ReadState, ResponseCache, UNHANDLED_ERROR_CODE};
pub use client::{ApiClient, RequestOptions};
pub use config::{ServiceConfig, DEFAULT_TIMEOUT};
pub use envelope::{ApiError, ApiResponse};
pub use generation::{ImageGenerationClient, GENERATION_ENDPOINT};
pub use interceptor::{Interceptors, RequestRecord, ResponseRecord};
