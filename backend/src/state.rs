//! Application state management

use std::sync::Arc;

use crate::generation::GenerationService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Image generation service with fallback policy
    pub generation: Arc<GenerationService>,
}
