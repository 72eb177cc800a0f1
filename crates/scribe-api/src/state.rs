//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use scribe_core::config::ScribeConfig;
use scribe_form::{DocumentRenderer, FieldExtractor};
use scribe_interview::InterviewController;
use scribe_storage::UserDirectory;

use crate::auth::IdentityVerifier;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Nothing
/// here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ScribeConfig>,
    pub controller: Arc<InterviewController>,
    pub users: Arc<dyn UserDirectory>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub extractor: Arc<FieldExtractor>,
    pub renderer: Arc<DocumentRenderer>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: ScribeConfig,
        controller: InterviewController,
        users: Arc<dyn UserDirectory>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let renderer = DocumentRenderer::new(config.interview.form_type.clone());
        Self {
            config: Arc::new(config),
            controller: Arc::new(controller),
            users,
            verifier,
            extractor: Arc::new(FieldExtractor::new()),
            renderer: Arc::new(renderer),
            start_time: Instant::now(),
        }
    }
}
