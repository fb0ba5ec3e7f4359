//! Application state

use crate::config::{AppConfig, FormConfig};
use crate::feature_extractor::FeatureExtractor;
use crate::models::inference::InferenceEngine;
use crate::models::loader::LoadError;
use crate::types::record::Record;
use std::sync::{Mutex, MutexGuard};
use tracing::error;

/// State after startup: either the model loaded, or the front end is halted.
pub enum AppState {
    Ready(ReadyState),
    Halted(HaltedState),
}

/// Shared by the form handlers once the model is loaded
pub struct ReadyState {
    pub form: FormConfig,
    pub extractor: FeatureExtractor,
    /// The form's defaults as a record
    pub default_record: Record,
    /// Sessions run through `&mut`, so inference is serialized here
    pub engine: Mutex<InferenceEngine>,
}

/// Served on every route when the model could not be loaded
pub struct HaltedState {
    pub title: String,
    pub message: String,
}

impl AppState {
    /// Load the configured model, halting on failure.
    pub fn load(config: &AppConfig) -> Self {
        Self::from_engine(config.form.clone(), InferenceEngine::from_config(config))
    }

    /// Build state from the outcome of loading the model.
    pub fn from_engine(form: FormConfig, engine: Result<InferenceEngine, LoadError>) -> Self {
        match engine {
            Ok(engine) => AppState::Ready(ReadyState::new(form, engine)),
            Err(e) => {
                error!(error = %e, "Model could not be loaded, front end halted");
                AppState::Halted(HaltedState {
                    title: form.title,
                    message: e.to_string(),
                })
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AppState::Ready(_))
    }
}

impl ReadyState {
    pub fn new(form: FormConfig, engine: InferenceEngine) -> Self {
        Self {
            default_record: Record::from_defaults(&form.fields),
            form,
            extractor: FeatureExtractor::new(),
            engine: Mutex::new(engine),
        }
    }

    /// Take the engine, recovering it if a previous holder panicked.
    pub fn lock_engine(&self) -> MutexGuard<'_, InferenceEngine> {
        self.engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
