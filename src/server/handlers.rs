//! Request handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde_json::json;
use tracing::debug;

use super::render::{self, Outcome, PageView};
use super::state::{HaltedState, ReadyState};

/// Form with defaults and the default record echoed.
pub async fn show_form(State(state): State<Arc<ReadyState>>) -> Html<String> {
    let view = PageView::initial(&state.form, &state.default_record);
    Html(render::form_page(&state.form, &view))
}

/// Build the record from the submission, run the model, render the outcome.
///
/// Form and inference errors are shown in place of the prediction; the page
/// itself always renders.
pub async fn submit_form(
    State(state): State<Arc<ReadyState>>,
    Form(submitted): Form<HashMap<String, String>>,
) -> Html<String> {
    // Blank and missing values show the default the record will use
    let inputs: Vec<String> = state
        .form
        .fields
        .fields()
        .iter()
        .map(|field| {
            submitted
                .get(&field.name)
                .filter(|raw| !raw.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| field.default.to_string())
        })
        .collect();

    let record = match state.extractor.extract(&state.form.fields, &submitted) {
        Ok(record) => record,
        Err(e) => {
            debug!(error = %e, "Rejected form submission");
            let view = PageView {
                inputs,
                record: None,
                outcome: Some(Outcome::Error(e.to_string())),
            };
            return Html(render::form_page(&state.form, &view));
        }
    };

    let result = state.lock_engine().run(&record);

    let outcome = match result {
        Ok(prediction) => Outcome::Prediction(prediction),
        Err(e) => Outcome::Error(e.to_string()),
    };

    let view = PageView {
        inputs,
        record: Some(&record),
        outcome: Some(outcome),
    };
    Html(render::form_page(&state.form, &view))
}

pub async fn health_check(State(state): State<Arc<ReadyState>>) -> Json<serde_json::Value> {
    let metrics = state.lock_engine().metrics();

    Json(json!({
        "status": "ok",
        "model_loaded": true,
        "version": env!("CARGO_PKG_VERSION"),
        "predictions": metrics.successes(),
        "failures": metrics.failures(),
    }))
}

/// Every route once startup has failed.
pub async fn halted(State(state): State<Arc<HaltedState>>) -> impl IntoResponse {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html(render::fatal_page(&state.title, &state.message)),
    )
}

pub async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Not found. Visit / for the prediction form.",
        })),
    )
}
