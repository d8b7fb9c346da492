use std::sync::{Arc, RwLock};

use axum::{Router, routing::get};

use super::public;
use crate::ai::prompt::SUGGESTED_QUESTIONS;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

async fn suggestions() -> axum::Json<public::SuggestionsResponse> {
    axum::Json(public::SuggestionsResponse {
        suggestions: SUGGESTED_QUESTIONS.iter().map(|q| q.to_string()).collect(),
    })
}

pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(suggestions))
}
