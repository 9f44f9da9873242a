//! Single-page app shell.

use axum::{extract::State, response::Html};

use crate::error::AppError;
use crate::state::AppState;

/// Serve `index.html` from the static directory for any unmatched path.
///
/// Read on every request so a rebuilt frontend is picked up without a restart.
pub async fn index(State(state): State<AppState>) -> Result<Html<Vec<u8>>, AppError> {
    let path = state.config().index_html_path();
    tokio::fs::read(&path).await.map(Html).map_err(|e| {
        AppError::Internal(format!("failed to read {}: {e}", path.display()))
    })
}
