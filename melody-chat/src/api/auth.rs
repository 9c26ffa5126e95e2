//! Owner account authorization
//!
//! `GET /authorize` sends the owner to the catalog consent page; the catalog
//! redirects back to `GET /callback?code=...`, which installs the owner's
//! refresh token for playlist creation. Needed once per process when no
//! refresh token is configured.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// GET /authorize
pub async fn authorize(State(state): State<AppState>) -> ApiResult<Redirect> {
    let url = state
        .authorization
        .authorize_url()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Redirect::temporary(&url))
}

/// GET /callback
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Json<Value>> {
    if let Some(error) = query.error {
        warn!(error = %error, "Owner declined authorization");
        return Err(ApiError::BadRequest(format!("Authorization denied: {}", error)));
    }

    let code = query
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    state.authorization.complete_authorization(&code).await?;
    info!("Owner authorization completed via callback");

    Ok(Json(json!({ "status": "authorized" })))
}

/// Build authorization routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/authorize", get(authorize))
        .route("/callback", get(callback))
}
