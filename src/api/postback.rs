use axum::{ extract::{ Query, State }, http::StatusCode, response::{ IntoResponse, Response } };

use crate::error::AppError;
use crate::services::{ Postback, PostbackParams };

use super::AppState;

/// Advertiser callback. Answers in plain text; anything other than a 200
/// makes the network retry, so only store failures surface as 5xx.
pub async fn receive_postback(
    State(state): State<AppState>,
    Query(params): Query<PostbackParams>
) -> Response {
    let result = match Postback::parse(&params) {
        Ok(postback) => state.postback_service.handle(postback).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(ack) => (StatusCode::OK, ack.as_str()).into_response(),
        Err(e) => {
            let status = e.status_code();
            let message = match &e {
                AppError::InvalidInput(msg) => msg.clone(),
                other => other.to_error_response().error.message,
            };

            if status.is_server_error() {
                tracing::error!("Postback failed: {}", e);
            } else {
                tracing::warn!("Postback rejected ({:?}): {}", params, e);
            }

            (status, message).into_response()
        }
    }
}
