//! Payment recording and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{Payment, RecordPaymentRequest};

use super::{AppState, id_response, parse_record_id};
use crate::error::ApiError;

/// POST /payments: record a payment for an order, returning its ID.
///
/// An error response does not mean nothing happened: the payment may be
/// committed while a later order or stock update failed. Retrying is safe
/// and returns the committed payment's ID.
#[tracing::instrument(skip(state, body))]
pub async fn record(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RecordPaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, String), ApiError> {
    let Json(request) = body?;
    let payment_id = state.payments.record_payment(&request).await?;
    Ok(id_response(payment_id))
}

/// GET /payments/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let payment_id = parse_record_id(&id)?;
    Ok(Json(state.payments.get_payment(payment_id).await?))
}
