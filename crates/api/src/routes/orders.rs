//! Order placement and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{Order, PlaceOrderRequest};

use super::{AppState, id_response, parse_record_id};
use crate::error::ApiError;

/// POST /orders: place an order, returning its ID.
///
/// Repeating a request with the same user, products and date returns the
/// first order's ID.
#[tracing::instrument(skip(state, body))]
pub async fn place(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, String), ApiError> {
    let Json(request) = body?;
    let order_id = state.orders.place_order(&request).await?;
    Ok(id_response(order_id))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_record_id(&id)?;
    Ok(Json(state.orders.get_order(order_id).await?))
}
