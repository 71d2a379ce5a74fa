//! Payment preference endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use checkout::PaymentGateway;
use domain::Money;
use serde::{Deserialize, Serialize};
use stores::AttemptLog;

use crate::error::ApiError;
use crate::routes::{AppState, customer_email};

#[derive(Deserialize)]
pub struct CreatePreferenceRequest {
    pub total: f64,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct PreferenceResponse {
    pub id: String,
    pub init_point: String,
}

/// POST /pagos/preference — create a payment intent for the customer.
///
/// The gateway call is opaque; confirmation arrives out-of-band and is
/// not handled here.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create_preference<L: AttemptLog + 'static>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
    Json(req): Json<CreatePreferenceRequest>,
) -> Result<(StatusCode, Json<PreferenceResponse>), ApiError> {
    let email = customer_email(&headers)?;

    let amount = Money::from_major(req.total);
    if amount.is_zero() || amount.is_negative() {
        return Err(ApiError::BadRequest(
            "El total del carrito es inválido".to_string(),
        ));
    }

    let description = req.description.as_deref().unwrap_or("Compra web");
    let intent = state
        .gateway
        .create_payment_intent(amount, description, email)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PreferenceResponse {
            id: intent.preference_id,
            init_point: intent.redirect_url,
        }),
    ))
}
