//! Sale creation and project reporting endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use checkout::{AdminSaleRequest, CheckoutError, Directory};
use chrono::{Duration, Utc};
use domain::{Money, PaymentType, Sale, SaleItem, SaleState};
use serde::{Deserialize, Serialize};
use stores::{AttemptLog, SaleStore};

use crate::error::ApiError;
use crate::routes::{AppState, admin_user, customer_email};

/// Reporting window for best-selling products.
const TOP_PRODUCTS_DAYS: i64 = 30;
const TOP_PRODUCTS_LIMIT: usize = 4;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub dni: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub items: Vec<SaleItemRequest>,
    #[serde(rename = "estado", default)]
    pub state: Option<String>,
    #[serde(rename = "tipoPago")]
    pub payment_type: String,
    #[serde(rename = "totalVenta", default)]
    pub declared_total: Option<f64>,
}

#[derive(Deserialize)]
pub struct SaleItemRequest {
    #[serde(rename = "producto_id")]
    pub product_id: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precio")]
    pub unit_price: f64,
}

// -- Response types --

#[derive(Serialize)]
pub struct SaleResponse {
    #[serde(rename = "nro")]
    pub number: u64,
    #[serde(rename = "nfac")]
    pub invoice_code: String,
    #[serde(rename = "cliente", skip_serializing_if = "Option::is_none")]
    pub client: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub items: Vec<SaleItemResponse>,
    pub total: f64,
    #[serde(rename = "proyecto")]
    pub project_id: String,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "tipoPago")]
    pub payment_type: String,
    #[serde(rename = "origen")]
    pub origin: String,
    #[serde(rename = "fecha")]
    pub created_at: String,
}

#[derive(Serialize)]
pub struct SaleItemResponse {
    #[serde(rename = "producto_id")]
    pub product_id: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precio")]
    pub unit_price: f64,
}

#[derive(Serialize)]
pub struct SalesTotalResponse {
    pub total: f64,
}

#[derive(Serialize)]
pub struct TopProductResponse {
    #[serde(rename = "producto_id")]
    pub product_id: String,
    #[serde(rename = "cantidad")]
    pub quantity: u64,
}

impl From<Sale> for SaleResponse {
    fn from(sale: Sale) -> Self {
        SaleResponse {
            number: sale.number,
            invoice_code: sale.invoice_code,
            client: sale.client.map(|c| c.as_i64()),
            email: sale.email,
            items: sale
                .items
                .into_iter()
                .map(|item| SaleItemResponse {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price.as_major(),
                })
                .collect(),
            total: sale.total.as_major(),
            project_id: sale.project_id.to_string(),
            state: sale.state.as_str().to_string(),
            payment_type: sale.payment_type.as_str().to_string(),
            origin: sale.origin.as_str().to_string(),
            created_at: sale.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /ventas — settle an in-store sale submitted by an operator.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<L: AttemptLog + 'static>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
    Json(req): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), ApiError> {
    let username = admin_user(&headers)?;

    let sale_state = match req.state {
        Some(ref s) => Some(
            SaleState::parse(s)
                .ok_or_else(|| ApiError::Checkout(CheckoutError::InvalidSaleState(s.clone())))?,
        ),
        None => None,
    };
    let items: Vec<SaleItem> = req
        .items
        .into_iter()
        .map(|item| SaleItem {
            product_id: item.product_id,
            unit_price: Money::from_major(item.unit_price),
            quantity: item.quantity,
        })
        .collect();

    let outcome = state
        .coordinator
        .checkout_admin(
            username,
            AdminSaleRequest {
                dni: req.dni,
                email: req.email,
                items,
                state: sale_state,
                payment_type: PaymentType::new(req.payment_type),
                declared_total: req.declared_total.map(Money::from_major),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(outcome.sale.into())))
}

/// POST /ventas/web — settle the customer's pending cart.
#[tracing::instrument(skip(state, headers))]
pub async fn create_web<L: AttemptLog + 'static>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<SaleResponse>), ApiError> {
    let email = customer_email(&headers)?;
    let outcome = state.coordinator.checkout_web(email).await?;
    Ok((StatusCode::CREATED, Json(outcome.sale.into())))
}

/// GET /ventas — the operator's project sales, newest first.
#[tracing::instrument(skip(state, headers))]
pub async fn list<L: AttemptLog + 'static>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<SaleResponse>>, ApiError> {
    let project_id = admin_project(&state, &headers).await?;
    let sales = state.sales.list_for_project(&project_id).await?;
    Ok(Json(sales.into_iter().map(SaleResponse::from).collect()))
}

/// GET /ventas/total — total over the project's collected sales.
#[tracing::instrument(skip(state, headers))]
pub async fn total<L: AttemptLog + 'static>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
) -> Result<Json<SalesTotalResponse>, ApiError> {
    let project_id = admin_project(&state, &headers).await?;
    let total = state.sales.paid_total(&project_id).await?;
    Ok(Json(SalesTotalResponse {
        total: total.as_major(),
    }))
}

/// GET /ventas/top — best-selling products over the last 30 days.
#[tracing::instrument(skip(state, headers))]
pub async fn top<L: AttemptLog + 'static>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<TopProductResponse>>, ApiError> {
    let project_id = admin_project(&state, &headers).await?;
    let since = Utc::now() - Duration::days(TOP_PRODUCTS_DAYS);
    let ranked = state
        .sales
        .top_products(&project_id, since, TOP_PRODUCTS_LIMIT)
        .await?;
    Ok(Json(
        ranked
            .into_iter()
            .map(|(product_id, quantity)| TopProductResponse {
                product_id,
                quantity,
            })
            .collect(),
    ))
}

async fn admin_project<L: AttemptLog>(
    state: &AppState<L>,
    headers: &HeaderMap,
) -> Result<common::ProjectId, ApiError> {
    let username = admin_user(headers)?;
    state
        .directory
        .resolve_project_for_admin(username)
        .await?
        .ok_or(ApiError::Checkout(CheckoutError::NoProjectAssigned))
}
