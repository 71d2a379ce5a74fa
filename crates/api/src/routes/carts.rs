//! Pending-cart endpoints and the customer purchase history.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use checkout::{CheckoutError, Directory};
use domain::{Cart, CartItem, Money};
use stores::{AttemptLog, CartStore, SaleStore};

use crate::error::ApiError;
use crate::routes::sales::SaleResponse;
use crate::routes::{AppState, customer_email};
use serde::{Deserialize, Serialize};

// -- Request types --

#[derive(Deserialize)]
pub struct UpdateCartRequest {
    pub items: Vec<CartItemRequest>,
    pub total: f64,
}

#[derive(Deserialize)]
pub struct CartItemRequest {
    #[serde(rename = "producto_id")]
    pub product_id: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precio")]
    pub unit_price: f64,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub email: String,
    #[serde(rename = "proyecto")]
    pub project_id: String,
    pub items: Vec<CartItemResponse>,
    pub total: f64,
    #[serde(rename = "estado")]
    pub state: String,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    #[serde(rename = "producto_id")]
    pub product_id: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precio")]
    pub unit_price: f64,
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        CartResponse {
            email: cart.customer_email,
            project_id: cart.project_id.to_string(),
            items: cart
                .items
                .into_iter()
                .map(|item| CartItemResponse {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price.as_major(),
                    name: item.name,
                })
                .collect(),
            total: cart.total.as_major(),
            state: cart.state.as_str().to_string(),
        }
    }
}

// -- Handlers --

/// POST /carrito — get or create the customer's pending cart.
#[tracing::instrument(skip(state, headers))]
pub async fn create<L: AttemptLog + 'static>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let email = customer_email(&headers)?;
    let project_id = state
        .directory
        .resolve_project_for_customer(email)
        .await?
        .ok_or(ApiError::Checkout(CheckoutError::NoProjectAssigned))?;

    let (cart, created) = state.carts.get_or_create(email, &project_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(cart.into())))
}

/// PUT /carrito — replace the pending cart's items and total.
#[tracing::instrument(skip(state, headers, req))]
pub async fn update<L: AttemptLog + 'static>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
    Json(req): Json<UpdateCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let email = customer_email(&headers)?;
    let project_id = state
        .directory
        .resolve_project_for_customer(email)
        .await?
        .ok_or(ApiError::Checkout(CheckoutError::NoProjectAssigned))?;

    let items: Vec<CartItem> = req
        .items
        .into_iter()
        .map(|item| CartItem {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: Money::from_major(item.unit_price),
            name: item.name,
        })
        .collect();

    let cart = state
        .carts
        .replace_contents(email, &project_id, items, Money::from_major(req.total))
        .await?;
    Ok(Json(cart.into()))
}

/// GET /carrito — fetch the customer's pending cart.
#[tracing::instrument(skip(state, headers))]
pub async fn get<L: AttemptLog + 'static>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
) -> Result<Json<CartResponse>, ApiError> {
    let email = customer_email(&headers)?;
    let project_id = state
        .directory
        .resolve_project_for_customer(email)
        .await?
        .ok_or(ApiError::Checkout(CheckoutError::NoProjectAssigned))?;

    let cart = state
        .carts
        .find_pending(email, &project_id)
        .await?
        .ok_or(ApiError::Checkout(CheckoutError::CartNotFound))?;
    Ok(Json(cart.into()))
}

/// GET /compras — the customer's purchase history, newest first.
#[tracing::instrument(skip(state, headers))]
pub async fn purchases<L: AttemptLog + 'static>(
    State(state): State<Arc<AppState<L>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<SaleResponse>>, ApiError> {
    let email = customer_email(&headers)?;
    let sales = state.sales.list_for_email(email).await?;
    Ok(Json(sales.into_iter().map(SaleResponse::from).collect()))
}
