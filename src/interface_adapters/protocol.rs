use serde::{Deserialize, Serialize};

use crate::domain::{PaymentStatus, Product, ShippingDetails};

// Request bodies and envelopes exchanged with the storefront backend.

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest<'a> {
    pub order_id: &'a str,
}

// `GET /payments/:orderId` response; only the status is consumed.
#[derive(Debug, Deserialize)]
pub struct PaymentStatusResponse {
    pub status: PaymentStatus,
}

// Error envelope returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// Header carrying the per-checkout-attempt idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest<'a> {
    pub shipping_address: &'a ShippingDetails,
}

// Product listings come either bare or wrapped in `{ "products": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductList {
    Bare(Vec<Product>),
    Wrapped { products: Vec<Product> },
}

impl ProductList {
    pub fn into_products(self) -> Vec<Product> {
        match self {
            ProductList::Bare(products) | ProductList::Wrapped { products } => products,
        }
    }
}
