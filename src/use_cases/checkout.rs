use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use uuid::Uuid;

use crate::domain::{
    ApiError, Navigator, OrderReceipt, PaymentRedirect, PaymentStatus, PaymentStatusSource,
    ShippingDetails,
};
use crate::interface_adapters::gateway::{ApiGateway, ApiRequest, RequestOptions};
use crate::interface_adapters::protocol::{
    CreateOrderRequest, IDEMPOTENCY_KEY_HEADER, InitiatePaymentRequest, PaymentStatusResponse,
};

// One checkout attempt. The key is minted once and reused for every retry of the
// same attempt, so the backend can collapse duplicate order submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutAttempt {
    idempotency_key: String,
}

impl CheckoutAttempt {
    pub fn start() -> Self {
        Self {
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }

    // Continue an attempt whose key was saved earlier (e.g. across a crash).
    pub fn resume(idempotency_key: impl Into<String>) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
        }
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }
}

// Places the order, hands the user to the payment provider and reads back the outcome.
#[derive(Clone)]
pub struct CheckoutUseCase {
    pub gateway: Arc<ApiGateway>,
    pub navigator: Arc<dyn Navigator>,
}

impl CheckoutUseCase {
    #[tracing::instrument(name = "place_order", skip_all, fields(key = %attempt.idempotency_key()))]
    pub async fn place_order(
        &self,
        attempt: &CheckoutAttempt,
        shipping: &ShippingDetails,
    ) -> Result<OrderReceipt, ApiError> {
        let receipt: OrderReceipt = self
            .gateway
            .post(
                "/orders",
                &CreateOrderRequest {
                    shipping_address: shipping,
                },
                RequestOptions::default().header(IDEMPOTENCY_KEY_HEADER, attempt.idempotency_key()),
            )
            .await?;

        tracing::info!(order_id = %receipt.order_id, "order created");
        Ok(receipt)
    }

    // Ask the backend for a payment link and send the user there.
    pub async fn begin_payment(&self, order_id: &str) -> Result<PaymentRedirect, ApiError> {
        let redirect: PaymentRedirect = self
            .gateway
            .post(
                "/payments/initiate",
                &InitiatePaymentRequest { order_id },
                RequestOptions::default(),
            )
            .await?;

        tracing::info!(%order_id, "redirecting to payment provider");
        self.navigator.redirect(&redirect.payment_url);
        Ok(redirect)
    }

    pub async fn payment_status(&self, order_id: &str) -> Result<PaymentStatus, ApiError> {
        let response: PaymentStatusResponse = self
            .gateway
            .send(ApiRequest::new(Method::GET, "/payments").segment(order_id))
            .await?;
        Ok(response.status)
    }
}

#[async_trait]
impl PaymentStatusSource for CheckoutUseCase {
    async fn payment_status(&self, order_id: &str) -> Result<PaymentStatus, ApiError> {
        CheckoutUseCase::payment_status(self, order_id).await
    }
}

// Poll until the payment settles or the attempts run out (then the last pending is returned).
// Errors end the wait immediately; the caller decides whether to poll again.
pub async fn wait_for_payment<S>(
    source: &S,
    order_id: &str,
    interval: Duration,
    max_attempts: u32,
) -> Result<PaymentStatus, ApiError>
where
    S: PaymentStatusSource + ?Sized,
{
    let attempts = max_attempts.max(1);
    let mut status = PaymentStatus::Pending;

    for attempt in 1..=attempts {
        status = source.payment_status(order_id).await?;
        tracing::debug!(%order_id, attempt, ?status, "payment status polled");
        if status.is_settled() {
            break;
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Ok(status)
}
