//! Outbox event contracts between the API service and the mailer.

use serde::{Deserialize, Serialize};

use crate::id::OrderId;

/// `outbox_events.kind` for an order confirmation email.
pub const ORDER_CONFIRMATION_EVENT: &str = "order_confirmation";

/// Payload of an [`ORDER_CONFIRMATION_EVENT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub email: String,
}

impl OrderConfirmation {
    pub fn idempotency_key(&self) -> String {
        format!("{ORDER_CONFIRMATION_EVENT}:{}", self.order_id)
    }
}
