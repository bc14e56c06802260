//! Turns outbox events into emails.

use shop_domain::event::{ORDER_CONFIRMATION_EVENT, OrderConfirmation};

use crate::domain::types::{Email, PendingEvent};
use crate::error::MailerError;

pub const ORDER_CONFIRMATION_SUBJECT: &str = "Order Confirmation";

pub fn compose(event: &PendingEvent, from: &str) -> Result<Email, MailerError> {
    match event.kind.as_str() {
        ORDER_CONFIRMATION_EVENT => {
            let confirmation: OrderConfirmation = serde_json::from_value(event.payload.clone())?;
            Ok(order_confirmation(&confirmation, from))
        }
        other => Err(MailerError::UnknownKind(other.to_owned())),
    }
}

fn order_confirmation(confirmation: &OrderConfirmation, from: &str) -> Email {
    Email {
        from: from.to_owned(),
        to: confirmation.email.clone(),
        subject: ORDER_CONFIRMATION_SUBJECT.to_owned(),
        body: format!(
            "Your order #{} has been confirmed!",
            confirmation.order_id
        ),
    }
}
