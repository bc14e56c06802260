//! sea-orm entities for the shop database.

pub mod order_items;
pub mod orders;
pub mod outbox_events;
pub mod products;
pub mod users;
