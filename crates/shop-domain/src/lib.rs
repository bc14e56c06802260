//! Domain types shared across the shop services.
//!
//! Pure types with no framework dependencies. Import in `usecase/` and `domain/`
//! layers; `infra/` converts to and from these at the storage boundary.

pub mod event;
pub mod id;
pub mod lookup;
pub mod order;
pub mod pagination;
pub mod product;
