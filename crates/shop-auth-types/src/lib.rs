//! Auth types shared across shop services.
//!
//! Provides JWT validation (issuing behind the `issuer` feature) and the
//! `MaybeCaller` bearer-token extractor.

pub mod identity;
pub mod token;
