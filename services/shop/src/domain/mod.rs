pub mod filter;
pub mod money;
pub mod policy;
pub mod repository;
pub mod types;
