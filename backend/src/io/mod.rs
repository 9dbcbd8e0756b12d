//! # IO Module
//!
//! Boundary between the domain and any front end. Domain models never leave
//! the backend: this layer maps them to the serde DTOs in the `shared` crate
//! and offers the composite display queries a view needs in one call.
//!
//! - **mappers**: domain model ⇄ DTO conversion
//! - **queries**: `child_dashboard`, `log_moment`, `redeem` on [`Backend`](crate::Backend)

pub mod mappers;
pub mod queries;

pub use mappers::*;
