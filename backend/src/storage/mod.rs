//! # Storage Module
//!
//! Handles all data persistence for Tiny Wins.
//!
//! The domain layer only sees the traits in [`traits`]. Two backends are
//! provided:
//!
//! - **memory**: flat id-keyed collections held in process, used for tests and
//!   as a scratch store in front ends that sync elsewhere
//! - **csv**: a data directory of per-child CSV logs and YAML records
//!
//! ## Design Principles
//!
//! - **Repository Pattern**: Clean separation between domain and data access
//! - **Arena Layout**: Entities reference each other by id, never by containment
//! - **Append-only Logs**: Events and reward history are never rewritten in place

pub mod csv;
pub mod memory;
pub mod traits;

pub use self::csv::CsvConnection;
pub use memory::MemoryConnection;
pub use traits::*;
