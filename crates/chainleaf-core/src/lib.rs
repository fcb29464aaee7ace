//! Core types and trait definitions for the ChainLeaf traceability store.
//!
//! No HTTP or database code lives here; the storage and API crates build on
//! these types.

pub mod batch;
pub mod error;
pub mod farm;
pub mod ledger;
pub mod store;
pub mod user;
pub mod verify;

pub use error::{DomainError, Error, Result};
