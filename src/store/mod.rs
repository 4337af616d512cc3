//! External stores - the inventory and gate pass backends
//!
//! The core never talks HTTP directly; it is written against the two traits
//! below. [`HttpStore`] implements both against the REST backend and
//! [`MemoryStore`] implements both in-process.

pub mod http;
pub mod memory;

use thiserror::Error;

use crate::entities::gate_pass::{GatePassRecord, GatePassSubmission};
use crate::entities::product::{Product, ProductDraft};

pub use http::HttpStore;
pub use memory::MemoryStore;

/// Errors raised by a store call
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store rejected the request: {0}")]
    Rejected(String),

    #[error("Invalid API URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Source of truth for products
pub trait InventoryStore {
    /// Current stock snapshot
    fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    fn create_product(&self, draft: &ProductDraft) -> Result<Product, StoreError>;

    fn delete_product(&self, key: &str) -> Result<(), StoreError>;

    fn update_quantity(&self, key: &str, quantity: u32) -> Result<(), StoreError>;
}

/// Persists gate passes and assigns their numbers
pub trait GatePassStore {
    fn create_gate_pass(
        &self,
        submission: &GatePassSubmission,
    ) -> Result<GatePassRecord, StoreError>;

    fn list_gate_passes(&self) -> Result<Vec<GatePassRecord>, StoreError>;
}
