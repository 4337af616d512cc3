//! Errors raised while authoring a gate pass
//!
//! Every variant is recoverable: the ledger and metadata are left exactly as
//! they were before the failing call.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum GatePassError {
    #[error("Please enter a valid quantity (got '{input}')")]
    InvalidQuantity { input: String },

    #[error("Requested quantity {requested} of {product_id} exceeds available stock ({available})")]
    QuantityExceedsStock {
        product_id: String,
        requested: u64,
        available: u32,
    },

    #[error("Select at least one product for transport")]
    EmptySelection,

    #[error("Destination is required")]
    MissingDestination,

    #[error("Prepared-by is required")]
    MissingPreparer,

    #[error("Gate pass submission failed: {0}")]
    SubmissionFailed(#[source] StoreError),
}

impl GatePassError {
    /// Short stable name of the condition, for logs and scripting
    pub fn kind(&self) -> &'static str {
        match self {
            GatePassError::InvalidQuantity { .. } => "invalid_quantity",
            GatePassError::QuantityExceedsStock { .. } => "quantity_exceeds_stock",
            GatePassError::EmptySelection => "empty_selection",
            GatePassError::MissingDestination => "missing_destination",
            GatePassError::MissingPreparer => "missing_preparer",
            GatePassError::SubmissionFailed(_) => "submission_failed",
        }
    }
}
