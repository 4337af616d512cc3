//! Core module - the gate pass authoring workflow and configuration

pub mod assembler;
pub mod config;
pub mod error;
pub mod ledger;

pub use assembler::{build_submission, validate, Committed, GatePassSession, SessionState};
pub use config::Config;
pub use error::GatePassError;
pub use ledger::{parse_quantity, SelectionEntry, SelectionLedger};
