//! gatepass: substation inventory and gate pass toolkit
//!
//! Keeps a per-session selection of inventory items, validates it against
//! available stock, and turns it into gate passes recorded by a REST backend.

pub mod cli;
pub mod core;
pub mod entities;
pub mod render;
pub mod store;
