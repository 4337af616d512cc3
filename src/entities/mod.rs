//! Entity types exchanged with the inventory and gate pass stores

pub mod gate_pass;
pub mod product;
