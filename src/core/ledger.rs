//! Selection ledger - products and quantities picked for one gate pass
//!
//! The ledger enforces the one hard invariant of the workflow: for every
//! entry, `1 <= selected_quantity <= product.quantity` against the stock
//! snapshot passed in at the time of the addition. Re-selecting a product
//! merges into its existing entry instead of overwriting it.

use crate::core::error::GatePassError;
use crate::entities::product::Product;

/// One product picked for transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    /// Stock snapshot from the most recent addition
    pub product: Product,
    pub selected_quantity: u32,
}

impl SelectionEntry {
    pub fn key(&self) -> &str {
        &self.product.key
    }
}

/// Ordered working set of selections, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionLedger {
    entries: Vec<SelectionEntry>,
}

impl SelectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `requested` units of `product`, merging with any existing entry
    ///
    /// `product` should be the freshest available snapshot; its `quantity` is
    /// the cap. On error the ledger is unchanged.
    pub fn add_selection(&mut self, product: &Product, requested: u32) -> Result<(), GatePassError> {
        if requested == 0 {
            return Err(GatePassError::InvalidQuantity {
                input: requested.to_string(),
            });
        }

        let existing = self.entries.iter().position(|e| e.key() == product.key);
        let already = existing
            .map(|i| u64::from(self.entries[i].selected_quantity))
            .unwrap_or(0);
        let merged = already + u64::from(requested);

        if merged > u64::from(product.quantity) {
            return Err(GatePassError::QuantityExceedsStock {
                product_id: product.product_id.clone(),
                requested: merged,
                available: product.quantity,
            });
        }

        // merged <= product.quantity, so it fits in u32
        let merged = merged as u32;
        match existing {
            Some(i) => {
                let entry = &mut self.entries[i];
                entry.selected_quantity = merged;
                entry.product = product.clone();
            }
            None => self.entries.push(SelectionEntry {
                product: product.clone(),
                selected_quantity: merged,
            }),
        }
        Ok(())
    }

    /// Parse user input and add it; text that is not a positive integer is rejected
    pub fn add_selection_str(&mut self, product: &Product, input: &str) -> Result<(), GatePassError> {
        let requested = parse_quantity(input)?;
        self.add_selection(product, requested)
    }

    /// Drop the entry for `product_key`; unknown keys are ignored
    pub fn remove_selection(&mut self, product_key: &str) {
        self.entries.retain(|e| e.key() != product_key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn get(&self, product_key: &str) -> Option<&SelectionEntry> {
        self.entries.iter().find(|e| e.key() == product_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Units selected across all entries
    pub fn total_quantity(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| u64::from(e.selected_quantity))
            .sum()
    }
}

/// Parse a quantity typed by the user
pub fn parse_quantity(input: &str) -> Result<u32, GatePassError> {
    match input.trim().parse::<u32>() {
        Ok(q) if q > 0 => Ok(q),
        _ => Err(GatePassError::InvalidQuantity {
            input: input.to_string(),
        }),
    }
}
