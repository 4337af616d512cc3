//! In-process store for tests and library callers without a backend
//!
//! Mirrors the backend closely enough for the authoring workflow: creating a
//! gate pass draws the shipped quantities down from stock, and gate pass
//! numbers and timestamps are assigned here, never by the caller.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::entities::gate_pass::{GatePassRecord, GatePassSubmission};
use crate::entities::product::{Product, ProductDraft};
use crate::store::{GatePassStore, InventoryStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    products: Vec<Product>,
    gate_passes: Vec<GatePassRecord>,
    next_key: u64,
    next_product: u32,
    next_gate_pass: u32,
    /// Number of upcoming gate pass creates that should fail
    pending_failures: usize,
    fixed_time: Option<DateTime<Utc>>,
}

impl MemoryState {
    fn next_key(&mut self) -> String {
        self.next_key += 1;
        format!("mem-{:06}", self.next_key)
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_time.unwrap_or_else(Utc::now)
    }
}

/// Both stores backed by a mutex-guarded vector
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with products, assigning keys and codes where missing
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products: Vec<Product> = products.into_iter().collect();
        let store = Self::new();
        {
            let mut state = store.lock();
            // Generated codes continue after the highest seeded PRD-NNNN
            state.next_product = products
                .iter()
                .filter_map(|p| generated_code_number(&p.product_id))
                .max()
                .unwrap_or(0);
            for mut product in products {
                if product.key.is_empty() {
                    product.key = state.next_key();
                }
                if product.product_id.is_empty() {
                    state.next_product += 1;
                    product.product_id = format!("PRD-{:04}", state.next_product);
                }
                state.products.push(product);
            }
        }
        store
    }

    /// Make the next `count` gate pass creates fail with a rejection
    pub fn fail_next_creates(&self, count: usize) {
        self.lock().pending_failures = count;
    }

    /// Pin the clock used for `generatedAt`
    pub fn set_time(&self, time: DateTime<Utc>) {
        self.lock().fixed_time = Some(time);
    }

    /// Current stock for a product code
    pub fn stock_of(&self, product_id: &str) -> Option<u32> {
        self.lock()
            .products
            .iter()
            .find(|p| p.product_id == product_id)
            .map(|p| p.quantity)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Sequence number of a code in the `PRD-NNNN` form this store hands out
fn generated_code_number(code: &str) -> Option<u32> {
    code.strip_prefix("PRD-")?.parse().ok()
}

impl InventoryStore for MemoryStore {
    fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.lock().products.clone())
    }

    fn create_product(&self, draft: &ProductDraft) -> Result<Product, StoreError> {
        draft
            .validate()
            .map_err(|e| StoreError::Rejected(e.to_string()))?;

        let mut state = self.lock();
        state.next_product += 1;
        let product = Product {
            key: state.next_key(),
            product_id: format!("PRD-{:04}", state.next_product),
            name: draft.name.clone(),
            transport: draft.transport,
            description: draft.description.clone(),
            quantity: draft.quantity,
            from: draft.from.clone(),
            to: draft.to.clone(),
            product_type: draft.product_type,
            remarks: draft.remarks.clone(),
        };
        state.products.push(product.clone());
        Ok(product)
    }

    fn delete_product(&self, key: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        let before = state.products.len();
        state.products.retain(|p| p.key != key);
        if state.products.len() == before {
            return Err(StoreError::NotFound(format!("products/{}", key)));
        }
        Ok(())
    }

    fn update_quantity(&self, key: &str, quantity: u32) -> Result<(), StoreError> {
        let mut state = self.lock();
        let product = state
            .products
            .iter_mut()
            .find(|p| p.key == key)
            .ok_or_else(|| StoreError::NotFound(format!("products/{}", key)))?;
        product.quantity = quantity;
        Ok(())
    }
}

impl GatePassStore for MemoryStore {
    fn create_gate_pass(
        &self,
        submission: &GatePassSubmission,
    ) -> Result<GatePassRecord, StoreError> {
        let mut state = self.lock();

        if state.pending_failures > 0 {
            state.pending_failures -= 1;
            return Err(StoreError::Rejected("simulated network error".to_string()));
        }

        // Lines naming the same product draw on the same stock.
        let mut totals: HashMap<&str, u64> = HashMap::new();
        for line in &submission.products {
            *totals.entry(line.product_id.as_str()).or_default() += u64::from(line.selected_quantity);
        }

        // Check every line before drawing anything down.
        for line in &submission.products {
            let available = state
                .products
                .iter()
                .find(|p| p.product_id == line.product_id)
                .map(|p| p.quantity)
                .ok_or_else(|| StoreError::NotFound(format!("products/{}", line.product_id)))?;
            let requested = totals.get(line.product_id.as_str()).copied().unwrap_or(0);
            if requested > u64::from(available) {
                return Err(StoreError::Rejected(format!(
                    "{} has only {} in stock, {} requested",
                    line.product_id, available, requested
                )));
            }
        }
        for (product_id, requested) in &totals {
            if let Some(product) = state
                .products
                .iter_mut()
                .find(|p| p.product_id == *product_id)
            {
                let requested = u32::try_from(*requested).unwrap_or(u32::MAX);
                product.quantity = product.quantity.saturating_sub(requested);
            }
        }

        state.next_gate_pass += 1;
        let record = GatePassRecord {
            key: state.next_key(),
            gate_pass_number: format!("GP-{:04}", state.next_gate_pass),
            date: submission.date.clone(),
            to: submission.to.clone(),
            products: submission.products.clone(),
            prepared_by: submission.prepared_by.clone(),
            checked_by: submission.checked_by.clone(),
            authorized_by: submission.authorized_by.clone(),
            generated_at: state.now(),
        };
        state.gate_passes.push(record.clone());
        Ok(record)
    }

    fn list_gate_passes(&self) -> Result<Vec<GatePassRecord>, StoreError> {
        Ok(self.lock().gate_passes.clone())
    }
}
