//! Gate pass assembler - validation, payload construction and commit
//!
//! [`GatePassSession`] owns one authoring session (ledger + metadata) and
//! walks it through the states below:
//!
//! ```text
//! Idle <-> Selecting -> ReadyToSubmit -> Submitted
//!                            ^    |
//!                            |    v
//!                        SubmissionFailed
//! ```
//!
//! `commit` borrows the session mutably for the whole create/refresh
//! sequence, so nothing else can touch the ledger or start a second
//! submission while one is in flight.

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use std::fmt::Write as _;
use tracing::{debug, info, warn};

use crate::core::config::DEFAULT_DATE_FORMAT;
use crate::core::error::GatePassError;
use crate::core::ledger::SelectionLedger;
use crate::entities::gate_pass::{GatePassLine, GatePassMetadata, GatePassRecord, GatePassSubmission};
use crate::entities::product::Product;
use crate::store::{GatePassStore, InventoryStore};

/// Check that a ledger and its metadata are ready to submit
///
/// Checks run in a fixed order: selection, destination, preparer.
pub fn validate(ledger: &SelectionLedger, metadata: &GatePassMetadata) -> Result<(), GatePassError> {
    if ledger.is_empty() {
        return Err(GatePassError::EmptySelection);
    }
    if metadata.destination.trim().is_empty() {
        return Err(GatePassError::MissingDestination);
    }
    if metadata.prepared_by.trim().is_empty() {
        return Err(GatePassError::MissingPreparer);
    }
    Ok(())
}

/// Project the ledger and metadata into the store's submission shape
///
/// Does not validate; call [`validate`] first.
pub fn build_submission(
    ledger: &SelectionLedger,
    metadata: &GatePassMetadata,
    current_date: NaiveDate,
    date_format: &str,
) -> GatePassSubmission {
    GatePassSubmission {
        date: format_date(current_date, date_format),
        to: metadata.destination.trim().to_string(),
        products: ledger
            .entries()
            .iter()
            .map(|entry| GatePassLine {
                product_id: entry.product.product_id.clone(),
                name: entry.product.name.clone(),
                transport: entry.product.transport,
                description: entry.product.description.clone(),
                selected_quantity: entry.selected_quantity,
                product_type: entry.product.product_type,
                remarks: entry.product.remarks.clone(),
            })
            .collect(),
        prepared_by: metadata.prepared_by.trim().to_string(),
        checked_by: metadata.checked_by.trim().to_string(),
        authorized_by: metadata.authorized_by.trim().to_string(),
    }
}

/// Render a calendar date, falling back to the default format if `format` is invalid
pub fn format_date(date: NaiveDate, format: &str) -> String {
    let valid = !StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    let format = if valid { format } else { DEFAULT_DATE_FORMAT };

    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        out.clear();
        let _ = write!(out, "{}", date.format(DEFAULT_DATE_FORMAT));
    }
    out
}

/// Where an authoring session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Selecting,
    ReadyToSubmit,
    Submitted,
    SubmissionFailed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Selecting => write!(f, "selecting"),
            SessionState::ReadyToSubmit => write!(f, "ready"),
            SessionState::Submitted => write!(f, "submitted"),
            SessionState::SubmissionFailed => write!(f, "submission_failed"),
        }
    }
}

/// Result of a successful commit
#[derive(Debug, Clone)]
pub struct Committed {
    /// Authoritative record returned by the store
    pub record: GatePassRecord,

    /// Inventory after the commit, or `None` if the refresh failed
    pub inventory: Option<Vec<Product>>,

    /// Gate pass history after the commit, or `None` if the refresh failed
    pub history: Option<Vec<GatePassRecord>>,
}

/// One in-progress gate pass
#[derive(Debug, Clone)]
pub struct GatePassSession {
    ledger: SelectionLedger,
    metadata: GatePassMetadata,
    state: SessionState,
    date_format: String,
}

impl Default for GatePassSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GatePassSession {
    pub fn new() -> Self {
        Self {
            ledger: SelectionLedger::new(),
            metadata: GatePassMetadata::default(),
            state: SessionState::Idle,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    pub fn ledger(&self) -> &SelectionLedger {
        &self.ledger
    }

    pub fn metadata(&self) -> &GatePassMetadata {
        &self.metadata
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Replace the shipment metadata
    pub fn set_metadata(&mut self, metadata: GatePassMetadata) {
        self.metadata = metadata;
        self.settle();
    }

    pub fn add_selection(&mut self, product: &Product, requested: u32) -> Result<(), GatePassError> {
        self.ledger.add_selection(product, requested)?;
        self.settle();
        Ok(())
    }

    pub fn remove_selection(&mut self, product_key: &str) {
        self.ledger.remove_selection(product_key);
        self.settle();
    }

    /// Abandon the session: empty ledger, blank metadata
    pub fn cancel(&mut self) {
        self.ledger.clear();
        self.metadata.clear();
        self.state = SessionState::Idle;
    }

    pub fn validate(&mut self) -> Result<(), GatePassError> {
        validate(&self.ledger, &self.metadata)?;
        self.state = SessionState::ReadyToSubmit;
        Ok(())
    }

    /// Validate and build the payload without submitting it
    pub fn submission(&mut self, today: NaiveDate) -> Result<GatePassSubmission, GatePassError> {
        self.validate()?;
        Ok(build_submission(
            &self.ledger,
            &self.metadata,
            today,
            &self.date_format,
        ))
    }

    /// Submit the gate pass and reconcile local state
    ///
    /// On success the ledger and metadata are cleared and fresh inventory and
    /// history snapshots are returned. On failure nothing local changes and
    /// the caller may retry with the same session.
    pub fn commit<G, I>(
        &mut self,
        gate_passes: &G,
        inventory: &I,
        today: NaiveDate,
    ) -> Result<Committed, GatePassError>
    where
        G: GatePassStore + ?Sized,
        I: InventoryStore + ?Sized,
    {
        let submission = self.submission(today)?;
        debug!(
            lines = submission.products.len(),
            to = %submission.to,
            "submitting gate pass"
        );

        let record = match gate_passes.create_gate_pass(&submission) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "gate pass submission failed");
                self.state = SessionState::SubmissionFailed;
                return Err(GatePassError::SubmissionFailed(e));
            }
        };
        info!(number = %record.gate_pass_number, to = %record.to, "gate pass created");

        let inventory = inventory
            .list_products()
            .map_err(|e| warn!(error = %e, "inventory refresh failed"))
            .ok();
        let history = gate_passes
            .list_gate_passes()
            .map_err(|e| warn!(error = %e, "gate pass history refresh failed"))
            .ok();

        self.ledger.clear();
        self.metadata.clear();
        self.state = SessionState::Submitted;

        Ok(Committed {
            record,
            inventory,
            history,
        })
    }

    fn settle(&mut self) {
        self.state = if self.ledger.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Selecting
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::product::{ProductDraft, ProductType, TransportMode};
    use crate::store::MemoryStore;

    fn product(code: &str, quantity: u32) -> Product {
        Product {
            key: format!("key-{}", code),
            product_id: code.to_string(),
            name: format!("Item {}", code),
            transport: TransportMode::Rail,
            description: "198 kV surge arrester".to_string(),
            quantity,
            from: "Kakinada".to_string(),
            to: "Vemagiri GIS".to_string(),
            product_type: ProductType::Electronics,
            remarks: "fragile".to_string(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 5).unwrap()
    }

    fn seeded_store() -> (MemoryStore, Product) {
        let store = MemoryStore::new();
        let p = store
            .create_product(&ProductDraft::new("Surge Arrester", 10, "Kakinada", "Vemagiri GIS"))
            .unwrap();
        (store, p)
    }

    #[test]
    fn test_validate_empty_selection_first() {
        let ledger = SelectionLedger::new();
        for meta in [
            GatePassMetadata::default(),
            GatePassMetadata::new("Hyderabad GIS", "A. Rao"),
        ] {
            assert!(matches!(
                validate(&ledger, &meta),
                Err(GatePassError::EmptySelection)
            ));
        }
    }

    #[test]
    fn test_validate_required_metadata() {
        let mut ledger = SelectionLedger::new();
        ledger.add_selection(&product("P1", 5), 1).unwrap();

        let meta = GatePassMetadata::new("   ", "A. Rao");
        assert!(matches!(
            validate(&ledger, &meta),
            Err(GatePassError::MissingDestination)
        ));

        let meta = GatePassMetadata::new("Hyderabad GIS", "");
        assert!(matches!(
            validate(&ledger, &meta),
            Err(GatePassError::MissingPreparer)
        ));

        // Checker and authorizer are optional
        let meta = GatePassMetadata::new("Hyderabad GIS", "A. Rao");
        assert!(validate(&ledger, &meta).is_ok());
    }

    #[test]
    fn test_build_submission_carries_quantities() {
        let mut ledger = SelectionLedger::new();
        ledger.add_selection(&product("P1", 10), 4).unwrap();
        let meta = GatePassMetadata::new("Hyderabad GIS", "A. Rao");

        assert!(validate(&ledger, &meta).is_ok());
        let submission = build_submission(&ledger, &meta, date(), DEFAULT_DATE_FORMAT);

        assert_eq!(submission.products.len(), 1);
        let line = &submission.products[0];
        assert_eq!(line.selected_quantity, 4);
        assert_eq!(line.product_id, "P1");
        assert_eq!(line.transport, TransportMode::Rail);
        assert_eq!(line.remarks, "fragile");
        assert_eq!(submission.to, "Hyderabad GIS");
        assert_eq!(submission.prepared_by, "A. Rao");
        assert_eq!(submission.checked_by, "");
        assert_eq!(submission.date, "5/10/2026");

        // Store keys never leave the client
        let json = serde_json::to_string(&submission).unwrap();
        assert!(!json.contains("key-P1"));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date(), "%Y-%m-%d"), "2026-10-05");
        assert_eq!(format_date(date(), "%d/%m/%Y"), "05/10/2026");
        // Broken format strings fall back instead of panicking
        assert_eq!(format_date(date(), "%Q"), "5/10/2026");
    }

    #[test]
    fn test_session_states() {
        let mut session = GatePassSession::new();
        assert_eq!(session.state(), SessionState::Idle);

        let p = product("P1", 10);
        session.add_selection(&p, 2).unwrap();
        assert_eq!(session.state(), SessionState::Selecting);

        session.remove_selection(&p.key);
        assert_eq!(session.state(), SessionState::Idle);

        session.add_selection(&p, 2).unwrap();
        assert!(session.validate().is_err());
        assert_eq!(session.state(), SessionState::Selecting);

        session.set_metadata(GatePassMetadata::new("Hyderabad GIS", "A. Rao"));
        session.validate().unwrap();
        assert_eq!(session.state(), SessionState::ReadyToSubmit);

        session.cancel();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.ledger().is_empty());
        assert_eq!(session.metadata(), &GatePassMetadata::default());
    }

    #[test]
    fn test_commit_clears_session_and_refreshes() {
        let (store, p) = seeded_store();
        let mut session = GatePassSession::new();
        session.add_selection(&p, 4).unwrap();
        session.set_metadata(GatePassMetadata::new("Hyderabad GIS", "A. Rao"));

        let committed = session.commit(&store, &store, date()).unwrap();
        assert_eq!(committed.record.gate_pass_number, "GP-0001");
        assert_eq!(committed.record.products[0].selected_quantity, 4);
        assert_eq!(committed.inventory.unwrap()[0].quantity, 6);
        assert_eq!(committed.history.unwrap().len(), 1);

        assert_eq!(session.state(), SessionState::Submitted);
        assert!(session.ledger().is_empty());
        assert_eq!(session.metadata(), &GatePassMetadata::default());
    }

    #[test]
    fn test_failed_commit_keeps_session_for_retry() {
        let (store, p) = seeded_store();
        let mut session = GatePassSession::new();
        session.add_selection(&p, 4).unwrap();
        let meta = GatePassMetadata::new("Hyderabad GIS", "A. Rao").with_checked_by("B. Devi");
        session.set_metadata(meta.clone());
        let ledger_before = session.ledger().clone();

        store.fail_next_creates(1);
        let err = session.commit(&store, &store, date()).unwrap_err();
        assert!(matches!(err, GatePassError::SubmissionFailed(_)));
        assert_eq!(err.kind(), "submission_failed");
        assert_eq!(session.state(), SessionState::SubmissionFailed);
        assert_eq!(session.ledger(), &ledger_before);
        assert_eq!(session.metadata(), &meta);
        assert_eq!(store.stock_of(&p.product_id), Some(10));

        // Same, unmodified session succeeds on retry
        let committed = session.commit(&store, &store, date()).unwrap();
        assert_eq!(committed.record.checked_by, "B. Devi");
        assert!(session.ledger().is_empty());
        assert_eq!(store.stock_of(&p.product_id), Some(6));
    }

    #[test]
    fn test_commit_rejects_invalid_session_without_calling_store() {
        let (store, _) = seeded_store();
        let mut session = GatePassSession::new();
        store.fail_next_creates(1);

        assert!(matches!(
            session.commit(&store, &store, date()),
            Err(GatePassError::EmptySelection)
        ));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(store.list_gate_passes().unwrap().is_empty());
    }
}
