//! REST client for the inventory backend
//!
//! Wraps the two resources the backend exposes:
//!
//! | Call | Route |
//! |------|-------|
//! | list products | `GET /products` |
//! | create product | `POST /products` |
//! | delete product | `DELETE /products/{id}` |
//! | update quantity | `PATCH /products/{id}/quantity` |
//! | list gate passes | `GET /gatepasses` |
//! | create gate pass | `POST /gatepasses` |

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::Config;
use crate::entities::gate_pass::{GatePassRecord, GatePassSubmission};
use crate::entities::product::{Product, ProductDraft};
use crate::store::{GatePassStore, InventoryStore, StoreError};

/// Blocking HTTP implementation of both stores
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: Url,
}

impl HttpStore {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url).map_err(|e| StoreError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl {
                url: base_url.to_string(),
                message: "URL cannot be used as a base".to_string(),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Create a client from the effective configuration
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        Self::new(&config.api_url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL by appending path segments to the base
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, StoreError> {
        let response = request.send()?;
        let status = response.status();
        debug!(%status, what, "store responded");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        warn!(%status, what, "store call failed");
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(what.to_string()));
        }
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, StoreError> {
        let url = self.endpoint(segments);
        debug!(%url, "GET");
        let what = segments.join("/");
        Ok(self.send(self.client.get(url), &what)?.json()?)
    }
}

impl InventoryStore for HttpStore {
    fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.get_json(&["products"])
    }

    fn create_product(&self, draft: &ProductDraft) -> Result<Product, StoreError> {
        let url = self.endpoint(&["products"]);
        debug!(%url, name = %draft.name, "POST");
        Ok(self
            .send(self.client.post(url).json(draft), "products")?
            .json()?)
    }

    fn delete_product(&self, key: &str) -> Result<(), StoreError> {
        let url = self.endpoint(&["products", key]);
        debug!(%url, "DELETE");
        self.send(self.client.delete(url), &format!("products/{}", key))?;
        Ok(())
    }

    fn update_quantity(&self, key: &str, quantity: u32) -> Result<(), StoreError> {
        let url = self.endpoint(&["products", key, "quantity"]);
        debug!(%url, quantity, "PATCH");
        let body = serde_json::json!({ "quantity": quantity });
        self.send(
            self.client.patch(url).json(&body),
            &format!("products/{}", key),
        )?;
        Ok(())
    }
}

impl GatePassStore for HttpStore {
    fn create_gate_pass(
        &self,
        submission: &GatePassSubmission,
    ) -> Result<GatePassRecord, StoreError> {
        let url = self.endpoint(&["gatepasses"]);
        debug!(%url, lines = submission.products.len(), to = %submission.to, "POST");
        Ok(self
            .send(self.client.post(url).json(submission), "gatepasses")?
            .json()?)
    }

    fn list_gate_passes(&self) -> Result<Vec<GatePassRecord>, StoreError> {
        self.get_json(&["gatepasses"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use crate::core::{GatePassError, GatePassSession, SessionState};
    use crate::entities::gate_pass::GatePassMetadata;
    use crate::entities::product::{ProductType, TransportMode};

    /// A request as it arrived on the wire
    struct Captured {
        request_line: String,
        body: String,
    }

    /// Answer exactly one request with a canned response
    ///
    /// Returns the API base URL and a handle yielding the captured request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/api", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut content_length = 0usize;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();

            Captured {
                request_line: request_line.trim_end().to_string(),
                body: String::from_utf8(request_body).unwrap(),
            }
        });
        (base, handle)
    }

    fn store_at(base: &str) -> HttpStore {
        HttpStore::new(base, Duration::from_secs(5)).unwrap()
    }

    const PRODUCTS_JSON: &str = r#"[{"_id":"65f1a2","productId":"PRD-0001","name":"Current Transformer","transport":"Multi-modal","description":"220kV CT","quantity":10,"from":"Kakinada","to":"Vemagiri GIS","type":"Industrial","remarks":"","__v":0}]"#;

    const RECORD_JSON: &str = r#"{"_id":"gp9","gatePassNumber":17,"date":"15/10/2026","to":"Hyderabad GIS","products":[{"productId":"PRD-0001","name":"Current Transformer","transport":"Road","description":"","selectedQuantity":4,"type":"Industrial","remarks":""}],"preparedBy":"A. Rao","checkedBy":"","authorizedBy":"","generatedAt":"2026-10-15T09:30:00.000Z"}"#;

    fn ct() -> Product {
        Product {
            key: "65f1a2".to_string(),
            product_id: "PRD-0001".to_string(),
            name: "Current Transformer".to_string(),
            transport: TransportMode::Road,
            description: String::new(),
            quantity: 10,
            from: "Kakinada".to_string(),
            to: "Vemagiri GIS".to_string(),
            product_type: ProductType::Industrial,
            remarks: String::new(),
        }
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let store = HttpStore::new("http://localhost:5000/api", Duration::from_secs(5)).unwrap();
        assert_eq!(
            store.endpoint(&["products"]).as_str(),
            "http://localhost:5000/api/products"
        );
        assert_eq!(
            store.endpoint(&["products", "abc123", "quantity"]).as_str(),
            "http://localhost:5000/api/products/abc123/quantity"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let store = HttpStore::new("http://localhost:5000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            store.endpoint(&["gatepasses"]).as_str(),
            "http://localhost:5000/api/gatepasses"
        );
    }

    #[test]
    fn test_endpoint_escapes_keys() {
        let store = HttpStore::new("http://localhost:5000/api", Duration::from_secs(5)).unwrap();
        assert_eq!(
            store.endpoint(&["products", "a/b"]).as_str(),
            "http://localhost:5000/api/products/a%2Fb"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpStore::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl { .. }));

        let err = HttpStore::new("mailto:ops@example.com", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl { .. }));
    }

    #[test]
    fn test_unreachable_backend_is_http_error() {
        // Port 9 (discard) is not expected to have an HTTP listener.
        let store = HttpStore::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        let err = store.list_products().unwrap_err();
        assert!(matches!(err, StoreError::Http(_)));
    }

    #[test]
    fn test_list_products_decodes_backend_json() {
        let (base, server) = serve_once("200 OK", PRODUCTS_JSON);
        let products = store_at(&base).list_products().unwrap();
        let request = server.join().unwrap();

        assert_eq!(request.request_line, "GET /api/products HTTP/1.1");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].key, "65f1a2");
        assert_eq!(products[0].product_id, "PRD-0001");
        assert_eq!(products[0].transport, TransportMode::MultiModal);
        assert_eq!(products[0].product_type, ProductType::Industrial);
        assert_eq!(products[0].quantity, 10);
    }

    #[test]
    fn test_create_product_posts_draft() {
        let (base, server) = serve_once("201 Created", r#"{"_id":"65f1b3","productId":"PRD-0002","name":"Insulator","transport":"Road","description":"","quantity":8,"from":"Kakinada","to":"Vemagiri GIS","type":"Electronics","remarks":""}"#);
        let draft = ProductDraft::new("Insulator", 8, "Kakinada", "Vemagiri GIS");
        let product = store_at(&base).create_product(&draft).unwrap();
        let request = server.join().unwrap();

        assert_eq!(request.request_line, "POST /api/products HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(sent["name"], "Insulator");
        assert_eq!(sent["quantity"], 8);
        assert_eq!(sent["type"], "Electronics");
        assert_eq!(product.product_id, "PRD-0002");
    }

    #[test]
    fn test_update_quantity_patches_quantity_body() {
        let (base, server) = serve_once("200 OK", "{}");
        store_at(&base).update_quantity("65f1a2", 7).unwrap();
        let request = server.join().unwrap();

        assert_eq!(request.request_line, "PATCH /api/products/65f1a2/quantity HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(sent, serde_json::json!({ "quantity": 7 }));
    }

    #[test]
    fn test_missing_product_is_not_found() {
        let (base, server) = serve_once("404 Not Found", r#"{"message":"Product not found"}"#);
        let err = store_at(&base).delete_product("gone").unwrap_err();
        let request = server.join().unwrap();

        assert_eq!(request.request_line, "DELETE /api/products/gone HTTP/1.1");
        assert!(matches!(err, StoreError::NotFound(ref what) if what == "products/gone"));
    }

    #[test]
    fn test_server_error_keeps_status_and_body() {
        let (base, server) = serve_once("500 Internal Server Error", "database unavailable");
        let err = store_at(&base).list_gate_passes().unwrap_err();
        server.join().unwrap();

        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "database unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_commit_sends_submission_and_decodes_record() {
        let (base, server) = serve_once("201 Created", RECORD_JSON);
        let store = store_at(&base);

        let mut session = GatePassSession::new();
        session.add_selection(&ct(), 4).unwrap();
        session.set_metadata(GatePassMetadata::new("Hyderabad GIS", "A. Rao"));
        let submission = session
            .submission(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap())
            .unwrap();

        let record = store.create_gate_pass(&submission).unwrap();
        let request = server.join().unwrap();

        assert_eq!(request.request_line, "POST /api/gatepasses HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(sent["date"], "15/10/2026");
        assert_eq!(sent["to"], "Hyderabad GIS");
        assert_eq!(sent["preparedBy"], "A. Rao");
        assert_eq!(sent["checkedBy"], "");
        assert_eq!(sent["products"][0]["productId"], "PRD-0001");
        assert_eq!(sent["products"][0]["selectedQuantity"], 4);
        assert!(sent["products"][0].get("_id").is_none());

        assert_eq!(record.gate_pass_number, "17");
        assert_eq!(record.total_quantity(), 4);
    }

    #[test]
    fn test_rejected_submission_is_retryable() {
        let (base, server) = serve_once("503 Service Unavailable", "try later");
        let store = store_at(&base);

        let mut session = GatePassSession::new();
        session.add_selection(&ct(), 4).unwrap();
        session.set_metadata(GatePassMetadata::new("Hyderabad GIS", "A. Rao"));

        let err = session
            .commit(&store, &store, NaiveDate::from_ymd_opt(2026, 10, 15).unwrap())
            .unwrap_err();
        server.join().unwrap();

        assert!(matches!(
            err,
            GatePassError::SubmissionFailed(StoreError::Status { status: 503, .. })
        ));
        assert_eq!(session.state(), SessionState::SubmissionFailed);
        assert_eq!(session.ledger().total_quantity(), 4);
        assert_eq!(session.metadata().destination, "Hyderabad GIS");
    }
}
