//! CouchDB backing-store client for DocGate.
//!
//! Operation mapping:
//!
//! | Client method | CouchDB API | Success status |
//! | --- | --- | --- |
//! | `StoreClient::fetch_document` | `GET /{db}/{id}` | 200 |
//! | `StoreClient::create_document` | `POST /{db}` | 201 |
//! | `StoreClient::replace_document` | `PUT /{db}/{id}` | 200 or 201 |
//! | `StoreClient::delete_document` | `DELETE /{db}/{id}?rev={rev}` | 200 |
//! | `StoreClient::fetch_database` | `GET /{db}` | 200 |
//! | `StoreClient::create_database` | `PUT /{db}` | 201, or 412 (already exists) |
//! | `StoreClient::delete_database` | `DELETE /{db}` | 200 |
//! | `StoreClient::list_documents` | `GET /{db}/_all_docs?include_docs=true` | 200 |
//! | `StoreClient::check_health` | `GET /{health_path}` | 200 |
//!
//! The client applies no policy beyond this status mapping: any other status
//! surfaces as [`StoreError::Status`] with the verbatim response body.

pub mod client;
pub mod config;
pub mod error;
pub mod testing;

pub use client::{CouchDbClient, StoreClient};
pub use config::CouchDbConfig;
pub use error::{StoreError, StoreOperation, StoreResult};
pub use testing::{MockCouchDb, StoreCall};
