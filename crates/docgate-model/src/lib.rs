//! Model types for DocGate.
//!
//! This crate holds the types shared by the backing-store client, the CRUD
//! orchestrator and the HTTP layer. Documents are schemaless JSON objects, so
//! they are modelled as an open map with typed accessors for the two reserved
//! CouchDB metadata keys (`_id` and `_rev`).
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod error;
pub mod operations;

pub use document::{AllDocsResponse, AllDocsRow, DatabaseInfo, Document};
pub use error::{DataError, DataErrorCode};
pub use operations::{DataOperation, RouteParams};
