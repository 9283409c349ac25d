//! Document CRUD orchestration for DocGate.
//!
//! [`DocumentService`] hides CouchDB's revision tokens from callers: updates
//! without a `_rev` resolve the current one first, and deletes always look the
//! document up to delete exactly the revision they saw. Neither sequence is
//! atomic and neither retries; a concurrent writer surfaces as a conflict.
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handler;
pub mod service;

pub use config::{DocGateConfig, LogFormat};
pub use error::{DocumentError, document_error_to_data};
pub use handler::DocGateHandler;
pub use service::DocumentService;
