//! HTTP service layer for DocGate.
//!
//! This crate exposes the gateway's REST surface, providing:
//!
//! - **Router**: Maps method and path onto a [`DataOperation`](docgate_model::DataOperation)
//! - **Handler trait**: Defines the boundary between HTTP and the document service
//! - **Service**: Hyper `Service` with correlation ids, body limits and request deadlines
//! - **Response helpers**: JSON success/error response formatting
#![allow(missing_docs)]

pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;

pub use body::DataResponseBody;
pub use dispatch::DataHandler;
pub use service::{CORRELATION_ID_HEADER, DataHttpConfig, DataHttpService};
