//! Gateway request router.
//!
//! Routes live at the host root and are tried in this order:
//!
//! ```text
//! GET    /health        -> Health
//! GET    /{db}/docs     -> ListDocuments
//! GET    /{db}/{id}     -> GetDocument
//! PUT    /{db}/{id}     -> UpdateDocument
//! DELETE /{db}/{id}     -> DeleteDocument
//! GET    /{db}          -> GetDatabase
//! PUT    /{db}          -> CreateDatabase
//! POST   /{db}          -> CreateDocument
//! DELETE /{db}          -> DeleteDatabase
//! ```
//!
//! A route that does not match the method falls through to the next one, so
//! `PUT /health` creates a database named `health` and `PUT /{db}/docs`
//! updates a document named `docs`.

use http::Method;
use percent_encoding::percent_decode_str;

use docgate_model::{DataError, DataOperation, RouteParams};

/// Methods accepted on `/{db}`.
const DATABASE_METHODS: &str = "GET, PUT, POST, DELETE";
/// Methods accepted on `/{db}/{id}`.
const DOCUMENT_METHODS: &str = "GET, PUT, DELETE";

/// Segment naming the health route.
const HEALTH_SEGMENT: &str = "health";
/// Segment naming the listing route under a database.
const LISTING_SEGMENT: &str = "docs";

/// A matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// The operation to dispatch.
    pub operation: DataOperation,
    /// Percent-decoded path parameters.
    pub params: RouteParams,
}

impl ResolvedRoute {
    fn new(operation: DataOperation, params: RouteParams) -> Self {
        Self { operation, params }
    }
}

/// Resolve a gateway operation from the request method and path.
///
/// Unknown paths yield `route_not_found`; known paths with an unsupported
/// method yield `method_not_allowed` (see [`allowed_methods`] for the `Allow`
/// header).
pub fn resolve_route(method: &Method, path: &str) -> Result<ResolvedRoute, DataError> {
    let segments = split_path(path).ok_or_else(|| DataError::route_not_found(path))?;

    match segments.as_slice() {
        [segment] if segment == HEALTH_SEGMENT && method == Method::GET => {
            Ok(ResolvedRoute::new(DataOperation::Health, RouteParams::default()))
        }
        [db] => {
            let operation = match *method {
                Method::GET => DataOperation::GetDatabase,
                Method::PUT => DataOperation::CreateDatabase,
                Method::POST => DataOperation::CreateDocument,
                Method::DELETE => DataOperation::DeleteDatabase,
                _ => return Err(DataError::method_not_allowed(method, path)),
            };
            Ok(ResolvedRoute::new(operation, RouteParams::database(db.clone())))
        }
        [db, segment] if segment == LISTING_SEGMENT && method == Method::GET => Ok(
            ResolvedRoute::new(DataOperation::ListDocuments, RouteParams::database(db.clone())),
        ),
        [db, id] => {
            let operation = match *method {
                Method::GET => DataOperation::GetDocument,
                Method::PUT => DataOperation::UpdateDocument,
                Method::DELETE => DataOperation::DeleteDocument,
                _ => return Err(DataError::method_not_allowed(method, path)),
            };
            Ok(ResolvedRoute::new(
                operation,
                RouteParams::document(db.clone(), id.clone()),
            ))
        }
        _ => Err(DataError::route_not_found(path)),
    }
}

/// The `Allow` header value for a path, or `None` when no route matches it.
#[must_use]
pub fn allowed_methods(path: &str) -> Option<&'static str> {
    match split_path(path)?.len() {
        1 => Some(DATABASE_METHODS),
        2 => Some(DOCUMENT_METHODS),
        _ => None,
    }
}

/// Split the path into percent-decoded segments.
///
/// Returns `None` for the root path and when any segment is unusable (see
/// [`decode_segment`]). A single trailing slash is ignored.
fn split_path(path: &str) -> Option<Vec<String>> {
    let trimmed = path.strip_prefix('/')?;
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return None;
    }

    trimmed.split('/').map(decode_segment).collect()
}

/// Percent-decode one segment.
///
/// Empty segments, dot segments (`.`, `..`, also when encoded as `%2E`) and
/// sequences that do not decode to UTF-8 are rejected.
fn decode_segment(segment: &str) -> Option<String> {
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    match decoded.as_ref() {
        "" | "." | ".." => None,
        _ => Some(decoded.into_owned()),
    }
}
