//! In-memory store double.
//!
//! [`MockCouchDb`] keeps databases and documents in memory, enforces
//! CouchDB's revision check on writes and records every call it receives, so
//! tests can assert on the exact sequence of store calls an operation makes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use docgate_model::{DatabaseInfo, Document};
use http::StatusCode;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreOperation, StoreResult};

/// One call received by [`MockCouchDb`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    FetchDocument { database: String, id: String },
    CreateDocument { database: String, doc: Document },
    ReplaceDocument { database: String, id: String, doc: Document },
    DeleteDocument { database: String, id: String, revision: String },
    FetchDatabase { database: String },
    CreateDatabase { database: String },
    DeleteDatabase { database: String },
    ListDocuments { database: String },
    CheckHealth,
}

/// Shared in-memory CouchDB; clones observe the same state.
#[derive(Clone, Default)]
pub struct MockCouchDb {
    inner: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockCouchDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("MockCouchDb")
            .field("databases", &state.databases.len())
            .field("calls", &state.calls.len())
            .finish()
    }
}

/// Documents of one database, kept in insertion order.
#[derive(Default)]
struct MockDatabase {
    docs: Vec<(String, Document)>,
}

impl MockDatabase {
    fn position(&self, id: &str) -> Option<usize> {
        self.docs.iter().position(|(key, _)| key == id)
    }

    fn get(&self, id: &str) -> Option<&Document> {
        self.position(id).map(|index| &self.docs[index].1)
    }

    fn contains_key(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Replace in place, or append a new document.
    fn insert(&mut self, id: String, doc: Document) {
        match self.position(&id) {
            Some(index) => self.docs[index].1 = doc,
            None => self.docs.push((id, doc)),
        }
    }

    fn remove(&mut self, id: &str) {
        if let Some(index) = self.position(id) {
            self.docs.remove(index);
        }
    }

    fn len(&self) -> usize {
        self.docs.len()
    }

    fn values(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter().map(|(_, doc)| doc)
    }
}

#[derive(Default)]
struct MockState {
    databases: BTreeMap<String, MockDatabase>,
    calls: Vec<StoreCall>,
    next_id: u64,
    unhealthy: bool,
}

impl MockState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("mock-{:06}", self.next_id)
    }

    fn database(
        &self,
        operation: StoreOperation,
        database: &str,
    ) -> StoreResult<&MockDatabase> {
        self.databases
            .get(database)
            .ok_or_else(|| not_found(operation, database, "Database does not exist."))
    }

    fn database_mut(
        &mut self,
        operation: StoreOperation,
        database: &str,
    ) -> StoreResult<&mut MockDatabase> {
        self.databases
            .get_mut(database)
            .ok_or_else(|| not_found(operation, database, "Database does not exist."))
    }
}

impl MockCouchDb {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a database directly, bypassing the call log.
    pub fn seed_database(&self, database: &str) {
        self.inner
            .lock()
            .databases
            .entry(database.to_owned())
            .or_default();
    }

    /// Store a document exactly as given, bypassing the call log and the
    /// revision check. Creates the database when needed; listings return
    /// documents in the order they were first stored.
    pub fn seed_document(&self, database: &str, id: &str, doc: Value) {
        let doc = Document::try_from(doc).unwrap_or_default();
        self.inner
            .lock()
            .databases
            .entry(database.to_owned())
            .or_default()
            .insert(id.to_owned(), doc);
    }

    /// Current stored version of a document.
    #[must_use]
    pub fn document(&self, database: &str, id: &str) -> Option<Document> {
        self.inner
            .lock()
            .databases
            .get(database)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Whether a database exists.
    #[must_use]
    pub fn has_database(&self, database: &str) -> bool {
        self.inner.lock().databases.contains_key(database)
    }

    /// Make the health probe fail.
    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.inner.lock().unhealthy = unhealthy;
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }
}

fn next_revision(current: Option<&str>) -> String {
    let generation = current
        .and_then(|rev| rev.split_once('-'))
        .and_then(|(n, _)| n.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    format!("{generation}-{:032x}", u128::from(generation) * 0x9e37_79b9_7f4a_7c15)
}

fn status_error(
    operation: StoreOperation,
    target: &str,
    status: StatusCode,
    error: &str,
    reason: &str,
) -> StoreError {
    StoreError::Status {
        operation,
        target: target.to_owned(),
        status,
        body: json!({"error": error, "reason": reason}).to_string(),
    }
}

fn not_found(operation: StoreOperation, target: &str, reason: &str) -> StoreError {
    status_error(operation, target, StatusCode::NOT_FOUND, "not_found", reason)
}

fn conflict(operation: StoreOperation, target: &str) -> StoreError {
    status_error(
        operation,
        target,
        StatusCode::CONFLICT,
        "conflict",
        "Document update conflict.",
    )
}

#[async_trait]
impl StoreClient for MockCouchDb {
    async fn fetch_document(&self, database: &str, id: &str) -> StoreResult<Document> {
        let mut state = self.inner.lock();
        state.calls.push(StoreCall::FetchDocument {
            database: database.to_owned(),
            id: id.to_owned(),
        });
        let target = format!("{database}/{id}");
        state
            .database(StoreOperation::FetchDocument, database)?
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(StoreOperation::FetchDocument, &target, "missing"))
    }

    async fn create_document(&self, database: &str, doc: &Document) -> StoreResult<()> {
        let mut state = self.inner.lock();
        state.calls.push(StoreCall::CreateDocument {
            database: database.to_owned(),
            doc: doc.clone(),
        });
        let id = match doc.id() {
            Some(id) => id.to_owned(),
            None => state.allocate_id(),
        };
        let target = format!("{database}/{id}");
        let docs = state.database_mut(StoreOperation::CreateDocument, database)?;
        if docs.contains_key(&id) {
            return Err(conflict(StoreOperation::CreateDocument, &target));
        }
        let mut stored = doc.clone();
        stored.insert(Document::ID_FIELD, Value::String(id.clone()));
        stored.set_revision(next_revision(None));
        docs.insert(id, stored);
        Ok(())
    }

    async fn replace_document(
        &self,
        database: &str,
        id: &str,
        doc: &Document,
    ) -> StoreResult<()> {
        let mut state = self.inner.lock();
        state.calls.push(StoreCall::ReplaceDocument {
            database: database.to_owned(),
            id: id.to_owned(),
            doc: doc.clone(),
        });
        let target = format!("{database}/{id}");
        let docs = state.database_mut(StoreOperation::ReplaceDocument, database)?;
        let current = docs.get(id).and_then(|d| d.revision().map(ToOwned::to_owned));
        if current.as_deref() != doc.revision() {
            return Err(conflict(StoreOperation::ReplaceDocument, &target));
        }
        let mut stored = doc.clone();
        stored.insert(Document::ID_FIELD, Value::String(id.to_owned()));
        stored.set_revision(next_revision(current.as_deref()));
        docs.insert(id.to_owned(), stored);
        Ok(())
    }

    async fn delete_document(&self, database: &str, id: &str, revision: &str) -> StoreResult<()> {
        let mut state = self.inner.lock();
        state.calls.push(StoreCall::DeleteDocument {
            database: database.to_owned(),
            id: id.to_owned(),
            revision: revision.to_owned(),
        });
        let target = format!("{database}/{id}");
        let docs = state.database_mut(StoreOperation::DeleteDocument, database)?;
        let Some(current) = docs.get(id) else {
            return Err(not_found(StoreOperation::DeleteDocument, &target, "missing"));
        };
        if current.revision() != Some(revision) {
            return Err(conflict(StoreOperation::DeleteDocument, &target));
        }
        docs.remove(id);
        Ok(())
    }

    async fn fetch_database(&self, database: &str) -> StoreResult<DatabaseInfo> {
        let mut state = self.inner.lock();
        state.calls.push(StoreCall::FetchDatabase {
            database: database.to_owned(),
        });
        let docs = state.database(StoreOperation::FetchDatabase, database)?;
        let info = json!({"db_name": database, "doc_count": docs.len()});
        serde_json::from_value(info).map_err(|source| StoreError::Decode {
            operation: StoreOperation::FetchDatabase,
            target: database.to_owned(),
            source,
        })
    }

    async fn create_database(&self, database: &str) -> StoreResult<()> {
        let mut state = self.inner.lock();
        state.calls.push(StoreCall::CreateDatabase {
            database: database.to_owned(),
        });
        // An existing database is success, as with the real client's 412 handling.
        state.databases.entry(database.to_owned()).or_default();
        Ok(())
    }

    async fn delete_database(&self, database: &str) -> StoreResult<()> {
        let mut state = self.inner.lock();
        state.calls.push(StoreCall::DeleteDatabase {
            database: database.to_owned(),
        });
        state
            .databases
            .remove(database)
            .map(drop)
            .ok_or_else(|| {
                not_found(
                    StoreOperation::DeleteDatabase,
                    database,
                    "Database does not exist.",
                )
            })
    }

    async fn list_documents(&self, database: &str) -> StoreResult<Vec<Document>> {
        let mut state = self.inner.lock();
        state.calls.push(StoreCall::ListDocuments {
            database: database.to_owned(),
        });
        Ok(state
            .database(StoreOperation::ListDocuments, database)?
            .values()
            .cloned()
            .collect())
    }

    async fn check_health(&self) -> StoreResult<()> {
        let mut state = self.inner.lock();
        state.calls.push(StoreCall::CheckHealth);
        if state.unhealthy {
            return Err(StoreError::Unhealthy {
                target: "_up".to_owned(),
                reason: "mock store marked unhealthy".to_owned(),
            });
        }
        Ok(())
    }
}
