//! Documents, database info and the `_all_docs` listing envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A schemaless document stored in a database.
///
/// The body is an arbitrary JSON object. The reserved metadata keys are only
/// read and written through [`Document::id`], [`Document::revision`] and
/// [`Document::set_revision`], which reject values of the wrong JSON type
/// instead of silently coercing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Reserved key carrying the document identifier.
    pub const ID_FIELD: &str = "_id";
    /// Reserved key carrying the revision token.
    pub const REV_FIELD: &str = "_rev";

    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The document identifier, if present as a non-empty string.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        non_empty_str(self.0.get(Self::ID_FIELD))
    }

    /// The revision token, if present as a non-empty string.
    ///
    /// A `_rev` that is missing, `null`, empty or not a string is treated as
    /// absent.
    #[must_use]
    pub fn revision(&self) -> Option<&str> {
        non_empty_str(self.0.get(Self::REV_FIELD))
    }

    /// Overwrite the revision token.
    pub fn set_revision(&mut self, revision: impl Into<String>) {
        self.0
            .insert(Self::REV_FIELD.to_owned(), Value::String(revision.into()));
    }

    /// Get a field by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert a field, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = Value;

    /// Succeeds only for JSON objects; any other value is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Database metadata as reported by the store (`GET /{db}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseInfo(Map<String, Value>);

impl DatabaseInfo {
    /// The database name reported by the store.
    #[must_use]
    pub fn db_name(&self) -> Option<&str> {
        self.0.get("db_name").and_then(Value::as_str)
    }

    /// Number of live documents reported by the store.
    #[must_use]
    pub fn doc_count(&self) -> Option<u64> {
        self.0.get("doc_count").and_then(Value::as_u64)
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for DatabaseInfo {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Envelope returned by `GET /{db}/_all_docs?include_docs=true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllDocsResponse {
    /// Total rows in the view, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    /// Row offset, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Rows in store order.
    #[serde(default)]
    pub rows: Vec<AllDocsRow>,
}

/// One row of the `_all_docs` envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllDocsRow {
    /// Row identifier (the document id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Embedded document; absent or `null` for deleted entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
}

impl AllDocsResponse {
    /// Unwrap the embedded documents, keeping row order and skipping rows
    /// that carry no document.
    #[must_use]
    pub fn into_documents(self) -> Vec<Document> {
        self.rows.into_iter().filter_map(|row| row.doc).collect()
    }
}
