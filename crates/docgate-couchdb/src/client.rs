//! Store client capability and its CouchDB implementation.

use std::sync::Arc;

use async_trait::async_trait;
use docgate_model::{AllDocsResponse, DatabaseInfo, Document};
use http::StatusCode;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::CouchDbConfig;
use crate::error::{StoreError, StoreOperation, StoreResult};

/// Characters left unescaped in path segments and query values (RFC 3986 unreserved).
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The set of operations the orchestrator needs from a backing store.
///
/// Implementations translate each call into exactly one store request and
/// map its status literally; they never retry and never reconcile revisions.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// `GET /{db}/{id}`; succeeds only on 200.
    async fn fetch_document(&self, database: &str, id: &str) -> StoreResult<Document>;

    /// `POST /{db}`; succeeds only on 201.
    async fn create_document(&self, database: &str, doc: &Document) -> StoreResult<()>;

    /// `PUT /{db}/{id}`; succeeds on 200 or 201.
    async fn replace_document(&self, database: &str, id: &str, doc: &Document)
    -> StoreResult<()>;

    /// `DELETE /{db}/{id}?rev={revision}`; succeeds only on 200.
    async fn delete_document(&self, database: &str, id: &str, revision: &str) -> StoreResult<()>;

    /// `GET /{db}`; succeeds only on 200.
    async fn fetch_database(&self, database: &str) -> StoreResult<DatabaseInfo>;

    /// `PUT /{db}`; succeeds on 201 and on 412 (database already exists).
    async fn create_database(&self, database: &str) -> StoreResult<()>;

    /// `DELETE /{db}`; succeeds only on 200.
    async fn delete_database(&self, database: &str) -> StoreResult<()>;

    /// `GET /{db}/_all_docs?include_docs=true`, unwrapped to the embedded
    /// documents in row order.
    async fn list_documents(&self, database: &str) -> StoreResult<Vec<Document>>;

    /// Liveness probe against the store's health endpoint.
    async fn check_health(&self) -> StoreResult<()>;
}

#[async_trait]
impl<T> StoreClient for Arc<T>
where
    T: StoreClient + ?Sized,
{
    async fn fetch_document(&self, database: &str, id: &str) -> StoreResult<Document> {
        (**self).fetch_document(database, id).await
    }

    async fn create_document(&self, database: &str, doc: &Document) -> StoreResult<()> {
        (**self).create_document(database, doc).await
    }

    async fn replace_document(
        &self,
        database: &str,
        id: &str,
        doc: &Document,
    ) -> StoreResult<()> {
        (**self).replace_document(database, id, doc).await
    }

    async fn delete_document(&self, database: &str, id: &str, revision: &str) -> StoreResult<()> {
        (**self).delete_document(database, id, revision).await
    }

    async fn fetch_database(&self, database: &str) -> StoreResult<DatabaseInfo> {
        (**self).fetch_database(database).await
    }

    async fn create_database(&self, database: &str) -> StoreResult<()> {
        (**self).create_database(database).await
    }

    async fn delete_database(&self, database: &str) -> StoreResult<()> {
        (**self).delete_database(database).await
    }

    async fn list_documents(&self, database: &str) -> StoreResult<Vec<Document>> {
        (**self).list_documents(database).await
    }

    async fn check_health(&self) -> StoreResult<()> {
        (**self).check_health().await
    }
}

/// [`StoreClient`] talking to CouchDB over HTTP with `reqwest`.
///
/// Cheap to clone; clones share the connection pool and the immutable
/// configuration.
#[derive(Clone, Debug)]
pub struct CouchDbClient {
    http: reqwest::Client,
    config: Arc<CouchDbConfig>,
    base_url: String,
}

/// A completed store exchange: status plus the full response body.
struct Exchange {
    status: StatusCode,
    body: String,
}

impl CouchDbClient {
    /// Build a client from its configuration.
    pub fn new(config: CouchDbConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_http_client(http, config))
    }

    /// Build a client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, config: CouchDbConfig) -> Self {
        let base_url = config.base_url();
        Self {
            http,
            config: Arc::new(config),
            base_url,
        }
    }

    /// Build `{base}/{seg}/{seg}...` with each segment percent-encoded.
    ///
    /// Empty, `.` and `..` segments are rejected: URL normalization would
    /// resolve them against the parent path, even when percent-encoded.
    fn url(&self, operation: StoreOperation, segments: &[&str]) -> StoreResult<String> {
        let mut url = self.base_url.clone();
        for segment in segments {
            if matches!(*segment, "" | "." | "..") {
                return Err(StoreError::InvalidSegment {
                    operation,
                    segment: (*segment).to_owned(),
                });
            }
            url.push('/');
            url.extend(utf8_percent_encode(segment, SEGMENT));
        }
        Ok(url)
    }

    async fn execute(
        &self,
        operation: StoreOperation,
        target: &str,
        request: reqwest::RequestBuilder,
    ) -> StoreResult<Exchange> {
        let request = match self.config.credentials() {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|err| StoreError::Transport {
                operation,
                target: target.to_owned(),
                source: Box::new(err),
            })?;
        let status = response.status();
        let body = response.text().await.map_err(|err| StoreError::Transport {
            operation,
            target: target.to_owned(),
            source: Box::new(err),
        })?;

        debug!(
            operation = %operation,
            store_target = target,
            status = status.as_u16(),
            "store call completed"
        );
        Ok(Exchange { status, body })
    }

    /// Run a request and require one of the accepted statuses.
    async fn expect(
        &self,
        operation: StoreOperation,
        target: &str,
        request: reqwest::RequestBuilder,
        accepted: &[StatusCode],
    ) -> StoreResult<String> {
        let exchange = self.execute(operation, target, request).await?;
        if accepted.contains(&exchange.status) {
            Ok(exchange.body)
        } else {
            Err(StoreError::Status {
                operation,
                target: target.to_owned(),
                status: exchange.status,
                body: exchange.body,
            })
        }
    }

    async fn expect_json<T: DeserializeOwned>(
        &self,
        operation: StoreOperation,
        target: &str,
        request: reqwest::RequestBuilder,
    ) -> StoreResult<T> {
        let body = self
            .expect(operation, target, request, &[StatusCode::OK])
            .await?;
        serde_json::from_str(&body).map_err(|source| StoreError::Decode {
            operation,
            target: target.to_owned(),
            source,
        })
    }
}

#[async_trait]
impl StoreClient for CouchDbClient {
    async fn fetch_document(&self, database: &str, id: &str) -> StoreResult<Document> {
        let target = format!("{database}/{id}");
        let url = self.url(StoreOperation::FetchDocument, &[database, id])?;
        let request = self.http.get(url);
        self.expect_json(StoreOperation::FetchDocument, &target, request)
            .await
    }

    async fn create_document(&self, database: &str, doc: &Document) -> StoreResult<()> {
        let url = self.url(StoreOperation::CreateDocument, &[database])?;
        let request = self.http.post(url).json(doc);
        self.expect(
            StoreOperation::CreateDocument,
            database,
            request,
            &[StatusCode::CREATED],
        )
        .await
        .map(drop)
    }

    async fn replace_document(
        &self,
        database: &str,
        id: &str,
        doc: &Document,
    ) -> StoreResult<()> {
        let target = format!("{database}/{id}");
        let url = self.url(StoreOperation::ReplaceDocument, &[database, id])?;
        let request = self.http.put(url).json(doc);
        self.expect(
            StoreOperation::ReplaceDocument,
            &target,
            request,
            &[StatusCode::OK, StatusCode::CREATED],
        )
        .await
        .map(drop)
    }

    async fn delete_document(&self, database: &str, id: &str, revision: &str) -> StoreResult<()> {
        let target = format!("{database}/{id}");
        let url = format!(
            "{}?rev={}",
            self.url(StoreOperation::DeleteDocument, &[database, id])?,
            utf8_percent_encode(revision, SEGMENT)
        );
        self.expect(
            StoreOperation::DeleteDocument,
            &target,
            self.http.delete(url),
            &[StatusCode::OK],
        )
        .await
        .map(drop)
    }

    async fn fetch_database(&self, database: &str) -> StoreResult<DatabaseInfo> {
        let url = self.url(StoreOperation::FetchDatabase, &[database])?;
        let request = self.http.get(url);
        self.expect_json(StoreOperation::FetchDatabase, database, request)
            .await
    }

    async fn create_database(&self, database: &str) -> StoreResult<()> {
        let url = self.url(StoreOperation::CreateDatabase, &[database])?;
        let request = self.http.put(url);
        self.expect(
            StoreOperation::CreateDatabase,
            database,
            request,
            &[StatusCode::CREATED, StatusCode::PRECONDITION_FAILED],
        )
        .await
        .map(drop)
    }

    async fn delete_database(&self, database: &str) -> StoreResult<()> {
        let url = self.url(StoreOperation::DeleteDatabase, &[database])?;
        let request = self.http.delete(url);
        self.expect(
            StoreOperation::DeleteDatabase,
            database,
            request,
            &[StatusCode::OK],
        )
        .await
        .map(drop)
    }

    async fn list_documents(&self, database: &str) -> StoreResult<Vec<Document>> {
        let all_docs = self.url(StoreOperation::ListDocuments, &[database, "_all_docs"])?;
        let url = format!("{all_docs}?include_docs=true");
        let envelope: AllDocsResponse = self
            .expect_json(StoreOperation::ListDocuments, database, self.http.get(url))
            .await?;
        Ok(envelope.into_documents())
    }

    async fn check_health(&self) -> StoreResult<()> {
        let path = self.config.health_path.trim_start_matches('/');
        let url = format!("{}/{path}", self.base_url);
        match self
            .expect(
                StoreOperation::CheckHealth,
                path,
                self.http.get(url),
                &[StatusCode::OK],
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => Err(StoreError::Unhealthy {
                target: path.to_owned(),
                reason: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CouchDbClient {
        CouchDbClient::new(CouchDbConfig::builder().endpoint("couch:5984").build()).unwrap()
    }

    #[test]
    fn test_should_encode_path_segments() {
        let client = client();
        let url = |segments: &[&str]| {
            client
                .url(StoreOperation::FetchDocument, segments)
                .unwrap()
        };
        assert_eq!(url(&["songs", "123"]), "http://couch:5984/songs/123");
        assert_eq!(
            url(&["my db", "_design/all"]),
            "http://couch:5984/my%20db/_design%2Fall"
        );
    }

    #[test]
    fn test_should_reject_dot_and_empty_segments() {
        let client = client();
        let rejected: [&[&str]; 4] = [
            &["songs", ".."],
            &["songs", "."],
            &["..", "newdb"],
            &["songs", ""],
        ];
        for segments in rejected {
            let err = client
                .url(StoreOperation::ReplaceDocument, segments)
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    StoreError::InvalidSegment {
                        operation: StoreOperation::ReplaceDocument,
                        ..
                    }
                ),
                "segments {segments:?}"
            );
        }
        assert!(
            client
                .url(StoreOperation::FetchDocument, &["songs", "..."])
                .is_ok()
        );
    }

    #[test]
    fn test_should_keep_revision_characters_unescaped() {
        let encoded =
            utf8_percent_encode("3-917fa2381192822767f010b95b45325b", SEGMENT).to_string();
        assert_eq!(encoded, "3-917fa2381192822767f010b95b45325b");
    }

    #[test]
    fn test_should_not_leak_password_in_debug() {
        let client = CouchDbClient::new(
            CouchDbConfig::builder()
                .username("admin")
                .password("topsecret")
                .build(),
        )
        .unwrap();
        assert!(!format!("{client:?}").contains("topsecret"));
    }
}
