//! Document service: CRUD orchestration over a [`StoreClient`].

use docgate_couchdb::StoreClient;
use docgate_model::{DatabaseInfo, Document};
use tracing::{debug, info};

use crate::error::DocumentError;

/// Document lifecycle operations with revision management.
///
/// The service is stateless between calls; the only multi-step sequences are
/// the revision lookup before an update without `_rev` and the lookup before
/// every delete. Cancelling either sequence between its steps (by dropping the
/// future) issues no write.
#[derive(Debug, Clone)]
pub struct DocumentService<C> {
    client: C,
}

impl<C: StoreClient> DocumentService<C> {
    /// Create a service over a store client.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The underlying store client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Probe the store.
    pub async fn check_health(&self) -> Result<(), DocumentError> {
        self.client.check_health().await?;
        Ok(())
    }

    /// Read database metadata.
    pub async fn get_database(&self, database: &str) -> Result<DatabaseInfo, DocumentError> {
        Ok(self.client.fetch_database(database).await?)
    }

    /// Create a database; an existing database counts as success.
    pub async fn create_database(&self, database: &str) -> Result<(), DocumentError> {
        self.client.create_database(database).await?;
        info!(database, "database created");
        Ok(())
    }

    /// Delete a database.
    pub async fn delete_database(&self, database: &str) -> Result<(), DocumentError> {
        self.client.delete_database(database).await?;
        info!(database, "database deleted");
        Ok(())
    }

    /// Every document of a database, in store order.
    pub async fn list_documents(&self, database: &str) -> Result<Vec<Document>, DocumentError> {
        Ok(self.client.list_documents(database).await?)
    }

    /// Read one document.
    pub async fn get_document(&self, database: &str, id: &str) -> Result<Document, DocumentError> {
        Ok(self.client.fetch_document(database, id).await?)
    }

    /// Create a document; the store assigns its id (unless `_id` is set) and
    /// first revision.
    pub async fn create_document(
        &self,
        database: &str,
        doc: &Document,
    ) -> Result<(), DocumentError> {
        self.client.create_document(database, doc).await?;
        info!(database, "document created");
        Ok(())
    }

    /// Replace a document.
    ///
    /// When `doc` carries no usable `_rev`, the current revision is fetched
    /// and copied in first. A concurrent write between the fetch and the
    /// replace fails with the store's conflict, which is returned as-is.
    pub async fn update_document(
        &self,
        database: &str,
        id: &str,
        mut doc: Document,
    ) -> Result<(), DocumentError> {
        if doc.revision().is_none() {
            let current = self
                .client
                .fetch_document(database, id)
                .await
                .map_err(|source| DocumentError::RevisionUnresolved {
                    database: database.to_owned(),
                    id: id.to_owned(),
                    source,
                })?;
            let revision = usable_revision(&current, database, id)?;
            debug!(database, id, revision, "resolved current revision for update");
            doc.set_revision(revision);
        }

        self.client.replace_document(database, id, &doc).await?;
        info!(database, id, "document updated");
        Ok(())
    }

    /// Delete a document at the revision the store currently reports.
    ///
    /// Any `_rev` the caller may know is ignored.
    pub async fn delete_document(&self, database: &str, id: &str) -> Result<(), DocumentError> {
        let current = self
            .client
            .fetch_document(database, id)
            .await
            .map_err(|source| DocumentError::DeleteLookup {
                database: database.to_owned(),
                id: id.to_owned(),
                source,
            })?;
        let revision = usable_revision(&current, database, id)?;

        self.client.delete_document(database, id, revision).await?;
        info!(database, id, revision, "document deleted");
        Ok(())
    }
}

fn usable_revision<'a>(
    doc: &'a Document,
    database: &str,
    id: &str,
) -> Result<&'a str, DocumentError> {
    doc.revision().ok_or_else(|| DocumentError::RevisionMissing {
        database: database.to_owned(),
        id: id.to_owned(),
    })
}
