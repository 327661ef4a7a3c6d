//! The backend abstraction.
//!
//! [`SearchBackend`] is the seam between the engine and whatever search
//! server actually holds the index. The engine only ever talks to this
//! trait; [`crate::memory::MemoryBackend`] is the in-process implementation
//! used by tests and single-node deployments.

use async_trait::async_trait;

use agora_core::Result;

use crate::document::Document;
use crate::filter::SearchFilter;
use crate::schema::CollectionSchema;

/// How an import treats documents already present under the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    /// Fail on an existing id.
    Create,
    /// Replace or insert. The pipeline's idempotent default.
    Upsert,
    /// Merge fields into an existing document; fail when absent.
    Update,
}

/// Per-document outcome of a batch import.
#[derive(Debug, Clone)]
pub struct ImportStatus {
    /// Id of the document this status refers to.
    pub id: String,
    /// Whether the document was accepted.
    pub success: bool,
    /// Backend error message when rejected.
    pub error: Option<String>,
}

impl ImportStatus {
    /// Successful import of `id`.
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: true,
            error: None,
        }
    }

    /// Rejected import of `id`.
    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A query against one collection.
#[derive(Debug, Clone)]
pub struct CollectionQuery {
    /// Collection to search.
    pub collection: String,
    /// Query text. `*` matches every document (backend semantics; the
    /// engine's public surface never forwards wildcard queries).
    pub query: String,
    /// Optional filter conjunction pushed down with the query.
    pub filter: Option<SearchFilter>,
    /// 1-based result page.
    pub page: usize,
    /// Hits per page.
    pub per_page: usize,
}

/// One hit from a collection query.
#[derive(Debug, Clone)]
pub struct Hit {
    /// The stored document.
    pub document: Document,
    /// Backend textual match score in `[0, 1]`.
    pub text_match: f32,
}

/// Result of a collection query.
#[derive(Debug, Clone, Default)]
pub struct HitList {
    /// The requested page of hits, best match first.
    pub hits: Vec<Hit>,
    /// Total matching documents, across all pages.
    pub found: usize,
}

/// Operations the engine requires from a search server.
///
/// All methods take `&self`; implementations handle their own interior
/// mutability and are shared behind an [`std::sync::Arc`].
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Liveness probe. `Err` means the server is unreachable or degraded.
    async fn health(&self) -> Result<()>;

    /// Names of the existing collections.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Create a collection. Fails if it already exists.
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()>;

    /// Drop a collection and all its documents.
    async fn drop_collection(&self, name: &str) -> Result<()>;

    /// Import a batch of documents.
    ///
    /// A hard `Err` means the batch as a whole did not reach the server;
    /// otherwise one [`ImportStatus`] is returned per document, in order.
    async fn import_documents(
        &self,
        collection: &str,
        documents: Vec<Document>,
        action: ImportAction,
    ) -> Result<Vec<ImportStatus>>;

    /// Delete one document by id.
    ///
    /// Returns the deleted id, or `None` when the collection or document
    /// does not exist (deletion is idempotent).
    async fn delete_document(&self, collection: &str, id: &str) -> Result<Option<String>>;

    /// Delete every document matching `filter`; returns the count.
    async fn delete_by_filter(&self, collection: &str, filter: &SearchFilter) -> Result<usize>;

    /// Run a query against one collection.
    async fn search(&self, query: &CollectionQuery) -> Result<HitList>;
}
