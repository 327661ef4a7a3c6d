//! Index administration and the connection guard.
//!
//! [`SearchIndexManager`] is the single entry point callers hold. It is
//! built explicitly at startup from its collaborators (configuration,
//! backend, store) and probes the backend exactly once at construction.
//! When the probe fails or search is disabled, the manager stays
//! disconnected: every operation degrades to a logged no-op instead of
//! erroring, so an unreachable search server never takes the application
//! down with it.

use std::sync::Arc;

use log::{info, warn};

use agora_core::Result;
use agora_model::{ChapterPage, Post, PublishedContent, Store, Topic};

use crate::backend::{ImportAction, ImportStatus, SearchBackend};
use crate::document::Document;
use crate::filter::SearchFilter;
use crate::indexable::Indexable;
use crate::schema::{CollectionSchema, DocumentKind};
use crate::types::SearchConfig;

/// Engine facade: connection state, index administration, entity hooks.
pub struct SearchIndexManager {
    backend: Arc<dyn SearchBackend>,
    store: Arc<Store>,
    config: SearchConfig,
    connected: bool,
}

impl SearchIndexManager {
    /// Build the manager, probing the backend once.
    ///
    /// The probe outcome is logged here and nowhere else; subsequent
    /// operations on a disconnected manager stay silent at the warn level.
    pub async fn connect(
        config: SearchConfig,
        backend: Arc<dyn SearchBackend>,
        store: Arc<Store>,
    ) -> Self {
        let connected = if !config.enabled {
            info!("search is disabled by configuration");
            false
        } else {
            match backend.health().await {
                Ok(()) => {
                    info!("connected to the search backend");
                    true
                }
                Err(e) => {
                    warn!("search backend unavailable, operating degraded: {e}");
                    false
                }
            }
        };
        Self {
            backend,
            store,
            config,
            connected,
        }
    }

    /// Whether the startup probe succeeded.
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// The engine configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub(crate) fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    pub(crate) fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Schemas of every collection the engine maintains.
    pub fn schemas() -> Vec<CollectionSchema> {
        vec![
            Topic::schema(),
            Post::schema(),
            PublishedContent::schema(),
            ChapterPage::schema(),
        ]
    }

    /// Names of the collections currently present in the backend.
    pub async fn collections(&self) -> Vec<String> {
        if !self.connected {
            return Vec::new();
        }
        match self.backend.list_collections().await {
            Ok(names) => names,
            Err(e) => {
                warn!("could not list collections: {e}");
                Vec::new()
            }
        }
    }

    /// Drop every collection and flag every row for reindexing.
    ///
    /// Flags are re-set only after every drop succeeded; an error mid-way
    /// propagates and leaves the flags untouched, so a retry starts from
    /// the same state.
    pub async fn clear_index(&self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        let names = self.backend.list_collections().await?;
        for name in &names {
            self.backend.drop_collection(name).await?;
        }
        self.store.mark_all_dirty();
        info!("cleared {} collection(s), all rows flagged dirty", names.len());
        Ok(())
    }

    /// Drop and recreate every collection from the current schemas.
    pub async fn reset_index(&self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        self.clear_index().await?;
        for schema in Self::schemas() {
            self.backend.create_collection(&schema).await?;
        }
        info!("recreated {} collection(s)", Self::schemas().len());
        Ok(())
    }

    /// Create any collection that does not exist yet, without touching the
    /// existing ones.
    pub async fn ensure_collections(&self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        let existing = self.backend.list_collections().await?;
        for schema in Self::schemas() {
            if !existing.iter().any(|name| name == schema.collection_name()) {
                self.backend.create_collection(&schema).await?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Entity hooks
    // ------------------------------------------------------------------------

    /// Remove one record's document from the index.
    ///
    /// Called from deletion and unpublication paths. Never errors: index
    /// cleanup failures are logged and left to the next reindex, because
    /// the triggering store transaction must not be aborted from here.
    pub async fn delete_record<T: Indexable>(&self, record: &T) {
        let Some(id) = record.search_id() else {
            return;
        };
        self.delete_document(T::KIND, &id).await;
    }

    /// Remove a document by kind and id. Same guarantees as
    /// [`Self::delete_record`].
    pub async fn delete_document(&self, kind: DocumentKind, id: &str) {
        if !self.connected {
            return;
        }
        match self.backend.delete_document(kind.collection_name(), id).await {
            Ok(Some(echoed)) if echoed != id => {
                warn!(
                    "backend deleted '{echoed}' from '{kind}' where '{id}' was requested"
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!("could not delete '{id}' from '{kind}': {e}");
            }
        }
    }

    /// Remove every document matching `filter` from a collection.
    ///
    /// Used to cascade deletions: all posts of a deleted topic, all
    /// chapters of an unpublished content.
    pub async fn delete_by_filter(&self, kind: DocumentKind, filter: &SearchFilter) {
        if !self.connected {
            return;
        }
        match self
            .backend
            .delete_by_filter(kind.collection_name(), filter)
            .await
        {
            Ok(n) => {
                if n > 0 {
                    info!("deleted {n} document(s) from '{kind}' matching {filter}");
                }
            }
            Err(e) => {
                warn!("could not delete from '{kind}' by filter {filter}: {e}");
            }
        }
    }

    /// Remove a topic's document and all its posts' documents.
    pub async fn delete_topic_cascade(&self, topic: &Topic) {
        self.delete_record(topic).await;
        self.delete_by_filter(
            DocumentKind::Post,
            &SearchFilter::new().exact_in("topic_pk", &[topic.pk]),
        )
        .await;
    }

    /// Remove a published content's document and all its chapter documents.
    pub async fn delete_content_cascade(&self, content: &PublishedContent) {
        self.delete_record(content).await;
        self.delete_by_filter(
            DocumentKind::Chapter,
            &SearchFilter::new().exact_in("parent_pk", &[content.pk]),
        )
        .await;
    }

    /// Push a partial field update to one existing document.
    ///
    /// Used for cheap metadata flips (solved flag, vote counts) that do not
    /// warrant a full reindex of the record. Failures are logged, not
    /// raised; the dirty flag still covers the row.
    pub async fn update_single_document(
        &self,
        kind: DocumentKind,
        id: &str,
        fields: Document,
    ) {
        if !self.connected {
            return;
        }
        let mut document = fields;
        document.id = id.to_string();
        match self
            .backend
            .import_documents(kind.collection_name(), vec![document], ImportAction::Update)
            .await
        {
            Ok(report) => {
                if let Some(failed) = report.iter().find(|s| !s.success) {
                    warn!(
                        "partial update of '{id}' in '{kind}' rejected: {}",
                        failed.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
            Err(e) => {
                warn!("partial update of '{id}' in '{kind}' failed: {e}");
            }
        }
    }
}

/// First failed status of an import report, if any.
pub(crate) fn first_failure(report: &[ImportStatus]) -> Option<&ImportStatus> {
    report.iter().find(|s| !s.success)
}
