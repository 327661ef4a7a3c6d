//! In-process backend implementation.
//!
//! Holds collections in memory behind a [`tokio::sync::RwLock`]. Faithful
//! to the server contract: schema validation on import, per-document
//! statuses, idempotent deletes, paged queries. Also carries fault
//! injection knobs (health toggling, per-id rejection, import latency) so
//! the pipeline's failure handling and batch adaptation can be exercised
//! without a real server.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use agora_core::{Error, Result};

use crate::backend::{CollectionQuery, Hit, HitList, ImportAction, ImportStatus, SearchBackend};
use crate::document::Document;
use crate::filter::SearchFilter;
use crate::schema::CollectionSchema;

struct MemCollection {
    schema: CollectionSchema,
    /// Documents in insertion order; upserts keep the original slot.
    documents: Vec<Document>,
}

impl MemCollection {
    fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.id == id)
    }
}

/// In-memory [`SearchBackend`].
#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<BTreeMap<String, MemCollection>>,
    unhealthy: AtomicBool,
    rejected_ids: Mutex<HashSet<String>>,
    import_delays: Mutex<VecDeque<Duration>>,
    import_sizes: Mutex<Vec<usize>>,
}

impl MemoryBackend {
    /// Create an empty, healthy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the health probe outcome.
    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    /// Make every future import of `id` fail with a per-document error.
    pub fn reject_id(&self, id: impl Into<String>) {
        self.rejected_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.into());
    }

    /// Stop rejecting `id`.
    pub fn accept_id(&self, id: &str) {
        self.rejected_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
    }

    /// Queue per-call import latencies; each import call consumes one.
    ///
    /// Once the queue is empty, imports are instantaneous again. Used to
    /// shape throughput in batch-adaptation tests.
    pub fn queue_import_delays(&self, delays: impl IntoIterator<Item = Duration>) {
        self.import_delays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(delays);
    }

    /// Batch size of every import call so far, in call order.
    ///
    /// Lets tests observe how a caller sliced its imports, e.g. that the
    /// pipeline actually resized its batches.
    pub fn import_batch_sizes(&self) -> Vec<usize> {
        self.import_sizes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of documents currently stored in `collection`.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }

    fn check_health(&self) -> Result<()> {
        if self.unhealthy.load(Ordering::SeqCst) {
            Err(Error::backend("search server is unreachable"))
        } else {
            Ok(())
        }
    }

    fn is_rejected(&self, id: &str) -> bool {
        self.rejected_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id)
    }

    fn next_delay(&self) -> Option<Duration> {
        self.import_delays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn health(&self) -> Result<()> {
        self.check_health()
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        self.check_health()?;
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        self.check_health()?;
        let mut collections = self.collections.write().await;
        let name = schema.collection_name().to_string();
        if collections.contains_key(&name) {
            return Err(Error::operation(format!(
                "collection '{name}' already exists"
            )));
        }
        collections.insert(
            name,
            MemCollection {
                schema: schema.clone(),
                documents: Vec::new(),
            },
        );
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        self.check_health()?;
        self.collections
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("collection '{name}'")))
    }

    async fn import_documents(
        &self,
        collection: &str,
        documents: Vec<Document>,
        action: ImportAction,
    ) -> Result<Vec<ImportStatus>> {
        self.check_health()?;
        self.import_sizes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(documents.len());
        if let Some(delay) = self.next_delay() {
            tokio::time::sleep(delay).await;
        }

        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(collection)
            .ok_or_else(|| Error::not_found(format!("collection '{collection}'")))?;

        let mut report = Vec::with_capacity(documents.len());
        for document in documents {
            if self.is_rejected(&document.id) {
                report.push(ImportStatus::failed(&document.id, "document rejected"));
                continue;
            }
            if let Err(e) = collection.schema.validate_document(&document) {
                report.push(ImportStatus::failed(&document.id, e.to_string()));
                continue;
            }
            let existing = collection.position(&document.id);
            let status = match (action, existing) {
                (ImportAction::Create, Some(_)) => {
                    ImportStatus::failed(&document.id, "id already exists")
                }
                (ImportAction::Create, None) | (ImportAction::Upsert, None) => {
                    let id = document.id.clone();
                    collection.documents.push(document);
                    ImportStatus::ok(id)
                }
                (ImportAction::Upsert, Some(pos)) => {
                    let id = document.id.clone();
                    collection.documents[pos] = document;
                    ImportStatus::ok(id)
                }
                (ImportAction::Update, Some(pos)) => {
                    collection.documents[pos].merge(&document);
                    ImportStatus::ok(&document.id)
                }
                (ImportAction::Update, None) => {
                    ImportStatus::failed(&document.id, "document not found")
                }
            };
            report.push(status);
        }
        Ok(report)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<Option<String>> {
        self.check_health()?;
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(collection) else {
            return Ok(None);
        };
        match collection.position(id) {
            Some(pos) => {
                let removed = collection.documents.remove(pos);
                Ok(Some(removed.id))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_filter(&self, collection: &str, filter: &SearchFilter) -> Result<usize> {
        self.check_health()?;
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = collection.documents.len();
        collection.documents.retain(|d| !filter.matches(d));
        Ok(before - collection.documents.len())
    }

    async fn search(&self, query: &CollectionQuery) -> Result<HitList> {
        self.check_health()?;
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(&query.collection) else {
            return Ok(HitList::default());
        };

        let mut hits: Vec<Hit> = collection
            .documents
            .iter()
            .filter(|d| {
                query
                    .filter
                    .as_ref()
                    .map(|f| f.matches(d))
                    .unwrap_or(true)
            })
            .filter_map(|d| {
                let text_match = if query.query.trim() == "*" {
                    1.0
                } else {
                    d.text_match(&query.query)
                };
                (text_match > 0.0).then(|| Hit {
                    document: d.clone(),
                    text_match,
                })
            })
            .collect();

        // sort_by is stable; equal scores keep insertion order.
        hits.sort_by(|a, b| {
            b.text_match
                .partial_cmp(&a.text_match)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let found = hits.len();
        let page = query.page.max(1);
        let start = (page - 1) * query.per_page.max(1);
        let hits = hits
            .into_iter()
            .skip(start)
            .take(query.per_page.max(1))
            .collect();
        Ok(HitList { hits, found })
    }
}
