//! The batch indexing pipeline.
//!
//! Walks the store's dirty rows in primary-key order, converts them to
//! documents, imports them in batches, and clears the dirty flags of the
//! rows each successful batch covered. The batch size adapts to observed
//! throughput: when a full batch imports more than 20% faster than the
//! previous one the size doubles, when it imports more than 20% slower it
//! halves (never below one).
//!
//! Failure handling is deliberately coarse: a single rejected document
//! leaves its whole batch flagged dirty, so the next run retries all of it.
//! The cursor still advances, so one poisoned row cannot stall a run. A
//! hard backend error (the batch never reached the server) aborts the run
//! with an error; everything indexed so far keeps its cleared flags.

use std::time::Instant;

use log::{debug, info, warn};

use agora_core::Result;
use agora_model::{ContentBatch, Post, PublishedContent, Topic};

use crate::backend::ImportAction;
use crate::boost::BoostConfig;
use crate::indexable::Indexable;
use crate::manager::{first_failure, SearchIndexManager};
use crate::schema::DocumentKind;

const DEFAULT_INITIAL_BATCH_SIZE: usize = 100;
const DEFAULT_CONTENT_PAGE_SIZE: usize = 100;

/// Speed-up ratio above which a full batch doubles the batch size.
const GROW_RATIO: f64 = 1.2;
/// Slow-down ratio below which a full batch halves the batch size.
const SHRINK_RATIO: f64 = 0.8;

/// A row the simple (non-grouped) pipeline can track.
trait BatchRow: Indexable {
    fn pk(&self) -> i64;
    fn revision(&self) -> u64;
}

impl BatchRow for Topic {
    fn pk(&self) -> i64 {
        self.pk
    }
    fn revision(&self) -> u64 {
        self.revision
    }
}

impl BatchRow for Post {
    fn pk(&self) -> i64 {
        self.pk
    }
    fn revision(&self) -> u64 {
        self.revision
    }
}

/// Batch indexer over a [`SearchIndexManager`].
pub struct IndexPipeline<'a> {
    manager: &'a SearchIndexManager,
    initial_batch_size: usize,
    content_page_size: usize,
}

impl<'a> IndexPipeline<'a> {
    /// Build a pipeline with the default batch sizing.
    pub fn new(manager: &'a SearchIndexManager) -> Self {
        Self {
            manager,
            initial_batch_size: DEFAULT_INITIAL_BATCH_SIZE,
            content_page_size: DEFAULT_CONTENT_PAGE_SIZE,
        }
    }

    /// Override the starting batch size (and content page size).
    pub fn with_initial_batch_size(mut self, size: usize) -> Self {
        self.initial_batch_size = size.max(1);
        self.content_page_size = size.max(1);
        self
    }

    /// Index the dirty rows of one kind; returns the documents accepted.
    ///
    /// With `force`, every row is a candidate regardless of its flag.
    /// Chapter documents are derived from published contents and cannot be
    /// indexed on their own; asking for them logs a warning and indexes
    /// nothing.
    pub async fn index_kind(&self, kind: DocumentKind, force: bool) -> Result<u64> {
        if !self.manager.connected() {
            return Ok(0);
        }
        match kind {
            DocumentKind::Topic => {
                self.index_rows::<Topic>(
                    |after, limit| self.manager.store().dirty_topics(force, after, limit),
                    |snapshot| self.manager.store().mark_topics_clean(snapshot),
                )
                .await
            }
            DocumentKind::Post => {
                self.index_rows::<Post>(
                    |after, limit| self.manager.store().dirty_posts(force, after, limit),
                    |snapshot| self.manager.store().mark_posts_clean(snapshot),
                )
                .await
            }
            DocumentKind::PublishedContent => self.index_contents(force).await,
            DocumentKind::Chapter => {
                warn!("chapter documents are derived; index 'publishedcontent' instead");
                Ok(0)
            }
        }
    }

    /// Index the dirty rows of every kind.
    pub async fn index_flagged(&self) -> Result<u64> {
        let mut total = 0;
        for kind in [
            DocumentKind::Topic,
            DocumentKind::Post,
            DocumentKind::PublishedContent,
        ] {
            total += self.index_kind(kind, false).await?;
        }
        Ok(total)
    }

    /// Rebuild the index from scratch: recreate every collection, then
    /// index every row of every kind.
    pub async fn index_all(&self) -> Result<u64> {
        self.manager.reset_index().await?;
        let mut total = 0;
        for kind in [
            DocumentKind::Topic,
            DocumentKind::Post,
            DocumentKind::PublishedContent,
        ] {
            total += self.index_kind(kind, true).await?;
        }
        Ok(total)
    }

    fn boosts(&self) -> &BoostConfig {
        &self.manager.config().boosts
    }

    /// Adaptive batch loop for kinds that map one row to one document.
    async fn index_rows<T: BatchRow>(
        &self,
        fetch: impl Fn(i64, usize) -> Vec<T>,
        mark_clean: impl Fn(&[(i64, u64)]),
    ) -> Result<u64> {
        let collection = T::KIND.collection_name();
        let mut batch_size = self.initial_batch_size;
        let mut cursor = 0_i64;
        let mut prev_rate: Option<f64> = None;
        let mut total = 0_u64;

        loop {
            let _scope = self.manager.store().batch_scope().await;

            let started = Instant::now();
            let rows = fetch(cursor, batch_size);
            if rows.is_empty() {
                break;
            }
            let full = rows.len() == batch_size;
            // The cursor advances even when the import fails; the rows stay
            // flagged and the next run picks them up.
            cursor = rows.last().map(|r| r.pk()).unwrap_or(cursor);

            let snapshot: Vec<(i64, u64)> = rows.iter().map(|r| (r.pk(), r.revision())).collect();
            let documents = rows.iter().map(|r| r.to_document(self.boosts())).collect();
            let report = self
                .manager
                .backend()
                .import_documents(collection, documents, ImportAction::Upsert)
                .await?;

            match first_failure(&report) {
                Some(failed) => {
                    warn!(
                        "batch of {} kept dirty in '{collection}': document '{}' rejected: {}",
                        snapshot.len(),
                        failed.id,
                        failed.error.as_deref().unwrap_or("unknown error")
                    );
                }
                None => {
                    mark_clean(&snapshot);
                    total += snapshot.len() as u64;
                }
            }

            let rate = snapshot.len() as f64 / started.elapsed().as_secs_f64().max(1e-9);
            if full {
                if let Some(prev) = prev_rate {
                    let ratio = rate / prev;
                    if ratio > GROW_RATIO {
                        batch_size *= 2;
                        debug!("'{collection}' speeding up ({ratio:.2}x), batch size now {batch_size}");
                    } else if ratio < SHRINK_RATIO && batch_size > 1 {
                        batch_size /= 2;
                        debug!("'{collection}' slowing down ({ratio:.2}x), batch size now {batch_size}");
                    }
                }
            }
            prev_rate = Some(rate);
            debug!("indexed {total} document(s) into '{collection}' so far ({rate:.0} docs/s)");
        }

        info!("indexed {total} document(s) into '{collection}'");
        Ok(total)
    }

    /// Grouped loop for published contents and their chapter pages.
    ///
    /// Each page of contents yields an owner batch then a chapter batch;
    /// owner flags are cleared only after their owner batch succeeds, so a
    /// failed chapter batch leaves the owners clean but gets retried with
    /// the owners on the next forced run.
    async fn index_contents(&self, force: bool) -> Result<u64> {
        let store = self.manager.store();
        let mut source = store.content_batches(force, self.content_page_size);
        let mut total = 0_u64;

        loop {
            let _scope = store.batch_scope().await;
            let Some(item) = source.next_batch() else {
                break;
            };

            let (collection, documents, clear_owners) = match &item.batch {
                ContentBatch::Owners(contents) => (
                    PublishedContent::KIND.collection_name(),
                    contents
                        .iter()
                        .map(|c| c.to_document(self.boosts()))
                        .collect::<Vec<_>>(),
                    true,
                ),
                ContentBatch::Chapters(chapters) => (
                    DocumentKind::Chapter.collection_name(),
                    chapters
                        .iter()
                        .map(|c| c.to_document(self.boosts()))
                        .collect::<Vec<_>>(),
                    false,
                ),
            };
            let count = documents.len() as u64;

            let report = self
                .manager
                .backend()
                .import_documents(collection, documents, ImportAction::Upsert)
                .await?;

            match first_failure(&report) {
                Some(failed) => {
                    warn!(
                        "batch of {count} kept dirty in '{collection}': document '{}' rejected: {}",
                        failed.id,
                        failed.error.as_deref().unwrap_or("unknown error")
                    );
                }
                None => {
                    if clear_owners {
                        store.mark_contents_clean(&item.owners);
                    }
                    total += count;
                }
            }
        }

        info!("indexed {total} content document(s) (owners and chapters)");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use agora_model::{ContentType, Forum, SaveOptions, Section, Store};

    use crate::memory::MemoryBackend;
    use crate::types::SearchConfig;

    async fn connected_manager(
        backend: Arc<MemoryBackend>,
        store: Arc<Store>,
    ) -> SearchIndexManager {
        let manager =
            SearchIndexManager::connect(SearchConfig::recommended(), backend, store).await;
        manager.reset_index().await.unwrap();
        manager
    }

    fn seed_topics(store: &Store, n: usize) -> i64 {
        let forum = store.save_forum(Forum::new("General"));
        for i in 0..n {
            store.save_topic(
                Topic::new(forum.pk, format!("Topic {i}"), "alice"),
                SaveOptions::default(),
            );
        }
        forum.pk
    }

    // ------------------------------------------------------------------------
    // Flag lifecycle
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_index_clears_flags_and_counts() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        seed_topics(&store, 5);
        let manager = connected_manager(backend.clone(), store.clone()).await;

        let indexed = IndexPipeline::new(&manager)
            .index_kind(DocumentKind::Topic, false)
            .await
            .unwrap();
        assert_eq!(indexed, 5);
        assert!(store.dirty_topics(false, 0, 100).is_empty());
        assert_eq!(backend.document_count("topic").await, 5);
    }

    #[tokio::test]
    async fn test_second_run_without_changes_indexes_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        seed_topics(&store, 3);
        let manager = connected_manager(backend, store).await;
        let pipeline = IndexPipeline::new(&manager);

        pipeline.index_kind(DocumentKind::Topic, false).await.unwrap();
        let again = pipeline.index_kind(DocumentKind::Topic, false).await.unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_force_reindexes_clean_rows() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        seed_topics(&store, 3);
        let manager = connected_manager(backend, store).await;
        let pipeline = IndexPipeline::new(&manager);

        pipeline.index_kind(DocumentKind::Topic, false).await.unwrap();
        let forced = pipeline.index_kind(DocumentKind::Topic, true).await.unwrap();
        assert_eq!(forced, 3);
    }

    #[tokio::test]
    async fn test_disconnected_pipeline_is_a_noop() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_healthy(false);
        let store = Arc::new(Store::new());
        seed_topics(&store, 3);
        let manager =
            SearchIndexManager::connect(SearchConfig::default(), backend, store.clone()).await;

        let indexed = IndexPipeline::new(&manager)
            .index_kind(DocumentKind::Topic, false)
            .await
            .unwrap();
        assert_eq!(indexed, 0);
        // Flags survive for a later run.
        assert_eq!(store.dirty_topics(false, 0, 100).len(), 3);
    }

    // ------------------------------------------------------------------------
    // Failure handling
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_rejected_document_keeps_whole_batch_dirty() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        seed_topics(&store, 4);
        let manager = connected_manager(backend.clone(), store.clone()).await;

        let victim = store.dirty_topics(false, 0, 1)[0].pk;
        backend.reject_id(victim.to_string());

        // One batch holds everything; the rejection poisons it.
        let indexed = IndexPipeline::new(&manager)
            .index_kind(DocumentKind::Topic, false)
            .await
            .unwrap();
        assert_eq!(indexed, 0);
        assert_eq!(store.dirty_topics(false, 0, 100).len(), 4);

        // Clearing the fault lets the retry cover the batch.
        backend.accept_id(&victim.to_string());
        let retried = IndexPipeline::new(&manager)
            .index_kind(DocumentKind::Topic, false)
            .await
            .unwrap();
        assert_eq!(retried, 4);
    }

    #[tokio::test]
    async fn test_rejected_batch_does_not_stall_later_batches() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        seed_topics(&store, 4);
        let manager = connected_manager(backend.clone(), store.clone()).await;

        let victim = store.dirty_topics(false, 0, 1)[0].pk;
        backend.reject_id(victim.to_string());

        // Batch size 2: the first batch is poisoned, the second succeeds.
        let indexed = IndexPipeline::new(&manager)
            .with_initial_batch_size(2)
            .index_kind(DocumentKind::Topic, false)
            .await
            .unwrap();
        assert_eq!(indexed, 2);
        assert_eq!(store.dirty_topics(false, 0, 100).len(), 2);
    }

    // ------------------------------------------------------------------------
    // Batch size adaptation
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_batch_size_grows_when_throughput_improves() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        seed_topics(&store, 14);
        let manager = connected_manager(backend.clone(), store.clone()).await;

        // Slow first batch, fast afterwards.
        backend.queue_import_delays([Duration::from_millis(80), Duration::from_millis(5)]);

        let indexed = IndexPipeline::new(&manager)
            .with_initial_batch_size(2)
            .index_kind(DocumentKind::Topic, false)
            .await
            .unwrap();
        assert_eq!(indexed, 14);
        assert_eq!(backend.document_count("topic").await, 14);

        // The second full batch is 16x faster, doubling the size to 4; the
        // undelayed third batch doubles it again, so the last 6 rows fit in
        // one import. A fixed size of 2 would have taken 7 calls.
        let sizes = backend.import_batch_sizes();
        assert_eq!(sizes, vec![2, 2, 4, 6]);
        assert!(
            sizes.windows(2).any(|w| w[1] > w[0]),
            "batch size never grew: {sizes:?}"
        );
    }

    #[tokio::test]
    async fn test_batch_size_never_drops_below_one() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        seed_topics(&store, 6);
        let manager = connected_manager(backend.clone(), store.clone()).await;

        // Monotonically slower imports force repeated halving down to 1.
        backend.queue_import_delays([
            Duration::from_millis(5),
            Duration::from_millis(40),
            Duration::from_millis(120),
            Duration::from_millis(240),
        ]);

        let indexed = IndexPipeline::new(&manager)
            .with_initial_batch_size(2)
            .index_kind(DocumentKind::Topic, false)
            .await
            .unwrap();
        assert_eq!(indexed, 6);
        assert!(store.dirty_topics(false, 0, 100).is_empty());

        // The slowdown halves 2 to 1 after the second batch; the remaining
        // batches keep slowing down but the size floors at 1.
        let sizes = backend.import_batch_sizes();
        assert_eq!(sizes, vec![2, 2, 1, 1]);
        assert!(sizes.iter().all(|&s| s >= 1));
    }

    // ------------------------------------------------------------------------
    // Content grouping
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_contents_index_owners_and_chapters() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        let mut content = PublishedContent::new(1, "tuto", "Tuto", ContentType::Tutorial);
        content.sections = vec![
            Section::new("intro", "Intro", "<p>a</p>"),
            Section::new("end", "End", "<p>b</p>"),
        ];
        store.save_content(content, SaveOptions::default());
        let manager = connected_manager(backend.clone(), store.clone()).await;

        let indexed = IndexPipeline::new(&manager)
            .index_kind(DocumentKind::PublishedContent, false)
            .await
            .unwrap();
        assert_eq!(indexed, 3); // 1 owner + 2 chapters
        assert_eq!(backend.document_count("publishedcontent").await, 1);
        assert_eq!(backend.document_count("chapter").await, 2);
        assert!(store.dirty_contents(false, 0, 100).is_empty());
    }

    #[tokio::test]
    async fn test_chapter_kind_alone_indexes_nothing() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        let manager = connected_manager(backend, store).await;
        let indexed = IndexPipeline::new(&manager)
            .index_kind(DocumentKind::Chapter, true)
            .await
            .unwrap();
        assert_eq!(indexed, 0);
    }

    #[tokio::test]
    async fn test_index_all_rebuilds_everything() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        let forum_pk = seed_topics(&store, 2);
        store.save_post(
            Post::new(1, forum_pk, 1, "<p>hello</p>", "bob"),
            SaveOptions::default(),
        );
        let manager = connected_manager(backend.clone(), store).await;

        let total = IndexPipeline::new(&manager).index_all().await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(backend.document_count("topic").await, 2);
        assert_eq!(backend.document_count("post").await, 1);
    }
}
