//! In-memory relational-store collaborator.
//!
//! The real application keeps these records in a relational database; this
//! store reproduces the contract the indexing engine relies on:
//!
//! - every mutating save flags the row as requiring indexing (unless the
//!   caller opts out with [`SaveOptions::skip_index_flag`]);
//! - candidate selection is primary-key ascending, restricted to flagged
//!   rows unless forced;
//! - flag clearing is guarded by a per-row `revision` counter, so a row
//!   saved between selection and clearing keeps its flag — the cleared
//!   state always covers the selection snapshot, never more;
//! - batches run under a serialized [`Store::batch_scope`], the consistency
//!   boundary shared by selection and flag clearing.
//!
//! The dirty flags here are the single source of truth for "what needs
//! reindexing"; the search backend is a cache that may lag behind, never
//! the reverse.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tokio::sync::{Mutex, MutexGuard};

use crate::content::{ChapterPage, PublishedContent};
use crate::forum::{Forum, Post, Topic};

/// Options for a mutating save.
#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    flag_for_index: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            flag_for_index: true,
        }
    }
}

impl SaveOptions {
    /// Save without flagging the row for reindexing.
    ///
    /// Used by bookkeeping writes that are themselves part of marking rows
    /// clean, to avoid flag flapping. The existing flag value is preserved.
    pub fn skip_index_flag() -> Self {
        Self {
            flag_for_index: false,
        }
    }
}

#[derive(Default)]
struct Tables {
    forums: BTreeMap<i64, Forum>,
    topics: BTreeMap<i64, Topic>,
    posts: BTreeMap<i64, Post>,
    contents: BTreeMap<i64, PublishedContent>,
    next_pk: i64,
}

impl Tables {
    fn allocate_pk(&mut self) -> i64 {
        self.next_pk += 1;
        self.next_pk
    }
}

/// In-memory store for the indexable domain records.
pub struct Store {
    tables: RwLock<Tables>,
    batch_lock: Mutex<()>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            batch_lock: Mutex::new(()),
        }
    }

    /// Acquire the batch consistency scope.
    ///
    /// The indexing pipeline holds this guard around each
    /// fetch-convert-import-mark sequence so that batches from concurrent
    /// runs do not interleave. Plain saves do not take this lock; the
    /// revision guard in the mark-clean methods protects them.
    pub async fn batch_scope(&self) -> MutexGuard<'_, ()> {
        self.batch_lock.lock().await
    }

    fn tables(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn tables_mut(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------------
    // Saves
    // ------------------------------------------------------------------------

    /// Save a forum. Forums are not indexed, so no flag is involved.
    pub fn save_forum(&self, mut forum: Forum) -> Forum {
        let mut tables = self.tables_mut();
        if forum.pk == 0 {
            forum.pk = tables.allocate_pk();
        }
        tables.forums.insert(forum.pk, forum.clone());
        forum
    }

    /// Save a topic, flagging it for reindexing per `opts`.
    pub fn save_topic(&self, mut topic: Topic, opts: SaveOptions) -> Topic {
        let mut tables = self.tables_mut();
        if topic.pk == 0 {
            topic.pk = tables.allocate_pk();
        }
        if let Some(existing) = tables.topics.get(&topic.pk) {
            topic.revision = existing.revision + 1;
            if !opts.flag_for_index {
                topic.requires_index = existing.requires_index;
            }
        }
        if opts.flag_for_index {
            topic.requires_index = true;
        }
        tables.topics.insert(topic.pk, topic.clone());
        topic
    }

    /// Save a post, flagging it for reindexing per `opts`.
    pub fn save_post(&self, mut post: Post, opts: SaveOptions) -> Post {
        let mut tables = self.tables_mut();
        if post.pk == 0 {
            post.pk = tables.allocate_pk();
        }
        if let Some(existing) = tables.posts.get(&post.pk) {
            post.revision = existing.revision + 1;
            if !opts.flag_for_index {
                post.requires_index = existing.requires_index;
            }
        }
        if opts.flag_for_index {
            post.requires_index = true;
        }
        tables.posts.insert(post.pk, post.clone());
        post
    }

    /// Save a published content, flagging it for reindexing per `opts`.
    pub fn save_content(&self, mut content: PublishedContent, opts: SaveOptions) -> PublishedContent {
        let mut tables = self.tables_mut();
        if content.pk == 0 {
            content.pk = tables.allocate_pk();
        }
        if let Some(existing) = tables.contents.get(&content.pk) {
            content.revision = existing.revision + 1;
            if !opts.flag_for_index {
                content.requires_index = existing.requires_index;
            }
        }
        if opts.flag_for_index {
            content.requires_index = true;
        }
        tables.contents.insert(content.pk, content.clone());
        content
    }

    // ------------------------------------------------------------------------
    // Lookups and deletes
    // ------------------------------------------------------------------------

    /// Fetch a forum by primary key.
    pub fn forum(&self, pk: i64) -> Option<Forum> {
        self.tables().forums.get(&pk).cloned()
    }

    /// Fetch a topic by primary key.
    pub fn topic(&self, pk: i64) -> Option<Topic> {
        self.tables().topics.get(&pk).cloned()
    }

    /// Fetch a post by primary key.
    pub fn post(&self, pk: i64) -> Option<Post> {
        self.tables().posts.get(&pk).cloned()
    }

    /// Fetch a published content by primary key.
    pub fn content(&self, pk: i64) -> Option<PublishedContent> {
        self.tables().contents.get(&pk).cloned()
    }

    /// Delete a topic row. Index cleanup is the caller's responsibility.
    pub fn remove_topic(&self, pk: i64) -> Option<Topic> {
        self.tables_mut().topics.remove(&pk)
    }

    /// Delete a post row. Index cleanup is the caller's responsibility.
    pub fn remove_post(&self, pk: i64) -> Option<Post> {
        self.tables_mut().posts.remove(&pk)
    }

    /// Delete a published content row. Index cleanup is the caller's
    /// responsibility.
    pub fn remove_content(&self, pk: i64) -> Option<PublishedContent> {
        self.tables_mut().contents.remove(&pk)
    }

    /// Posts of a topic, position ascending.
    pub fn posts_of_topic(&self, topic_pk: i64) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .tables()
            .posts
            .values()
            .filter(|p| p.topic_pk == topic_pk)
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.position);
        posts
    }

    // ------------------------------------------------------------------------
    // Indexing candidates
    // ------------------------------------------------------------------------

    /// Topics to index: pk ascending, pk > `after_pk`, at most `limit`.
    ///
    /// Only flagged topics unless `force`.
    pub fn dirty_topics(&self, force: bool, after_pk: i64, limit: usize) -> Vec<Topic> {
        self.tables()
            .topics
            .range((after_pk + 1)..)
            .map(|(_, t)| t)
            .filter(|t| force || t.requires_index)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Posts to index: pk ascending, pk > `after_pk`, at most `limit`.
    ///
    /// Hidden posts are never candidates; only flagged posts unless `force`.
    pub fn dirty_posts(&self, force: bool, after_pk: i64, limit: usize) -> Vec<Post> {
        self.tables()
            .posts
            .range((after_pk + 1)..)
            .map(|(_, p)| p)
            .filter(|p| p.is_visible)
            .filter(|p| force || p.requires_index)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Published contents to index: pk ascending, pk > `after_pk`, at most
    /// `limit`. Only flagged contents unless `force`.
    pub fn dirty_contents(&self, force: bool, after_pk: i64, limit: usize) -> Vec<PublishedContent> {
        self.tables()
            .contents
            .range((after_pk + 1)..)
            .map(|(_, c)| c)
            .filter(|c| force || c.requires_index)
            .take(limit)
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------------
    // Flag bookkeeping
    // ------------------------------------------------------------------------

    /// Clear the dirty flag of the given topics, revision-guarded.
    ///
    /// Each entry is a `(pk, revision)` pair taken when the row was
    /// selected; rows saved since selection keep their flag.
    pub fn mark_topics_clean(&self, snapshot: &[(i64, u64)]) {
        let mut tables = self.tables_mut();
        for (pk, revision) in snapshot {
            if let Some(topic) = tables.topics.get_mut(pk) {
                if topic.revision == *revision {
                    topic.requires_index = false;
                }
            }
        }
    }

    /// Clear the dirty flag of the given posts, revision-guarded.
    pub fn mark_posts_clean(&self, snapshot: &[(i64, u64)]) {
        let mut tables = self.tables_mut();
        for (pk, revision) in snapshot {
            if let Some(post) = tables.posts.get_mut(pk) {
                if post.revision == *revision {
                    post.requires_index = false;
                }
            }
        }
    }

    /// Clear the dirty flag of the given contents, revision-guarded.
    pub fn mark_contents_clean(&self, snapshot: &[(i64, u64)]) {
        let mut tables = self.tables_mut();
        for (pk, revision) in snapshot {
            if let Some(content) = tables.contents.get_mut(pk) {
                if content.revision == *revision {
                    content.requires_index = false;
                }
            }
        }
    }

    /// Flag every indexable row of every type.
    ///
    /// Used when the index is cleared or reset, so the next full run
    /// reindexes everything.
    pub fn mark_all_dirty(&self) {
        let mut tables = self.tables_mut();
        for topic in tables.topics.values_mut() {
            topic.requires_index = true;
        }
        for post in tables.posts.values_mut() {
            post.requires_index = true;
        }
        for content in tables.contents.values_mut() {
            content.requires_index = true;
        }
    }

    /// Lazy, page-sized batch source for published contents.
    pub fn content_batches(&self, force: bool, per_page: usize) -> ContentBatchSource<'_> {
        ContentBatchSource {
            store: self,
            force,
            per_page: per_page.max(1),
            cursor_pk: 0,
            pending: None,
        }
    }
}

/// One pre-grouped batch from the content batch source.
///
/// A page of contents yields an owner batch for the `publishedcontent`
/// collection, then a chapter batch for the `chapter` collection covering
/// the same owners.
#[derive(Debug, Clone)]
pub enum ContentBatch {
    /// Top-level published content documents.
    Owners(Vec<PublishedContent>),
    /// Synthetic chapter documents derived from the owners' sections.
    Chapters(Vec<ChapterPage>),
}

/// A batch plus the owner snapshot to mark clean on success.
#[derive(Debug, Clone)]
pub struct ContentBatchItem {
    /// The documents to import.
    pub batch: ContentBatch,
    /// `(pk, revision)` of the owner rows covered by this batch.
    pub owners: Vec<(i64, u64)>,
}

/// Server-paginated source of tagged content batches.
pub struct ContentBatchSource<'a> {
    store: &'a Store,
    force: bool,
    per_page: usize,
    cursor_pk: i64,
    pending: Option<ContentBatchItem>,
}

impl ContentBatchSource<'_> {
    /// Produce the next batch, or `None` when exhausted.
    pub fn next_batch(&mut self) -> Option<ContentBatchItem> {
        if let Some(pending) = self.pending.take() {
            return Some(pending);
        }

        let contents = self
            .store
            .dirty_contents(self.force, self.cursor_pk, self.per_page);
        let last = contents.last()?;
        self.cursor_pk = last.pk;

        let owners: Vec<(i64, u64)> = contents.iter().map(|c| (c.pk, c.revision)).collect();
        let chapters: Vec<ChapterPage> =
            contents.iter().flat_map(|c| c.chapter_pages()).collect();

        if !chapters.is_empty() {
            self.pending = Some(ContentBatchItem {
                batch: ContentBatch::Chapters(chapters),
                owners: owners.clone(),
            });
        }

        Some(ContentBatchItem {
            batch: ContentBatch::Owners(contents),
            owners,
        })
    }
}
