//! The query layer: mixed search, similar topics, content suggestions.
//!
//! All collections are queried concurrently, each hit's textual match
//! score is multiplied by the weight baked into the document at indexing
//! time, and the merged list is sorted and paged. A collection that errors
//! degrades to zero hits from that collection; the query as a whole never
//! fails.

use std::cmp::Ordering;
use std::collections::HashMap;

use futures::future::join_all;
use log::{debug, warn};

use crate::backend::CollectionQuery;
use crate::document::Document;
use crate::filter::SearchFilter;
use crate::manager::SearchIndexManager;
use crate::schema::DocumentKind;

/// A search request from the application.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Query text.
    pub query: String,
    /// Kinds to search; empty means all of them.
    pub kinds: Vec<DocumentKind>,
    /// 1-based result page.
    pub page: usize,
}

impl SearchRequest {
    /// Search every kind, first page.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kinds: Vec::new(),
            page: 1,
        }
    }

    /// Restrict the request to the given kinds.
    pub fn with_kinds(mut self, kinds: Vec<DocumentKind>) -> Self {
        self.kinds = kinds;
        self
    }

    /// Ask for a specific result page.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }
}

/// Per-kind filters pushed down with a request (visibility, scoping).
#[derive(Debug, Clone, Default)]
pub struct KindFilters(HashMap<DocumentKind, SearchFilter>);

impl KindFilters {
    /// No filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a filter to one kind.
    pub fn with_filter(mut self, kind: DocumentKind, filter: SearchFilter) -> Self {
        self.0.insert(kind, filter);
        self
    }

    fn get(&self, kind: DocumentKind) -> Option<&SearchFilter> {
        self.0.get(&kind)
    }
}

/// One scored hit in a mixed result list.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Kind of the hit.
    pub kind: DocumentKind,
    /// The stored document.
    pub document: Document,
    /// Final score: backend text match times indexed weight.
    pub score: f32,
}

/// A page of mixed results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    /// The hits of this page, best first.
    pub hits: Vec<SearchHit>,
    /// The 1-based page number.
    pub page: usize,
    /// Total hits across all pages (capped per collection).
    pub total_hits: usize,
    /// Number of pages.
    pub total_pages: usize,
    /// Whether at least one collection held more matches than the
    /// per-collection limit, i.e. the total is a lower bound.
    pub has_more_results: bool,
}

impl SearchPage {
    fn empty(page: usize) -> Self {
        Self {
            hits: Vec::new(),
            page: page.max(1),
            total_hits: 0,
            total_pages: 0,
            has_more_results: false,
        }
    }
}

/// Query engine over a connected [`SearchIndexManager`].
pub struct QueryEngine<'a> {
    manager: &'a SearchIndexManager,
}

impl<'a> QueryEngine<'a> {
    /// Build a query engine.
    pub fn new(manager: &'a SearchIndexManager) -> Self {
        Self { manager }
    }

    /// Whether a query must be refused outright.
    ///
    /// Empty queries have no answer, and the wildcard token is reserved by
    /// the backend as match-everything; forwarding it would dump the whole
    /// index, so it returns nothing instead, wherever it appears.
    fn refuses(&self, query: &str) -> bool {
        query.trim().is_empty() || query.contains('*')
    }

    /// Run a mixed search across the requested kinds.
    pub async fn search(&self, request: &SearchRequest, filters: &KindFilters) -> SearchPage {
        if !self.manager.connected() {
            return SearchPage::empty(request.page);
        }
        if self.refuses(&request.query) {
            debug!("refused query {:?}", request.query);
            return SearchPage::empty(request.page);
        }

        let kinds: Vec<DocumentKind> = if request.kinds.is_empty() {
            DocumentKind::all().to_vec()
        } else {
            request.kinds.clone()
        };
        let limit = self.manager.config().per_collection_limit;

        let queries: Vec<CollectionQuery> = kinds
            .iter()
            .map(|kind| CollectionQuery {
                collection: kind.collection_name().to_string(),
                query: request.query.clone(),
                filter: filters.get(*kind).cloned(),
                page: 1,
                per_page: limit,
            })
            .collect();
        let results = join_all(
            queries
                .iter()
                .map(|query| self.manager.backend().search(query)),
        )
        .await;

        let mut hits: Vec<SearchHit> = Vec::new();
        let mut has_more_results = false;
        for (kind, result) in kinds.iter().zip(results) {
            match result {
                Ok(list) => {
                    if list.found > limit {
                        has_more_results = true;
                    }
                    hits.extend(list.hits.into_iter().map(|hit| SearchHit {
                        kind: *kind,
                        score: hit.text_match * hit.document.weight(),
                        document: hit.document,
                    }));
                }
                Err(e) => {
                    warn!("search in '{kind}' failed, skipping its results: {e}");
                }
            }
        }

        // Stable sort: equal scores keep backend order.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let per_page = self.manager.config().results_per_page.max(1);
        let total_hits = hits.len();
        let total_pages = total_hits.div_ceil(per_page);
        let page = request.page.max(1);
        let hits = hits
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        SearchPage {
            hits,
            page,
            total_hits,
            total_pages,
            has_more_results,
        }
    }

    /// Topics similar to a title being typed, for duplicate detection.
    ///
    /// Searches the topic collection only, capped by
    /// [`crate::types::SearchConfig::max_similar_topics`].
    pub async fn similar_topics(
        &self,
        title: &str,
        filter: Option<&SearchFilter>,
    ) -> Vec<SearchHit> {
        self.single_collection(
            DocumentKind::Topic,
            title,
            filter,
            self.manager.config().max_similar_topics,
        )
        .await
    }

    /// Published contents matching a draft, excluding the draft's own
    /// content and any already-suggested ones.
    pub async fn suggestions(&self, query: &str, excluded_content_pks: &[i64]) -> Vec<SearchHit> {
        let filter = (!excluded_content_pks.is_empty())
            .then(|| SearchFilter::new().not_in("content_pk", excluded_content_pks));
        self.single_collection(
            DocumentKind::PublishedContent,
            query,
            filter.as_ref(),
            self.manager.config().max_suggestion_results,
        )
        .await
    }

    async fn single_collection(
        &self,
        kind: DocumentKind,
        query: &str,
        filter: Option<&SearchFilter>,
        limit: usize,
    ) -> Vec<SearchHit> {
        if !self.manager.connected() || self.refuses(query) {
            return Vec::new();
        }
        let result = self
            .manager
            .backend()
            .search(&CollectionQuery {
                collection: kind.collection_name().to_string(),
                query: query.to_string(),
                filter: filter.cloned(),
                page: 1,
                per_page: limit.max(1),
            })
            .await;
        let list = match result {
            Ok(list) => list,
            Err(e) => {
                warn!("search in '{kind}' failed: {e}");
                return Vec::new();
            }
        };

        let mut hits: Vec<SearchHit> = list
            .hits
            .into_iter()
            .map(|hit| SearchHit {
                kind,
                score: hit.text_match * hit.document.weight(),
                document: hit.document,
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use agora_model::{Forum, Post, SaveOptions, Store, Topic};

    use crate::memory::MemoryBackend;
    use crate::pipeline::IndexPipeline;
    use crate::types::SearchConfig;

    async fn engine_fixture() -> (Arc<MemoryBackend>, Arc<Store>, SearchIndexManager) {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(Store::new());
        let manager = SearchIndexManager::connect(
            SearchConfig::recommended(),
            backend.clone(),
            store.clone(),
        )
        .await;
        manager.reset_index().await.unwrap();
        (backend, store, manager)
    }

    async fn index_everything(manager: &SearchIndexManager) {
        IndexPipeline::new(manager).index_flagged().await.unwrap();
    }

    #[tokio::test]
    async fn test_wildcard_query_returns_nothing() {
        let (_backend, store, manager) = engine_fixture().await;
        let forum = store.save_forum(Forum::new("General"));
        store.save_topic(Topic::new(forum.pk, "hello", "alice"), SaveOptions::default());
        index_everything(&manager).await;

        let engine = QueryEngine::new(&manager);
        for query in ["*", "hello*", "*hello", "he*llo"] {
            let page = engine.search(&SearchRequest::new(query), &KindFilters::new()).await;
            assert_eq!(page.total_hits, 0, "query {query:?} must return nothing");
        }
        assert!(engine.similar_topics("*", None).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_returns_nothing() {
        let (_backend, _store, manager) = engine_fixture().await;
        let engine = QueryEngine::new(&manager);
        let page = engine.search(&SearchRequest::new("  "), &KindFilters::new()).await;
        assert_eq!(page.total_hits, 0);
    }

    #[tokio::test]
    async fn test_kind_restriction() {
        let (_backend, store, manager) = engine_fixture().await;
        let forum = store.save_forum(Forum::new("General"));
        let topic = store.save_topic(
            Topic::new(forum.pk, "hello world", "alice"),
            SaveOptions::default(),
        );
        store.save_post(
            Post::new(topic.pk, forum.pk, 1, "<p>hello world</p>", "alice"),
            SaveOptions::default(),
        );
        index_everything(&manager).await;

        let engine = QueryEngine::new(&manager);
        let all = engine.search(&SearchRequest::new("hello"), &KindFilters::new()).await;
        assert_eq!(all.total_hits, 2);

        let topics_only = engine
            .search(
                &SearchRequest::new("hello").with_kinds(vec![DocumentKind::Topic]),
                &KindFilters::new(),
            )
            .await;
        assert_eq!(topics_only.total_hits, 1);
        assert_eq!(topics_only.hits[0].kind, DocumentKind::Topic);
    }

    #[tokio::test]
    async fn test_filters_apply_per_kind() {
        let (_backend, store, manager) = engine_fixture().await;
        let public = store.save_forum(Forum::new("Public"));
        let private = store.save_forum(Forum::new("Private"));
        store.save_topic(
            Topic::new(public.pk, "hello public", "alice"),
            SaveOptions::default(),
        );
        store.save_topic(
            Topic::new(private.pk, "hello private", "alice"),
            SaveOptions::default(),
        );
        index_everything(&manager).await;

        let engine = QueryEngine::new(&manager);
        let filters = KindFilters::new().with_filter(
            DocumentKind::Topic,
            SearchFilter::new().exact_in("forum_pk", &[public.pk]),
        );
        let page = engine.search(&SearchRequest::new("hello"), &filters).await;
        assert_eq!(page.total_hits, 1);
    }

    #[tokio::test]
    async fn test_suggestions_exclude_pks() {
        use agora_model::{ContentType, PublishedContent};

        let (_backend, store, manager) = engine_fixture().await;
        for i in 1..=3 {
            let mut content =
                PublishedContent::new(i, format!("c{i}"), "Rust guide", ContentType::Tutorial);
            content.description = "learn rust".to_string();
            store.save_content(content, SaveOptions::default());
        }
        index_everything(&manager).await;

        let engine = QueryEngine::new(&manager);
        assert_eq!(engine.suggestions("rust", &[]).await.len(), 3);
        assert_eq!(engine.suggestions("rust", &[1, 2]).await.len(), 1);
    }

    #[tokio::test]
    async fn test_similar_topics_capped() {
        let (_backend, store, manager) = engine_fixture().await;
        let forum = store.save_forum(Forum::new("General"));
        for i in 0..15 {
            store.save_topic(
                Topic::new(forum.pk, format!("install rust {i}"), "alice"),
                SaveOptions::default(),
            );
        }
        index_everything(&manager).await;

        let engine = QueryEngine::new(&manager);
        let similar = engine.similar_topics("install rust", None).await;
        assert_eq!(similar.len(), manager.config().max_similar_topics);
    }
}
