//! Agora Search — keeping a search index synchronized with the store.
//!
//! The store's per-row dirty flags are the single source of truth; the
//! search index is a cache rebuilt from them. The engine is organized as:
//!
//! - [`schema`] / [`document`] / [`filter`]: the flat document model
//!   exchanged with the backend, one collection per [`schema::DocumentKind`];
//! - [`indexable`]: conversion of domain records into documents, including
//!   synthetic chapter pages and indexing-time boost weights ([`boost`]);
//! - [`backend`]: the async seam to the search server, with [`memory`] as
//!   the in-process implementation;
//! - [`manager`]: connection guard, index administration, and the entity
//!   hooks (deletion cascades, partial updates);
//! - [`pipeline`]: the adaptive batch indexer that drains dirty rows and
//!   clears their flags batch by batch;
//! - [`query`]: mixed multi-collection search, similar topics, and content
//!   suggestions.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use agora_model::Store;
//! use agora_search::memory::MemoryBackend;
//! use agora_search::pipeline::IndexPipeline;
//! use agora_search::query::{KindFilters, QueryEngine, SearchRequest};
//! use agora_search::manager::SearchIndexManager;
//! use agora_search::types::SearchConfig;
//!
//! # async fn run() -> agora_core::Result<()> {
//! let store = Arc::new(Store::new());
//! let backend = Arc::new(MemoryBackend::new());
//! let manager =
//!     SearchIndexManager::connect(SearchConfig::recommended(), backend, store).await;
//!
//! IndexPipeline::new(&manager).index_all().await?;
//!
//! let page = QueryEngine::new(&manager)
//!     .search(&SearchRequest::new("borrow checker"), &KindFilters::new())
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod boost;
pub mod document;
pub mod filter;
pub mod indexable;
pub mod manager;
pub mod memory;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod types;

pub use backend::{CollectionQuery, Hit, HitList, ImportAction, ImportStatus, SearchBackend};
pub use boost::BoostConfig;
pub use document::{Document, FieldValue};
pub use filter::SearchFilter;
pub use indexable::Indexable;
pub use manager::SearchIndexManager;
pub use memory::MemoryBackend;
pub use pipeline::IndexPipeline;
pub use query::{KindFilters, QueryEngine, SearchHit, SearchPage, SearchRequest};
pub use schema::{CollectionSchema, DocumentKind, FieldDef, FieldKind};
pub use types::SearchConfig;
