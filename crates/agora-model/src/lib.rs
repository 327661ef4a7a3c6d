//! Agora Model — domain records and the relational-store collaborator.
//!
//! This crate defines the indexable domain records (forum topics and posts,
//! published contents with their sections) and an in-memory [`store::Store`]
//! that stands in for the relational database: a queryable collection with
//! per-row dirty flags and a serialized batch scope.
//!
//! The search-side representation of these records (schemas, documents,
//! boosts) lives in `agora-search`; this crate knows nothing about the
//! search backend.
//!
//! # Dirty tracking
//!
//! Every indexable row carries a `requires_index` flag. Saving a row through
//! the store sets the flag (unless the caller opts out with
//! [`store::SaveOptions::skip_index_flag`]), and the flag is cleared only
//! after a confirmed successful index write covering the saved state. Rows
//! also carry a `revision` counter bumped on every save, so a clear request
//! taken from a stale snapshot never erases the flag of a row that was
//! modified after selection.

pub mod content;
pub mod forum;
pub mod store;

pub use content::{ChapterPage, ContentType, PublishedContent, Section};
pub use forum::{Forum, Post, Topic};
pub use store::{ContentBatch, ContentBatchItem, ContentBatchSource, SaveOptions, Store};
