//! Forum domain records: forums, topics, and posts.
//!
//! Topics and posts are indexable: they carry a `requires_index` flag and a
//! `revision` counter maintained by the store. Forums are not indexed
//! themselves but drive visibility filtering (topics and posts of a private
//! forum are excluded from anonymous search via a filter pushed to the
//! backend).

use agora_core::slugify;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discussion forum. Not indexed; referenced by topics and posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forum {
    /// Primary key (0 until saved).
    pub pk: i64,
    /// Forum title.
    pub title: String,
    /// Whether the forum is restricted to a private group.
    pub is_private: bool,
}

impl Forum {
    /// Create a public forum with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            pk: 0,
            title: title.into(),
            is_private: false,
        }
    }
}

/// A forum topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Primary key (0 until saved).
    pub pk: i64,
    /// Forum this topic belongs to.
    pub forum_pk: i64,
    /// Topic title.
    pub title: String,
    /// Topic subtitle.
    pub subtitle: String,
    /// Tag titles, in display order.
    pub tags: Vec<String>,
    /// Author username.
    pub author: String,
    /// Creation date.
    pub pubdate: DateTime<Utc>,
    /// Whether the topic is marked solved.
    pub is_solved: bool,
    /// Whether the topic is pinned.
    pub is_sticky: bool,
    /// Whether the topic needs (re)indexing.
    pub requires_index: bool,
    /// Bumped by the store on every save.
    pub revision: u64,
}

impl Topic {
    /// Create a new topic in the given forum.
    pub fn new(forum_pk: i64, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            pk: 0,
            forum_pk,
            title: title.into(),
            subtitle: String::new(),
            tags: Vec::new(),
            author: author.into(),
            pubdate: Utc::now(),
            is_solved: false,
            is_sticky: false,
            requires_index: true,
            revision: 0,
        }
    }

    /// Slugs of the topic tags, parallel to [`Topic::tags`].
    ///
    /// Indexed alongside the tag titles so that result rendering can link
    /// each tag without another lookup.
    pub fn tag_slugs(&self) -> Vec<String> {
        self.tags.iter().map(|t| slugify(t)).collect()
    }
}

/// A post inside a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Primary key (0 until saved).
    pub pk: i64,
    /// Topic this post belongs to.
    pub topic_pk: i64,
    /// Forum of the topic, denormalized for visibility filtering.
    pub forum_pk: i64,
    /// Position within the topic, starting at 1.
    pub position: u32,
    /// Rendered HTML body. Stripped to plain text at conversion time.
    pub text_html: String,
    /// Author username.
    pub author: String,
    /// Publication date.
    pub pubdate: DateTime<Utc>,
    /// Hidden posts are neither indexed nor returned by search.
    pub is_visible: bool,
    /// Number of "useful" votes.
    pub like_count: u32,
    /// Number of "not useful" votes.
    pub dislike_count: u32,
    /// Whether the post needs (re)indexing.
    pub requires_index: bool,
    /// Bumped by the store on every save.
    pub revision: u64,
}

impl Post {
    /// Create a new visible post.
    pub fn new(
        topic_pk: i64,
        forum_pk: i64,
        position: u32,
        text_html: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            pk: 0,
            topic_pk,
            forum_pk,
            position,
            text_html: text_html.into(),
            author: author.into(),
            pubdate: Utc::now(),
            is_visible: true,
            like_count: 0,
            dislike_count: 0,
            requires_index: true,
            revision: 0,
        }
    }

    /// Whether this is the opening post of its topic.
    pub fn is_first(&self) -> bool {
        self.position == 1
    }

    /// Whether the like/dislike ratio is above 1.
    pub fn has_useful_ratio(&self) -> bool {
        self.like_count > self.dislike_count
    }
}
